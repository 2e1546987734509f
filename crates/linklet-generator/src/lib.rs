//! Short code generation and allocation.

pub mod allocator;
pub mod error;
pub mod random;

pub use allocator::{Allocator, DEFAULT_MAX_ATTEMPTS};
pub use error::{AllocationError, GeneratorError};
pub use random::{RandomGenerator, RandomGeneratorSettings};

use linklet_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage;
/// collisions with stored codes are resolved by the [`Allocator`].
pub trait Generator: Send + Sync + 'static {
    fn generate(&self) -> ShortCode;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> ShortCode {
        (**self).generate()
    }
}
