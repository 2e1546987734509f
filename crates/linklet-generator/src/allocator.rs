use crate::error::AllocationError;
use crate::Generator;
use linklet_core::ShortCode;
use std::collections::HashSet;
use tracing::debug;

/// Generation attempts before allocation gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Hands out short codes that are free with respect to a set of taken codes.
#[derive(Debug)]
pub struct Allocator<G> {
    generator: G,
    max_attempts: u32,
}

impl<G: Generator> Allocator<G> {
    pub fn new(generator: G) -> Self {
        Self::with_max_attempts(generator, DEFAULT_MAX_ATTEMPTS)
    }

    /// A `max_attempts` of zero is treated as one.
    pub fn with_max_attempts(generator: G, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns `requested` untouched, or a generated code absent from `existing`.
    ///
    /// A requested code is not checked against `existing`; rejecting a taken
    /// custom code is the caller's decision.
    pub fn allocate(
        &self,
        requested: Option<ShortCode>,
        existing: &HashSet<String>,
    ) -> Result<ShortCode, AllocationError> {
        if let Some(code) = requested {
            return Ok(code);
        }

        for attempt in 1..=self.max_attempts {
            let code = self.generator.generate();
            if !existing.contains(code.as_str()) {
                return Ok(code);
            }
            debug!(code = %code, attempt, "generated short code collides, retrying");
        }

        Err(AllocationError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
