//! Shortening and click tracking on top of the Linklet stores.
//!
//! [`ShortenerService`] is the single entry point used by the command line
//! front end: it validates submission batches, allocates short codes, keeps
//! the record store and the click ledger in step, and answers statistics
//! queries. Core types are re-exported from `linklet_core`.

pub mod error;
pub mod service;
pub mod settings;

pub use error::ShortenerError;
pub use service::{BatchReport, ClickOutcome, LinkStats, ShortenerService, SlotOutcome};
pub use settings::{ShortenerSettings, DEFAULT_BASE_URL, DEFAULT_MAX_BATCH_SIZE};

pub use linklet_core::{Candidate, ClickEvent, ClickSource, FieldErrors, UrlRecord};
