//! Core types for the Linklet URL shortener.
//!
//! This crate holds the data model shared by the allocator, the stores and
//! the shortener service, together with the pure pieces of the shortening
//! pipeline: field validation and expiry computation.

pub mod clock;
pub mod error;
pub mod event_log;
pub mod expiry;
pub mod model;
pub mod shortcode;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ValidationError;
pub use event_log::{EventLog, Level, MemoryEventLog, TracingEventLog};
pub use expiry::{compute_expiry, DEFAULT_VALIDITY_MINUTES};
pub use model::{Candidate, ClickEvent, ClickLedgerEntry, ClickSource, RecordDraft, UrlRecord};
pub use shortcode::ShortCode;
pub use validator::{validate_candidate, validate_url, validate_validity, FieldErrors};
