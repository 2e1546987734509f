//! Durable state of the shortener.
//!
//! Two documents live in a [`KeyValueBackend`]: the record collection under
//! [`RECORDS_KEY`] and the click ledger under [`LEDGER_KEY`]. Both are read
//! and written through [`Persistence`], which never fails and reports
//! problems on the event log instead.

pub mod backend;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod records;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use error::{CreateError, StorageError};
pub use ledger::{ClickLedger, LEDGER_KEY};
pub use persistence::Persistence;
pub use records::{RecordStore, RECORDS_KEY};
