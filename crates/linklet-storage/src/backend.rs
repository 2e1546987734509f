pub mod file;
pub mod memory;

use crate::error::{Result, StorageError};

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Raw durable key/value storage holding serialized JSON documents.
///
/// Backends report every failure; [`Persistence`](crate::Persistence) is
/// the layer that turns failures into log entries.
pub trait KeyValueBackend: Send + Sync + 'static {
    /// Reads the document stored under `key`.
    /// Returns `None` if nothing was ever written there.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the document stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Keys are restricted so that every backend can map them to file names.
pub(crate) fn check_key(key: &str) -> Result<()> {
    let well_formed = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
