use crate::backend::{check_key, KeyValueBackend};
use crate::error::{Result, StorageError};
use dashmap::DashMap;

/// In-memory implementation of [`KeyValueBackend`] using DashMap.
///
/// An optional quota caps the total size of stored keys and values in
/// bytes, mirroring the fixed capacity of browser-style local storage. A
/// write that would exceed it fails and leaves the old value in place.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    storage: DashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Creates an unbounded in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory backend holding at most `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            storage: DashMap::new(),
            quota: Some(quota),
        }
    }

    /// Total bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.storage
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.storage.get(key).map(|value| value.value().clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;

        if let Some(quota) = self.quota {
            let replaced = self
                .storage
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        self.storage.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
