use crate::backend::KeyValueBackend;
use crate::error::Result;
use linklet_core::EventLog;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Typed JSON access to a [`KeyValueBackend`] for stores that must keep
/// running when storage misbehaves.
///
/// Read failures and unparseable documents come back as `None` from
/// [`get`](Self::get); write failures come back as `false`. Both are reported
/// on the event log. After the first failure the adapter is *degraded*: the
/// durable copy can no longer be trusted to match memory.
pub struct Persistence {
    backend: Arc<dyn KeyValueBackend>,
    log: Arc<dyn EventLog>,
    degraded: AtomicBool,
}

impl Persistence {
    pub fn new(backend: Arc<dyn KeyValueBackend>, log: Arc<dyn EventLog>) -> Self {
        Self {
            backend,
            log,
            degraded: AtomicBool::new(false),
        }
    }

    /// Reads and parses `key`, telling an absent document (`Ok(None)`) apart
    /// from one that could not be read or parsed.
    ///
    /// A failure is logged and degrades the adapter, since the durable copy no
    /// longer reflects what this session knows.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let result = self
            .backend
            .read(key)
            .inspect_err(|e| {
                warn!(key, error = %e, "storage read failed");
                self.log
                    .error(&format!("Error reading data from storage for key: {key}"));
            })
            .and_then(|raw| match raw {
                None => Ok(None),
                Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                    warn!(key, error = %e, "stored document is not valid");
                    self.log
                        .error(&format!("Error parsing data from storage for key: {key}"));
                    e.into()
                }),
            });

        if result.is_err() {
            self.degraded.store(true, Ordering::SeqCst);
        }
        result
    }

    /// Like [`load`](Self::load), folding failures into `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.load(key).ok().flatten()
    }

    /// Serializes and stores `value`, returning whether it became durable.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(Into::into)
            .and_then(|raw| self.backend.write(key, &raw));

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "storage write failed");
                self.degraded.store(true, Ordering::SeqCst);
                self.log
                    .error(&format!("Error saving data to storage for key: {key}"));
                false
            }
        }
    }

    /// Returns `true` once any read or write has failed in this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}
