use crate::persistence::Persistence;
use linklet_core::{ClickEvent, ClickLedgerEntry, EventLog, ShortCode, UrlRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key of the click ledger.
pub const LEDGER_KEY: &str = "shortcodeClicks";

/// Per-code click counts and event logs, stored apart from the records.
///
/// Like [`RecordStore`](crate::RecordStore), the ledger is written back
/// whole on every mutating call.
pub struct ClickLedger {
    persistence: Arc<Persistence>,
    log: Arc<dyn EventLog>,
    entries: BTreeMap<String, ClickLedgerEntry>,
}

impl ClickLedger {
    /// Opens the ledger, repairing entries whose count disagrees with their
    /// event log.
    pub fn open(persistence: Arc<Persistence>, log: Arc<dyn EventLog>) -> Self {
        let mut entries: BTreeMap<String, ClickLedgerEntry> =
            persistence.get(LEDGER_KEY).unwrap_or_default();

        for (code, entry) in entries.iter_mut().filter(|(_, e)| e.is_inconsistent()) {
            warn!(
                code = %code,
                count = entry.count(),
                events = entry.detailed().len(),
                "click count disagrees with event log, repairing"
            );
            entry.repair();
        }

        info!(entries = entries.len(), "click ledger loaded");
        Self {
            persistence,
            log,
            entries,
        }
    }

    pub fn entry(&self, code: &str) -> Option<&ClickLedgerEntry> {
        self.entries.get(code)
    }

    pub fn entries(&self) -> &BTreeMap<String, ClickLedgerEntry> {
        &self.entries
    }

    /// Click count for `code`, zero when there is no entry.
    pub fn count(&self, code: &str) -> u64 {
        self.entries.get(code).map_or(0, ClickLedgerEntry::count)
    }

    /// Seeds an empty entry for a freshly created record and persists.
    pub fn init_entry(&mut self, code: &ShortCode) -> bool {
        self.init_entries(std::iter::once(code))
    }

    /// Seeds empty entries for several fresh records with a single write.
    pub fn init_entries<'a>(&mut self, codes: impl IntoIterator<Item = &'a ShortCode>) -> bool {
        for code in codes {
            self.entries
                .insert(code.as_str().to_string(), ClickLedgerEntry::default());
        }
        self.persist()
    }

    /// Counts a click and persists the ledger.
    pub fn record_click(&mut self, code: &str, event: ClickEvent) -> &ClickLedgerEntry {
        self.append_click(code, event);
        self.persist();
        &self.entries[code]
    }

    /// Counts a click in memory only.
    ///
    /// An entry is created when `code` has none yet.
    pub fn append_click(&mut self, code: &str, event: ClickEvent) {
        self.entries
            .entry(code.to_string())
            .or_default()
            .push(event);
    }

    /// Brings the ledger in line with `records`.
    ///
    /// Records are authoritative: an entry that is missing, or whose count
    /// differs from the record's click history, is rebuilt from that history.
    /// Returns how many entries were rebuilt and persists only when that is
    /// non-zero.
    pub fn reconcile(&mut self, records: &[UrlRecord]) -> usize {
        let mut rebuilt = 0;
        for record in records {
            let matches = self
                .entries
                .get(record.shortcode.as_str())
                .is_some_and(|entry| entry.count() == record.clicks.len() as u64);
            if matches {
                continue;
            }
            self.entries.insert(
                record.shortcode.as_str().to_string(),
                ClickLedgerEntry::from_events(record.clicks.clone()),
            );
            rebuilt += 1;
        }

        if rebuilt > 0 {
            self.log
                .info(&format!("Restored click data for {rebuilt} shortened URLs"));
            self.persist();
        }
        rebuilt
    }

    /// Writes the whole ledger, returning whether it became durable.
    pub fn persist(&self) -> bool {
        self.persistence.set(LEDGER_KEY, &self.entries)
    }
}

impl std::fmt::Debug for ClickLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickLedger")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
