use crate::error::ShortenerError;
use crate::settings::ShortenerSettings;
use jiff::Timestamp;
use linklet_core::{
    validate_candidate, Candidate, ClickEvent, ClickSource, Clock, EventLog, FieldErrors,
    RecordDraft, SystemClock, UrlRecord,
};
use linklet_generator::{Allocator, Generator};
use linklet_storage::{ClickLedger, KeyValueBackend, Persistence, RecordStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// What became of one submitted slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    /// The slot had no URL.
    Skipped,
    /// One or more fields failed validation.
    Rejected(FieldErrors),
    /// The slot was valid but no record could be created for it.
    Failed(ShortenerError),
    Created(UrlRecord),
}

/// Per-slot results of a shortening batch, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub slots: Vec<SlotOutcome>,
}

impl BatchReport {
    pub fn created(&self) -> impl Iterator<Item = &UrlRecord> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            SlotOutcome::Created(record) => Some(record),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| matches!(slot, SlotOutcome::Rejected(_) | SlotOutcome::Failed(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click was applied to both the record and the ledger.
    ///
    /// `durable` is `false` when it only lives in memory for this session.
    Recorded { count: u64, durable: bool },
    /// No record carries the short code; nothing was changed.
    NotFound,
}

/// A record together with its ledger entry, as shown on a statistics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub shortcode: String,
    pub original_url: String,
    pub shortened_link: String,
    pub creation_date: Timestamp,
    pub expiry_date: Timestamp,
    pub expired: bool,
    pub total_clicks: u64,
    pub clicks: Vec<ClickEvent>,
}

/// Drives shortening batches and click events across both stores.
///
/// Every public operation runs to completion before returning. Persistence
/// failures never surface as errors: they are logged, and the service keeps
/// serving its in-memory state.
pub struct ShortenerService<G> {
    records: RecordStore,
    ledger: ClickLedger,
    allocator: Allocator<G>,
    clock: Arc<dyn Clock>,
    log: Arc<dyn EventLog>,
    settings: ShortenerSettings,
}

impl<G: Generator> ShortenerService<G> {
    /// Opens both stores on `backend` using the system clock.
    pub fn open(
        backend: Arc<dyn KeyValueBackend>,
        allocator: Allocator<G>,
        log: Arc<dyn EventLog>,
        settings: ShortenerSettings,
    ) -> Self {
        Self::with_clock(backend, allocator, log, settings, Arc::new(SystemClock))
    }

    /// Opens both stores on `backend` and reconciles the ledger with the
    /// stored records.
    pub fn with_clock(
        backend: Arc<dyn KeyValueBackend>,
        allocator: Allocator<G>,
        log: Arc<dyn EventLog>,
        settings: ShortenerSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let persistence = Arc::new(Persistence::new(backend, log.clone()));
        let records = RecordStore::open(persistence.clone(), log.clone(), &settings.base_url);
        let mut ledger = ClickLedger::open(persistence, log.clone());
        ledger.reconcile(records.records());

        Self {
            records,
            ledger,
            allocator,
            clock,
            log,
            settings,
        }
    }

    /// Validates and shortens up to `max_batch_size` submission slots.
    ///
    /// Slots are independent: a malformed or conflicting slot is reported in
    /// its position and does not keep the others from being created.
    pub fn shorten_batch(
        &mut self,
        candidates: &[Candidate],
    ) -> Result<BatchReport, ShortenerError> {
        let max = self.settings.max_batch_size;
        if candidates.len() > max {
            self.log.error(&format!(
                "Rejected batch of {} URLs, at most {max} are allowed",
                candidates.len()
            ));
            return Err(ShortenerError::BatchTooLarge {
                size: candidates.len(),
                max,
            });
        }
        self.log
            .info(&format!("Shortening batch of {} URLs", candidates.len()));

        let mut slots: Vec<Option<SlotOutcome>> = Vec::with_capacity(candidates.len());
        let mut drafts: Vec<RecordDraft> = Vec::new();
        let mut draft_slots = Vec::new();
        let mut rejected = 0;
        for (index, candidate) in candidates.iter().enumerate() {
            match validate_candidate(candidate) {
                Ok(None) => slots.push(Some(SlotOutcome::Skipped)),
                Ok(Some(draft)) => {
                    slots.push(None);
                    draft_slots.push(index);
                    drafts.push(draft);
                }
                Err(errors) => {
                    debug!(slot = index, %errors, "candidate rejected");
                    rejected += 1;
                    slots.push(Some(SlotOutcome::Rejected(errors)));
                }
            }
        }

        if rejected > 0 {
            self.log.error(&format!(
                "Client-side validation failed for {rejected} of {} URLs",
                candidates.len()
            ));
        }

        let created = self
            .records
            .create_many(drafts, &self.allocator, self.clock.now());
        for (index, result) in draft_slots.into_iter().zip(created) {
            slots[index] = Some(match result {
                Ok(record) => SlotOutcome::Created(record),
                Err(e) => SlotOutcome::Failed(e.into()),
            });
        }

        // create_many answers every draft, so no slot is left open.
        let slots = slots.into_iter().flatten().collect();
        let report = BatchReport { slots };
        let fresh: Vec<_> = report.created().map(|record| &record.shortcode).collect();
        if !fresh.is_empty() {
            self.ledger.init_entries(fresh);
        }
        Ok(report)
    }

    /// Shortens a single candidate.
    ///
    /// An empty URL is reported as invalid input here, since there is no
    /// other slot it could be skipped in favor of.
    pub fn shorten(&mut self, candidate: Candidate) -> Result<UrlRecord, ShortenerError> {
        let report = self.shorten_batch(std::slice::from_ref(&candidate))?;
        match report.slots.into_iter().next() {
            Some(SlotOutcome::Created(record)) => Ok(record),
            Some(SlotOutcome::Rejected(errors)) => Err(ShortenerError::InvalidInput(errors)),
            Some(SlotOutcome::Failed(e)) => Err(e),
            Some(SlotOutcome::Skipped) | None => {
                Err(ShortenerError::InvalidInput(FieldErrors {
                    original_url: Some(linklet_core::ValidationError::InvalidUrl(
                        candidate.original_url,
                    )),
                    ..FieldErrors::default()
                }))
            }
        }
    }

    /// Applies a click to the record and the ledger as one unit.
    ///
    /// Both structures change in memory first. The records document is then
    /// written, followed by the ledger; if the ledger write fails after the
    /// records write succeeded, the records document is written again
    /// without this click so that neither durable copy reflects it.
    pub fn record_click(&mut self, code: &str, event: ClickEvent) -> ClickOutcome {
        if !self.records.contains(code) {
            self.log
                .error(&format!("Shortlink {code} not found, click ignored"));
            return ClickOutcome::NotFound;
        }
        self.log.info(&format!("Shortlink {code} clicked"));

        self.records.append_click(code, event.clone());
        self.ledger.append_click(code, event);

        let durable = if !self.records.persist() {
            false
        } else if self.ledger.persist() {
            true
        } else {
            self.records.persist_without_last_click(code);
            false
        };

        ClickOutcome::Recorded {
            count: self.ledger.count(code),
            durable,
        }
    }

    /// Records a click from the statistics view at the current time.
    pub fn simulate_click(&mut self, code: &str) -> ClickOutcome {
        let event = ClickEvent::new(self.clock.now(), ClickSource::UiClick);
        self.record_click(code, event)
    }

    /// Every record in insertion order.
    pub fn load_all(&self) -> Vec<UrlRecord> {
        self.records.load_all()
    }

    pub fn records(&self) -> &[UrlRecord] {
        self.records.records()
    }

    pub fn ledger(&self) -> &ClickLedger {
        &self.ledger
    }

    pub fn stats(&self, code: &str) -> Option<LinkStats> {
        self.records.get(code).map(|record| self.stats_for(record))
    }

    pub fn all_stats(&self) -> Vec<LinkStats> {
        self.records
            .records()
            .iter()
            .map(|record| self.stats_for(record))
            .collect()
    }

    fn stats_for(&self, record: &UrlRecord) -> LinkStats {
        let entry = self.ledger.entry(record.shortcode.as_str());
        LinkStats {
            shortcode: record.shortcode.to_string(),
            original_url: record.original_url.clone(),
            shortened_link: record.shortened_link.clone(),
            creation_date: record.creation_date,
            expiry_date: record.expiry_date,
            expired: record.is_expired(self.clock.now()),
            total_clicks: entry.map_or(0, |e| e.count()),
            clicks: entry.map(|e| e.detailed().to_vec()).unwrap_or_default(),
        }
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }
}
