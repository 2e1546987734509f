use crate::error::CreateError;
use crate::persistence::Persistence;
use jiff::Timestamp;
use linklet_core::{compute_expiry, ClickEvent, EventLog, RecordDraft, UrlRecord};
use linklet_generator::{Allocator, Generator};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key of the record collection.
pub const RECORDS_KEY: &str = "shortenedUrls";

/// The collection of shortened URL records.
///
/// The whole collection is written back as one document on every mutating
/// call. That keeps each write self-consistent at the price of O(n) work per
/// mutation, which is fine for a single user's links but is the first thing
/// to change for larger data sets.
pub struct RecordStore {
    persistence: Arc<Persistence>,
    log: Arc<dyn EventLog>,
    base_url: String,
    records: Vec<UrlRecord>,
    codes: HashSet<String>,
}

impl RecordStore {
    /// Opens the store and loads the durable collection.
    ///
    /// This is the only read of the collection: from here on memory is
    /// authoritative and storage only receives writes. Absent or unreadable
    /// data yields an empty collection.
    pub fn open(
        persistence: Arc<Persistence>,
        log: Arc<dyn EventLog>,
        base_url: impl Into<String>,
    ) -> Self {
        let records: Vec<UrlRecord> = match persistence.load(RECORDS_KEY) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "stored records unreadable, starting empty");
                Vec::new()
            }
        };

        let mut codes = HashSet::with_capacity(records.len());
        for record in &records {
            if !codes.insert(record.shortcode.as_str().to_string()) {
                warn!(code = %record.shortcode, "duplicate short code in stored records");
            }
        }

        info!(records = records.len(), "record store loaded");
        Self {
            persistence,
            log,
            base_url: base_url.into(),
            records,
            codes,
        }
    }

    /// Returns every record in insertion order.
    pub fn load_all(&self) -> Vec<UrlRecord> {
        self.records.clone()
    }

    pub fn records(&self) -> &[UrlRecord] {
        &self.records
    }

    pub fn get(&self, code: &str) -> Option<&UrlRecord> {
        self.records.iter().find(|r| r.shortcode.as_str() == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Every short code currently taken.
    pub fn codes(&self) -> &HashSet<String> {
        &self.codes
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turns validated drafts into records, in order.
    ///
    /// Each draft either becomes a record or fails on its own: a custom code
    /// that is already taken (including by an earlier draft of the same
    /// call) is rejected, and a generated code may run out of attempts. The
    /// collection is persisted once if anything was created.
    pub fn create_many<G: Generator>(
        &mut self,
        drafts: Vec<RecordDraft>,
        allocator: &Allocator<G>,
        now: Timestamp,
    ) -> Vec<Result<UrlRecord, CreateError>> {
        let results: Vec<_> = drafts
            .into_iter()
            .map(|draft| self.create_one(draft, allocator, now))
            .collect();

        if results.iter().any(Result::is_ok) {
            self.persist();
        }
        results
    }

    fn create_one<G: Generator>(
        &mut self,
        draft: RecordDraft,
        allocator: &Allocator<G>,
        now: Timestamp,
    ) -> Result<UrlRecord, CreateError> {
        if let Some(requested) = &draft.shortcode {
            if self.codes.contains(requested.as_str()) {
                self.log.error(&format!(
                    "Shortcode {requested} is already in use, not shortening {}",
                    draft.original_url
                ));
                return Err(CreateError::AliasConflict(requested.to_string()));
            }
        }

        let shortcode = allocator.allocate(draft.shortcode, &self.codes).map_err(|e| {
            self.log.error(&format!(
                "Could not allocate a shortcode for {}: {e}",
                draft.original_url
            ));
            e
        })?;

        let record = UrlRecord {
            shortened_link: shortcode.to_url(&self.base_url),
            expiry_date: compute_expiry(now, draft.validity_minutes),
            creation_date: now,
            original_url: draft.original_url,
            shortcode,
            clicks: Vec::new(),
        };

        self.codes.insert(record.shortcode.as_str().to_string());
        self.records.push(record.clone());
        self.log.success(&format!(
            "Shortened URL created for {}",
            record.original_url
        ));
        Ok(record)
    }

    /// Appends a click and persists the collection.
    ///
    /// Returns the updated record, or `None` without touching anything when
    /// the code is unknown.
    pub fn record_click(&mut self, code: &str, event: ClickEvent) -> Option<&UrlRecord> {
        let index = self.append_click(code, event)?;
        self.persist();
        Some(&self.records[index])
    }

    /// Appends a click in memory only, returning the record's position.
    pub fn append_click(&mut self, code: &str, event: ClickEvent) -> Option<usize> {
        let index = self
            .records
            .iter()
            .position(|r| r.shortcode.as_str() == code)?;
        self.records[index].clicks.push(event);
        Some(index)
    }

    /// Writes the whole collection, returning whether it became durable.
    pub fn persist(&self) -> bool {
        self.persistence.set(RECORDS_KEY, &self.records)
    }

    /// Writes the collection as it was before the latest click on `code`.
    ///
    /// Used to take back a click that could not be made durable everywhere.
    pub fn persist_without_last_click(&self, code: &str) -> bool {
        let mut durable = self.records.clone();
        if let Some(record) = durable.iter_mut().find(|r| r.shortcode.as_str() == code) {
            record.clicks.pop();
        }
        self.persistence.set(RECORDS_KEY, &durable)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("base_url", &self.base_url)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{KeyValueBackend, MemoryBackend};
    use linklet_core::{ClickSource, Level, MemoryEventLog, ShortCode};
    use linklet_generator::{RandomGenerator, RandomGeneratorSettings};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "http://localhost:3000";

    struct Fixture {
        backend: Arc<MemoryBackend>,
        log: Arc<MemoryEventLog>,
        persistence: Arc<Persistence>,
    }

    impl Fixture {
        fn new(backend: MemoryBackend) -> Self {
            let backend = Arc::new(backend);
            let log = Arc::new(MemoryEventLog::new());
            let persistence = Arc::new(Persistence::new(backend.clone(), log.clone()));
            Self {
                backend,
                log,
                persistence,
            }
        }

        fn store(&self) -> RecordStore {
            RecordStore::open(self.persistence.clone(), self.log.clone(), BASE)
        }
    }

    /// Yields `codes` in order, then repeats the last one.
    struct ScriptedGenerator {
        codes: &'static [&'static str],
        next: AtomicUsize,
    }

    impl Generator for ScriptedGenerator {
        fn generate(&self) -> ShortCode {
            let index = self.next.fetch_add(1, Ordering::Relaxed);
            ShortCode::new_unchecked(self.codes[index.min(self.codes.len() - 1)])
        }
    }

    fn scripted(codes: &'static [&'static str]) -> Allocator<ScriptedGenerator> {
        Allocator::new(ScriptedGenerator {
            codes,
            next: AtomicUsize::new(0),
        })
    }

    fn seeded() -> Allocator<RandomGenerator> {
        let settings = RandomGeneratorSettings::builder().seed(7).build();
        Allocator::new(RandomGenerator::new(settings).unwrap())
    }

    fn now() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn draft(url: &str, validity: Option<u64>, code: Option<&str>) -> RecordDraft {
        RecordDraft {
            original_url: url.to_string(),
            validity_minutes: validity,
            shortcode: code.map(|c| ShortCode::new(c).unwrap()),
        }
    }

    fn click(second: i64) -> ClickEvent {
        ClickEvent::new(Timestamp::from_second(second).unwrap(), ClickSource::UiClick)
    }

    #[test]
    fn empty_when_nothing_stored() {
        let fixture = Fixture::new(MemoryBackend::new());
        let store = fixture.store();

        assert!(store.load_all().is_empty());
    }

    #[test]
    fn corrupt_collection_loads_empty() {
        let fixture = Fixture::new(MemoryBackend::new());
        fixture.backend.write(RECORDS_KEY, "[{\"broken\": ").unwrap();

        let store = fixture.store();

        assert!(store.load_all().is_empty());
        assert!(!fixture.log.messages(Level::Error).is_empty());
    }

    #[test]
    fn create_many_builds_records_in_order() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        let allocator = scripted(&["gen001", "gen002"]);

        let results = store.create_many(
            vec![
                draft("https://one.example", None, None),
                draft("https://two.example", Some(90), Some("custom")),
                draft("https://three.example", None, None),
            ],
            &allocator,
            now(),
        );

        let records: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        let codes: Vec<_> = records.iter().map(|r| r.shortcode.as_str()).collect();
        assert_eq!(codes, ["gen001", "custom", "gen002"]);

        assert_eq!(records[1].shortened_link, "http://localhost:3000/custom");
        assert_eq!(records[0].creation_date, now());
        assert_eq!(
            records[0].expiry_date,
            now() + jiff::SignedDuration::from_mins(30)
        );
        assert_eq!(
            records[1].expiry_date,
            now() + jiff::SignedDuration::from_mins(90)
        );
        assert!(records.iter().all(|r| r.clicks.is_empty()));
        assert_eq!(fixture.log.messages(Level::Success).len(), 3);

        let reopened = fixture.store();
        assert_eq!(reopened.load_all(), records);
    }

    #[test]
    fn taken_custom_code_is_rejected_alone() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        let allocator = seeded();

        store.create_many(
            vec![draft("https://first.example", None, Some("abc123"))],
            &allocator,
            now(),
        );
        let results = store.create_many(
            vec![
                draft("https://second.example", None, Some("abc123")),
                draft("https://third.example", None, None),
            ],
            &allocator,
            now(),
        );

        assert_eq!(
            results[0],
            Err(CreateError::AliasConflict("abc123".to_string()))
        );
        assert!(results[1].is_ok());
        assert_eq!(
            store.get("abc123").unwrap().original_url,
            "https://first.example"
        );
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn same_custom_code_twice_in_one_call() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        let allocator = seeded();

        let results = store.create_many(
            vec![
                draft("https://a.example", None, Some("dup-code")),
                draft("https://b.example", None, Some("dup-code")),
            ],
            &allocator,
            now(),
        );

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CreateError::AliasConflict(_))));
    }

    #[test]
    fn generated_codes_avoid_stored_ones() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();

        store.create_many(
            vec![draft("https://a.example", None, Some("taken1"))],
            &seeded(),
            now(),
        );
        let results = store.create_many(
            vec![draft("https://b.example", None, None)],
            &scripted(&["taken1", "fresh1"]),
            now(),
        );

        assert_eq!(results[0].as_ref().unwrap().shortcode.as_str(), "fresh1");
    }

    #[test]
    fn record_click_appends_in_order_and_persists() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        store.create_many(
            vec![draft("https://example.com", None, Some("abc123"))],
            &seeded(),
            now(),
        );

        for second in [10, 20, 30] {
            assert!(store.record_click("abc123", click(second)).is_some());
        }

        let reopened = fixture.store();
        let records = reopened.load_all();
        let stamps: Vec<_> = records[0]
            .clicks
            .iter()
            .map(|c| c.timestamp.as_second())
            .collect();
        assert_eq!(stamps, [10, 20, 30]);
    }

    #[test]
    fn unknown_code_click_is_a_no_op() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        store.create_many(
            vec![draft("https://example.com", None, Some("abc123"))],
            &seeded(),
            now(),
        );
        let before = store.load_all();

        assert!(store.record_click("doesnotexist", click(1)).is_none());
        assert_eq!(store.load_all(), before);
    }

    #[test]
    fn load_all_is_idempotent() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        store.create_many(
            vec![draft("https://example.com", None, None)],
            &seeded(),
            now(),
        );

        assert_eq!(store.load_all(), store.load_all());
    }

    #[test]
    fn later_bad_read_does_not_drop_records() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        store.create_many(
            vec![draft("https://example.com", None, Some("abc123"))],
            &seeded(),
            now(),
        );
        fixture.backend.write(RECORDS_KEY, "{not json").unwrap();

        assert_eq!(store.load_all().len(), 1);
        assert!(store.record_click("abc123", click(1)).is_some());
        store.create_many(
            vec![draft("https://other.example", None, Some("other1"))],
            &seeded(),
            now(),
        );

        let reopened = fixture.store();
        let codes: Vec<_> = reopened
            .load_all()
            .iter()
            .map(|r| r.shortcode.to_string())
            .collect();
        assert_eq!(codes, ["abc123", "other1"]);
        assert_eq!(reopened.get("abc123").unwrap().clicks.len(), 1);
    }

    #[test]
    fn degraded_store_keeps_serving_memory() {
        let fixture = Fixture::new(MemoryBackend::with_quota(64));
        let mut store = fixture.store();

        let results = store.create_many(
            vec![draft("https://a-rather-long-url.example/with/a/path", None, None)],
            &seeded(),
            now(),
        );

        assert!(results[0].is_ok());
        assert!(fixture.persistence.is_degraded());
        assert!(fixture.backend.read(RECORDS_KEY).unwrap().is_none());
        assert_eq!(store.load_all().len(), 1);
    }

    #[test]
    fn rollback_write_drops_only_the_last_click() {
        let fixture = Fixture::new(MemoryBackend::new());
        let mut store = fixture.store();
        store.create_many(
            vec![draft("https://example.com", None, Some("abc123"))],
            &seeded(),
            now(),
        );
        store.record_click("abc123", click(1));
        store.append_click("abc123", click(2));

        assert!(store.persist_without_last_click("abc123"));

        assert_eq!(store.get("abc123").unwrap().clicks.len(), 2);
        let durable = fixture.store();
        assert_eq!(durable.get("abc123").unwrap().clicks.len(), 1);
    }
}
