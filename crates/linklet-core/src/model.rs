use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Location recorded when the origin of a click cannot be resolved.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A stored mapping from a short code to its original URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    /// The original URL that was shortened.
    pub original_url: String,
    pub shortcode: ShortCode,
    /// `base_url + "/" + shortcode`.
    pub shortened_link: String,
    pub creation_date: Timestamp,
    /// Informational only, nothing deletes a record once it passes.
    pub expiry_date: Timestamp,
    /// Click history in occurrence order.
    #[serde(default)]
    pub clicks: Vec<ClickEvent>,
}

impl UrlRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expiry_date
    }
}

/// Where a click came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickSource {
    /// A click simulated from the statistics view.
    #[serde(rename = "UI Click")]
    UiClick,
    /// A click arriving from outside the application.
    #[serde(rename = "External")]
    External,
}

impl std::fmt::Display for ClickSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickSource::UiClick => f.write_str("UI Click"),
            ClickSource::External => f.write_str("External"),
        }
    }
}

/// A single access event against a short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: Timestamp,
    pub source: ClickSource,
    /// Best-effort origin, [`UNKNOWN_LOCATION`] when unresolvable.
    pub location: String,
}

impl ClickEvent {
    /// Creates an event with an unresolved location.
    pub fn new(timestamp: Timestamp, source: ClickSource) -> Self {
        Self {
            timestamp,
            source,
            location: UNKNOWN_LOCATION.to_string(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        if !location.trim().is_empty() {
            self.location = location;
        }
        self
    }
}

/// Click aggregate kept per short code alongside the record store.
///
/// `count` always equals `detailed.len()`; the only mutation is [`push`].
///
/// [`push`]: ClickLedgerEntry::push
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickLedgerEntry {
    count: u64,
    detailed: Vec<ClickEvent>,
}

impl ClickLedgerEntry {
    /// Builds an entry from an existing click history.
    pub fn from_events(detailed: Vec<ClickEvent>) -> Self {
        Self {
            count: detailed.len() as u64,
            detailed,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn detailed(&self) -> &[ClickEvent] {
        &self.detailed
    }

    pub fn push(&mut self, event: ClickEvent) {
        self.detailed.push(event);
        self.count = self.detailed.len() as u64;
    }

    /// Returns `true` when the stored count disagrees with the event log,
    /// which can only happen for data written by something else.
    pub fn is_inconsistent(&self) -> bool {
        self.count != self.detailed.len() as u64
    }

    /// Resets `count` to the length of the event log.
    pub fn repair(&mut self) {
        self.count = self.detailed.len() as u64;
    }
}

/// One raw submission slot as collected by the presentation layer.
///
/// Empty strings mean "not submitted".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Candidate {
    pub original_url: String,
    pub validity: String,
    pub shortcode: String,
}

impl Candidate {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            ..Self::default()
        }
    }

    pub fn with_validity(mut self, validity: impl Into<String>) -> Self {
        self.validity = validity.into();
        self
    }

    pub fn with_shortcode(mut self, shortcode: impl Into<String>) -> Self {
        self.shortcode = shortcode.into();
        self
    }
}

/// A validated candidate, ready to become a [`UrlRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub original_url: String,
    /// `None` selects the default validity.
    pub validity_minutes: Option<u64>,
    /// `None` asks the allocator to generate a code.
    pub shortcode: Option<ShortCode>,
}
