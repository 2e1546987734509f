//! Field validation for shortening candidates.
//!
//! Every check is pure. Empty fields mean "not submitted" and are handled by
//! [`validate_candidate`], the individual checks treat them as ordinary input.

use crate::error::{Result, ValidationError};
use crate::model::{Candidate, RecordDraft};
use crate::shortcode::ShortCode;
use url::Url;

/// Checks that `candidate` is an absolute URL with a scheme and an authority.
pub fn validate_url(candidate: &str) -> Result<()> {
    match Url::parse(candidate) {
        Ok(url) if url.has_host() => Ok(()),
        _ => Err(ValidationError::InvalidUrl(candidate.to_string())),
    }
}

pub fn is_valid_url(candidate: &str) -> bool {
    validate_url(candidate).is_ok()
}

/// Checks a validity duration in minutes.
///
/// Empty input is accepted and means "use the default". Anything else must
/// be made of ASCII digits only and denote a value of at least one.
pub fn validate_validity(candidate: &str) -> Result<()> {
    parse_validity(candidate).map(|_| ())
}

pub fn is_valid_validity(candidate: &str) -> bool {
    validate_validity(candidate).is_ok()
}

/// Parses a validity duration, `Ok(None)` for empty input.
///
/// Values too large for `u64` are clamped to `u64::MAX`; the resulting
/// expiry saturates anyway.
pub fn parse_validity(candidate: &str) -> Result<Option<u64>> {
    if candidate.is_empty() {
        return Ok(None);
    }

    if !candidate.bytes().all(|b| b.is_ascii_digit()) || candidate.bytes().all(|b| b == b'0') {
        return Err(ValidationError::InvalidValidity(candidate.to_string()));
    }

    Ok(Some(candidate.parse::<u64>().unwrap_or(u64::MAX)))
}

/// Parses an optional custom short code, `Ok(None)` for empty input.
pub fn parse_shortcode(candidate: &str) -> Result<Option<ShortCode>> {
    if candidate.is_empty() {
        return Ok(None);
    }
    ShortCode::new(candidate).map(Some)
}

/// Per-field validation failures of one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub original_url: Option<ValidationError>,
    pub validity: Option<ValidationError>,
    pub shortcode: Option<ValidationError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none() && self.validity.is_none() && self.shortcode.is_none()
    }

    /// Iterates over `(field name, error)` pairs for the failing fields.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ValidationError)> + '_ {
        [
            ("originalUrl", self.original_url.as_ref()),
            ("validity", self.validity.as_ref()),
            ("shortcode", self.shortcode.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, error)| error.map(|e| (field, e)))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, error) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {error}")?;
            first = false;
        }
        Ok(())
    }
}

/// Validates every field of a submission slot.
///
/// Returns `Ok(None)` when the slot carries no URL and no field is
/// malformed, `Ok(Some(draft))` when it is ready to be shortened.
pub fn validate_candidate(
    candidate: &Candidate,
) -> std::result::Result<Option<RecordDraft>, FieldErrors> {
    let mut errors = FieldErrors::default();

    if !candidate.original_url.is_empty() {
        errors.original_url = validate_url(&candidate.original_url).err();
    }
    let validity = match parse_validity(&candidate.validity) {
        Ok(validity) => validity,
        Err(e) => {
            errors.validity = Some(e);
            None
        }
    };
    let shortcode = match parse_shortcode(&candidate.shortcode) {
        Ok(shortcode) => shortcode,
        Err(e) => {
            errors.shortcode = Some(e);
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }
    if candidate.original_url.is_empty() {
        return Ok(None);
    }

    Ok(Some(RecordDraft {
        original_url: candidate.original_url.clone(),
        validity_minutes: validity,
        shortcode,
    }))
}
