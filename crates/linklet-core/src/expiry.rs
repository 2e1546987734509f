use jiff::{SignedDuration, Timestamp};

/// Lifetime applied when a candidate does not specify one.
pub const DEFAULT_VALIDITY_MINUTES: u64 = 30;

/// Computes the informational expiry of a record created at `created_at`.
///
/// `None` selects [`DEFAULT_VALIDITY_MINUTES`]. The result saturates at
/// [`Timestamp::MAX`] for lifetimes that run past the representable range.
pub fn compute_expiry(created_at: Timestamp, validity_minutes: Option<u64>) -> Timestamp {
    let minutes = validity_minutes.unwrap_or(DEFAULT_VALIDITY_MINUTES);
    i64::try_from(minutes)
        .ok()
        .and_then(|minutes| minutes.checked_mul(60))
        .and_then(|secs| created_at.checked_add(SignedDuration::from_secs(secs)).ok())
        .unwrap_or(Timestamp::MAX)
}
