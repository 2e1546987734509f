use thiserror::Error;

/// Result type for validation performed by this crate.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A field-level validation failure.
///
/// The `Display` output is the human-readable reason shown next to the
/// offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid URL format")]
    InvalidUrl(String),
    #[error("Validity must be a positive integer")]
    InvalidValidity(String),
    #[error("Shortcode must be 3-32 characters of letters, digits, '-' or '_'")]
    InvalidShortCode(String),
}

impl ValidationError {
    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        match self {
            ValidationError::InvalidUrl(input)
            | ValidationError::InvalidValidity(input)
            | ValidationError::InvalidShortCode(input) => input,
        }
    }
}
