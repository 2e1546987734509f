use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("no free short code found after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("invalid code length {length}; expected {min}..={max}")]
    InvalidLength { length: usize, min: usize, max: usize },
    #[error("alphabet must be non-empty and contain only ASCII letters or digits")]
    InvalidAlphabet,
}
