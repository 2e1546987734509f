use linklet_core::FieldErrors;
use linklet_generator::AllocationError;
use linklet_storage::CreateError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("invalid input: {0}")]
    InvalidInput(FieldErrors),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("batch of {size} candidates exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

impl From<CreateError> for ShortenerError {
    fn from(value: CreateError) -> Self {
        match value {
            CreateError::AliasConflict(code) => Self::AliasConflict(code),
            CreateError::Allocation(e) => Self::Allocation(e),
        }
    }
}
