use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ChirpError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("this action is unauthorized")]
    Forbidden,

    #[error("chirp {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<ValidationErrors> for ChirpError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
