use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use chirper_core::ChirpError;
use chirper_core::validation::ValidationErrors;
use chirper_types::api::ValidationErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Chirp(#[from] ChirpError),

    /// A path id that could never resolve to a chirp.
    #[error("chirp {0} not found")]
    UnknownChirp(String),

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Chirp(ChirpError::Validation(errors)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(validation_body(&errors))).into_response()
            }
            Self::Chirp(ChirpError::Forbidden) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "This action is unauthorized." })),
            )
                .into_response(),
            Self::Chirp(ChirpError::NotFound(id)) => not_found(&id.to_string()),
            Self::UnknownChirp(raw) => not_found(&raw),
            Self::Chirp(ChirpError::Store(e)) => {
                error!("Chirp storage error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("Chirp {} not found.", id) })),
    )
        .into_response()
}

/// `{"message": <first error>, "errors": {<field>: [<message>, ..]}}`
fn validation_body(errors: &ValidationErrors) -> ValidationErrorResponse {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for e in errors.iter() {
        grouped.entry(e.field.to_string()).or_default().push(e.message());
    }

    let total = errors.iter().count();
    let first = errors.iter().next().map(|e| e.message()).unwrap_or_default();
    let message = match total {
        0 | 1 => first,
        2 => format!("{} (and 1 more error)", first),
        n => format!("{} (and {} more errors)", first, n - 1),
    };

    ValidationErrorResponse { message, errors: grouped }
}
