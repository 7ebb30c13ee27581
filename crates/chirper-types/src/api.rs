use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Author, Chirp};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Chirps --

/// Body of both `POST /chirps` and `PUT /chirps/{id}`.
/// A missing `message` deserializes to an empty string so it fails the
/// `required` rule instead of being rejected by the extractor.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChirpRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub message: String,
    pub author: Author,
    pub liked: bool,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl ChirpResponse {
    pub fn new(chirp: Chirp, can_edit: bool, can_delete: bool) -> Self {
        Self {
            edited: chirp.is_edited(),
            id: chirp.id,
            message: chirp.message,
            author: chirp.author,
            liked: chirp.liked,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            can_edit,
            can_delete,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    /// False when the chirp was already liked and nothing was written.
    pub changed: bool,
}

// -- Errors --

/// 422 body: a summary line plus every failing rule grouped by field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub errors: BTreeMap<String, Vec<String>>,
}
