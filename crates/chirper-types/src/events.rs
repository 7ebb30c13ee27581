use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events published after a chirp change has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChirpEvent {
    /// A new chirp was stored
    Created {
        id: Uuid,
        author_id: Uuid,
        author_username: String,
        message: String,
        created_at: DateTime<Utc>,
    },
}

impl ChirpEvent {
    pub fn chirp_id(&self) -> Uuid {
        match self {
            Self::Created { id, .. } => *id,
        }
    }
}
