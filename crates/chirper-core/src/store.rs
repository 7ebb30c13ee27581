use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use chirper_db::models::{ChirpRow, NewChirpRow};
use chirper_db::{Database, format_timestamp, parse_timestamp};
use chirper_types::models::{Author, Chirp};

/// Persistence seam for chirps. Implementations must make `insert` and
/// `mark_liked` atomic with respect to concurrent callers.
pub trait ChirpStore: Send + Sync {
    /// Store `chirp` unless its author already owns `quota` chirps.
    /// Returns false, storing nothing, when the quota is reached.
    fn insert(&self, chirp: &Chirp, quota: u32) -> Result<bool>;

    /// Persist an edit: `message` and `updated_at` only. Returns false if the
    /// chirp no longer exists.
    fn update(&self, chirp: &Chirp) -> Result<bool>;

    fn delete(&self, id: Uuid) -> Result<bool>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Chirp>>;

    fn count_by_author(&self, user_id: Uuid) -> Result<u32>;

    /// Every chirp with its author attached, newest first.
    fn list_newest_first(&self) -> Result<Vec<Chirp>>;

    /// Set `liked` only if it is currently false. Returns true if a row changed.
    fn mark_liked(&self, id: Uuid) -> Result<bool>;
}

impl ChirpStore for Database {
    fn insert(&self, chirp: &Chirp, quota: u32) -> Result<bool> {
        let id = chirp.id.to_string();
        let author_id = chirp.author.id.to_string();
        let created_at = format_timestamp(chirp.created_at);
        self.insert_chirp_within_quota(
            &NewChirpRow {
                id: &id,
                author_id: &author_id,
                message: &chirp.message,
                created_at: &created_at,
            },
            quota,
        )
    }

    fn update(&self, chirp: &Chirp) -> Result<bool> {
        self.update_chirp_message(
            &chirp.id.to_string(),
            &chirp.message,
            &format_timestamp(chirp.updated_at),
        )
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        self.delete_chirp(&id.to_string())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Chirp>> {
        Ok(self.get_chirp(&id.to_string())?.map(chirp_from_row))
    }

    fn count_by_author(&self, user_id: Uuid) -> Result<u32> {
        self.count_chirps_by_author(&user_id.to_string())
    }

    fn list_newest_first(&self) -> Result<Vec<Chirp>> {
        Ok(self.list_chirps_newest_first()?.into_iter().map(chirp_from_row).collect())
    }

    fn mark_liked(&self, id: Uuid) -> Result<bool> {
        self.mark_chirp_liked(&id.to_string())
    }
}

fn chirp_from_row(row: ChirpRow) -> Chirp {
    let created_at = timestamp_or_default(&row.created_at, "created_at", &row.id);
    let updated_at = timestamp_or_default(&row.updated_at, "updated_at", &row.id);

    Chirp {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt chirp id '{}': {}", row.id, e);
            Uuid::default()
        }),
        author: Author {
            id: row.author_id.parse().unwrap_or_else(|e| {
                warn!("Corrupt author_id '{}' on chirp '{}': {}", row.author_id, row.id, e);
                Uuid::default()
            }),
            username: row.author_username,
        },
        message: row.message,
        liked: row.liked,
        created_at,
        updated_at,
    }
}

fn timestamp_or_default(raw: &str, column: &str, chirp_id: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on chirp '{}': {}", column, raw, chirp_id, e);
        DateTime::default()
    })
}
