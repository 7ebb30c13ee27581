use chrono::{DateTime, TimeDelta, Utc};

use chirper_types::models::Chirp;

use crate::error::ChirpError;
use crate::store::ChirpStore;

pub const FEED_WINDOW_DAYS: i64 = 7;

pub fn feed_window() -> TimeDelta {
    TimeDelta::days(FEED_WINDOW_DAYS)
}

/// Keep chirps created in `[now - window, now]`, both ends inclusive.
/// Order is preserved.
pub fn within_window(chirps: Vec<Chirp>, now: DateTime<Utc>, window: TimeDelta) -> Vec<Chirp> {
    let start = now - window;
    chirps
        .into_iter()
        .filter(|chirp| chirp.created_at >= start && chirp.created_at <= now)
        .collect()
}

/// Newest-first chirps from the trailing feed window ending at `now`.
pub fn list_recent(store: &dyn ChirpStore, now: DateTime<Utc>) -> Result<Vec<Chirp>, ChirpError> {
    let chirps = store.list_newest_first()?;
    Ok(within_window(chirps, now, feed_window()))
}
