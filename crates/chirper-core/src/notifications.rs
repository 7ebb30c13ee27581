use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use chirper_db::Database;
use chirper_types::events::ChirpEvent;

/// A "new chirp" notice addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient_id: String,
    pub recipient: String,
    pub chirp_id: Uuid,
    pub author: String,
}

/// Everyone except the author hears about a new chirp.
pub fn notifications_for(db: &Database, event: &ChirpEvent) -> Result<Vec<Notification>> {
    match event {
        ChirpEvent::Created { id, author_id, author_username, .. } => {
            let recipients = db.list_users_except(&author_id.to_string())?;
            Ok(recipients
                .into_iter()
                .map(|user| Notification {
                    recipient_id: user.id,
                    recipient: user.username,
                    chirp_id: *id,
                    author: author_username.clone(),
                })
                .collect())
        }
    }
}

/// Observer loop: turns each event into notifications until the bus closes.
/// Returns the number of notifications sent.
pub async fn run(db: Arc<Database>, mut rx: broadcast::Receiver<ChirpEvent>) -> usize {
    let mut sent = 0;

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Notifier lagged, {} chirp events dropped", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let chirp_id = event.chirp_id();
        let db = db.clone();
        let result = tokio::task::spawn_blocking(move || notifications_for(&db, &event)).await;

        let notifications = match result {
            Ok(Ok(notifications)) => notifications,
            Ok(Err(e)) => {
                error!("Failed to resolve recipients for chirp {}: {}", chirp_id, e);
                continue;
            }
            Err(e) => {
                error!("spawn_blocking join error: {}", e);
                continue;
            }
        };

        if notifications.is_empty() {
            debug!("No one to notify about chirp {}", chirp_id);
        }
        for n in &notifications {
            info!(
                recipient = %n.recipient,
                recipient_id = %n.recipient_id,
                "New chirp {} from {}",
                n.chirp_id,
                n.author
            );
        }
        sent += notifications.len();
    }

    debug!("Notifier stopped after {} notifications", sent);
    sent
}
