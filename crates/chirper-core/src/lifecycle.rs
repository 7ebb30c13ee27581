use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use chirper_types::events::ChirpEvent;
use chirper_types::models::{Author, Chirp};

use crate::Actor;
use crate::error::ChirpError;
use crate::events::EventBus;
use crate::feed;
use crate::policy::{Action, PolicyTable};
use crate::store::ChirpStore;
use crate::validation::{self, CHIRP_QUOTA, MESSAGE_FIELD, Reason, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// The chirp went from unliked to liked.
    Liked,
    /// The chirp was liked before this call; nothing was written.
    AlreadyLiked,
}

/// Create, edit, delete and like chirps on behalf of an actor.
#[derive(Clone)]
pub struct ChirpService {
    store: Arc<dyn ChirpStore>,
    policy: Arc<PolicyTable>,
    events: EventBus,
}

impl ChirpService {
    pub fn new(store: Arc<dyn ChirpStore>, policy: PolicyTable, events: EventBus) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            events,
        }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Surrounding whitespace is dropped before validation, so a blank
    /// message counts as missing.
    pub fn create(&self, actor: &Actor, message: &str) -> Result<Chirp, ChirpError> {
        let message = message.trim();
        let existing = self.store.count_by_author(actor.id)?;
        if let Err(errors) = validation::validate_new_chirp(message, existing) {
            debug!("Rejected chirp from {}: {}", actor.username, errors);
            return Err(errors.into());
        }

        let now = now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            message: message.to_string(),
            author: Author {
                id: actor.id,
                username: actor.username.clone(),
            },
            liked: false,
            created_at: now,
            updated_at: now,
        };

        // The store re-checks the quota atomically; losing that race is a quota error.
        if !self.store.insert(&chirp, CHIRP_QUOTA)? {
            let mut errors = ValidationErrors::new();
            errors.add(MESSAGE_FIELD, Reason::QuotaExceeded);
            return Err(errors.into());
        }

        info!("Chirp {} created by {}", chirp.id, actor.username);
        self.events.emit(ChirpEvent::Created {
            id: chirp.id,
            author_id: actor.id,
            author_username: actor.username.clone(),
            message: chirp.message.clone(),
            created_at: chirp.created_at,
        });

        Ok(chirp)
    }

    /// Load a chirp for its edit form. Only the author gets it back.
    pub fn find_for_edit(&self, actor: &Actor, id: Uuid) -> Result<Chirp, ChirpError> {
        let chirp = self.find(id)?;
        self.authorize(Action::Update, actor, &chirp)?;
        Ok(chirp)
    }

    pub fn edit(&self, actor: &Actor, id: Uuid, message: &str) -> Result<Chirp, ChirpError> {
        let mut chirp = self.find(id)?;
        self.authorize(Action::Update, actor, &chirp)?;
        let message = message.trim();
        validation::validate_edit(message)?;

        chirp.message = message.to_string();
        chirp.updated_at = now();
        if !self.store.update(&chirp)? {
            return Err(ChirpError::NotFound(id));
        }

        info!("Chirp {} edited by {}", id, actor.username);
        Ok(chirp)
    }

    pub fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ChirpError> {
        let chirp = self.find(id)?;
        self.authorize(Action::Delete, actor, &chirp)?;

        if !self.store.delete(id)? {
            return Err(ChirpError::NotFound(id));
        }

        info!("Chirp {} deleted by {}", id, actor.username);
        Ok(())
    }

    /// One-way like. Any actor may like any chirp; a second like is a no-op.
    pub fn like(&self, actor: &Actor, id: Uuid) -> Result<LikeOutcome, ChirpError> {
        let chirp = self.find(id)?;
        if chirp.liked {
            debug!("Chirp {} already liked, ignoring like from {}", id, actor.username);
            return Ok(LikeOutcome::AlreadyLiked);
        }

        if self.store.mark_liked(id)? {
            info!("Chirp {} liked by {}", id, actor.username);
            Ok(LikeOutcome::Liked)
        } else if self.store.find_by_id(id)?.is_some() {
            // Someone else liked it between our read and the conditional write
            Ok(LikeOutcome::AlreadyLiked)
        } else {
            Err(ChirpError::NotFound(id))
        }
    }

    pub fn list_recent(&self, now: DateTime<Utc>) -> Result<Vec<Chirp>, ChirpError> {
        feed::list_recent(self.store.as_ref(), now)
    }

    fn find(&self, id: Uuid) -> Result<Chirp, ChirpError> {
        self.store.find_by_id(id)?.ok_or(ChirpError::NotFound(id))
    }

    fn authorize(&self, action: Action, actor: &Actor, chirp: &Chirp) -> Result<(), ChirpError> {
        self.policy.authorize(action, actor, chirp).inspect_err(|_| {
            debug!("{} denied {:?} on chirp {}", actor.username, action, chirp.id);
        })
    }
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
