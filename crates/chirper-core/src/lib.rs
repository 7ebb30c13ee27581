//! Chirp domain logic: the lifecycle service, the recent feed, the
//! authorization table and the event plumbing around them.
//!
//! Nothing in here knows about HTTP. Every operation takes the acting user
//! as an explicit [`Actor`] argument.

pub mod error;
pub mod events;
pub mod feed;
pub mod lifecycle;
pub mod notifications;
pub mod policy;
pub mod store;
pub mod validation;

use uuid::Uuid;

pub use error::ChirpError;
pub use lifecycle::{ChirpService, LikeOutcome};
pub use policy::{Action, PolicyTable};
pub use store::ChirpStore;

/// The authenticated user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
}
