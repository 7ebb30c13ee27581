use std::collections::HashMap;

use chirper_types::models::Chirp;

use crate::Actor;
use crate::error::ChirpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Update,
    Delete,
    Like,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Chirp,
}

pub type Rule = fn(&Actor, &Chirp) -> bool;

pub fn is_author(actor: &Actor, chirp: &Chirp) -> bool {
    actor.id == chirp.author.id
}

pub fn allow_any(_actor: &Actor, _chirp: &Chirp) -> bool {
    true
}

/// Authorization rules keyed by (action, resource kind).
/// A pair with no rule is denied.
#[derive(Clone)]
pub struct PolicyTable {
    rules: HashMap<(Action, ResourceKind), Rule>,
}

impl PolicyTable {
    pub fn empty() -> Self {
        Self { rules: HashMap::new() }
    }

    /// Owners may update and delete their chirps; anyone may like.
    pub fn chirps() -> Self {
        Self::empty()
            .with_rule(Action::Update, ResourceKind::Chirp, is_author)
            .with_rule(Action::Delete, ResourceKind::Chirp, is_author)
            .with_rule(Action::Like, ResourceKind::Chirp, allow_any)
    }

    pub fn with_rule(mut self, action: Action, kind: ResourceKind, rule: Rule) -> Self {
        self.rules.insert((action, kind), rule);
        self
    }

    pub fn allows(&self, action: Action, actor: &Actor, chirp: &Chirp) -> bool {
        self.rules
            .get(&(action, ResourceKind::Chirp))
            .is_some_and(|rule| rule(actor, chirp))
    }

    pub fn authorize(&self, action: Action, actor: &Actor, chirp: &Chirp) -> Result<(), ChirpError> {
        if self.allows(action, actor, chirp) {
            Ok(())
        } else {
            Err(ChirpError::Forbidden)
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::chirps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirper_types::models::Author;
    use uuid::Uuid;

    fn actor(name: &str) -> Actor {
        Actor { id: Uuid::new_v4(), username: name.into() }
    }

    fn chirp_by(author: &Actor) -> Chirp {
        Chirp {
            id: Uuid::new_v4(),
            message: "hi".into(),
            author: Author { id: author.id, username: author.username.clone() },
            liked: false,
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    #[test]
    fn owner_rules() {
        let policy = PolicyTable::chirps();
        let alice = actor("alice");
        let bob = actor("bob");
        let chirp = chirp_by(&alice);

        for action in [Action::Update, Action::Delete] {
            assert!(policy.allows(action, &alice, &chirp));
            assert!(!policy.allows(action, &bob, &chirp));
            assert!(matches!(policy.authorize(action, &bob, &chirp), Err(ChirpError::Forbidden)));
        }
        assert!(policy.allows(Action::Like, &bob, &chirp));
    }

    #[test]
    fn missing_rule_denies() {
        let alice = actor("alice");
        let chirp = chirp_by(&alice);
        assert!(!PolicyTable::empty().allows(Action::Update, &alice, &chirp));
    }
}
