use crate::notifier::Notifier;
use parley_persistence::KeyValueStore;
use parley_types::{User, UserId};
use std::sync::Arc;

/// Resolved identity plus the shared collaborators a timeline needs
///
/// Only a logged-in [`User`] can produce one, so holding a context means the
/// user id is known.
#[derive(Clone)]
pub struct SessionContext {
    user: User,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl SessionContext {
    pub fn new(user: User, store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            user,
            store,
            notifier,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> UserId {
        self.user.id()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user.id())
            .finish_non_exhaustive()
    }
}
