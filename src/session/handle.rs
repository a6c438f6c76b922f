use parking_lot::RwLock;
use tracing::info;

use super::persist::Persister;
use super::state::{PersistedSession, Session};
use crate::api::SessionAccess;
use crate::storage::LocalStorage;

/// Owner of the live session state.
///
/// One instance lives for the whole process. The lock is never held across
/// an `.await`.
pub struct SessionHandle {
    state: RwLock<Session>,
    persister: Option<Persister>,
}

impl SessionHandle {
    /// Session that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Session::default()),
            persister: None,
        }
    }

    /// Restore from `storage` and keep it updated from then on
    pub async fn restore(storage: LocalStorage, key: &str) -> Self {
        let session = storage
            .get_item::<PersistedSession>(key)
            .await
            .map(Session::hydrate)
            .unwrap_or_default();

        if let Some(user) = &session.user {
            info!("Restored session for {}", user.email);
        }

        Self {
            state: RwLock::new(session),
            persister: Some(Persister::spawn(storage, key.to_string())),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    /// Apply a transition; queue a save when the persisted projection changed
    pub(crate) fn update<R>(&self, transition: impl FnOnce(&mut Session) -> R) -> R {
        let mut state = self.state.write();
        let before = state.persisted();
        let result = transition(&mut *state);
        let after = state.persisted();

        // Queued under the lock so records reach the writer in commit order
        if let Some(persister) = &self.persister {
            if before != after {
                persister.save(after);
            }
        }
        result
    }

    /// Synchronous, no network, idempotent
    pub fn sign_out(&self) {
        self.update(Session::sign_out);
    }

    pub fn clear_error(&self) {
        self.update(Session::clear_error);
    }

    /// Wait for pending writes to reach storage
    pub async fn flush(&self) {
        if let Some(persister) = &self.persister {
            persister.flush().await;
        }
    }
}

impl SessionAccess for SessionHandle {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }

    fn revoke(&self) {
        self.sign_out();
    }
}
