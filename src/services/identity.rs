use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::local_storage::PreferenceStore;
use crate::utilities::constants::IDENTITY_KEY;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub is_authenticated: bool,
    pub id: String,
}

impl User {
    pub fn anonymous() -> Self {
        User::default()
    }

    pub fn authenticated(id: &str) -> Self {
        User {
            is_authenticated: true,
            id: id.to_string(),
        }
    }
}

/// Holds the signed in user and tells subscribers when it changes.
/// The OAuth exchange itself happens elsewhere, this only records its outcome.
pub struct IdentityProvider {
    sender: watch::Sender<User>,
    store: Option<Arc<PreferenceStore>>,
}

impl IdentityProvider {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(User::anonymous());
        IdentityProvider {
            sender,
            store: None,
        }
    }

    /// Restores the last identity saved in `store` and keeps it up to date.
    pub fn with_store(store: Arc<PreferenceStore>) -> Self {
        let user = store
            .get_object::<User>(IDENTITY_KEY)
            .unwrap_or_else(User::anonymous);
        let (sender, _) = watch::channel(user);
        IdentityProvider {
            sender,
            store: Some(store),
        }
    }

    pub fn current(&self) -> User {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<User> {
        self.sender.subscribe()
    }

    pub fn log_in(&self, id: &str) {
        info!("User {} logged in", id);
        self.set_user(User::authenticated(id));
    }

    pub fn log_out(&self) {
        info!("User logged out");
        self.set_user(User::anonymous());
    }

    fn set_user(&self, user: User) {
        if let Some(store) = &self.store {
            let saved = if user.is_authenticated {
                store.set_object(IDENTITY_KEY, &user)
            } else {
                store.remove_item(IDENTITY_KEY)
            };
            if let Err(e) = saved {
                warn!("Could not persist identity: {}", e);
            }
        }
        self.sender.send_replace(user);
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_anonymous() {
        let identity = IdentityProvider::new();
        assert_eq!(identity.current(), User::anonymous());
        assert!(!identity.current().is_authenticated);
    }

    #[tokio::test]
    async fn subscribers_see_login_and_logout() {
        let identity = IdentityProvider::new();
        let mut receiver = identity.subscribe();

        identity.log_in("u1");
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), User::authenticated("u1"));

        identity.log_out();
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow_and_update(), User::anonymous());
    }

    #[test]
    fn identity_is_restored_from_store() {
        let store = Arc::new(PreferenceStore::in_memory());
        IdentityProvider::with_store(Arc::clone(&store)).log_in("u7");

        let restored = IdentityProvider::with_store(Arc::clone(&store));
        assert_eq!(restored.current(), User::authenticated("u7"));

        restored.log_out();
        assert_eq!(IdentityProvider::with_store(store).current(), User::anonymous());
    }
}
