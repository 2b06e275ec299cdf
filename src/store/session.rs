use std::sync::Arc;

use crate::common::UserInfo;
use crate::storage::{KvStore, StorageError};

const TOKEN_KEY: &str = "token";
const USER_INFO_KEY: &str = "userInfo";

/// Persisted credential and profile of the signed-in user.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<KvStore>,
}

impl SessionStore {
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &Arc<KvStore> {
        &self.kv
    }

    pub fn token(&self) -> Option<String> {
        match self.kv.get(TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                log::warn!("Failed to read stored token: {err}");
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.kv.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) {
        if let Err(err) = self.kv.remove(TOKEN_KEY) {
            log::warn!("Failed to clear stored token: {err}");
        }
    }

    /// Cached profile. A corrupt entry is treated as absent.
    pub fn user_info(&self) -> Option<UserInfo> {
        match self.kv.get_json::<UserInfo>(USER_INFO_KEY) {
            Ok(info) => info,
            Err(err) => {
                log::warn!("Ignoring stored user info: {err}");
                None
            }
        }
    }

    pub fn set_user_info(&self, info: &UserInfo) -> Result<(), StorageError> {
        self.kv.set_json(USER_INFO_KEY, info)
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn logout(&self) -> Result<(), StorageError> {
        self.kv.remove(TOKEN_KEY)?;
        self.kv.remove(USER_INFO_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(KvStore::in_memory().unwrap()))
    }

    #[test]
    fn token_lifecycle() {
        let session = store();
        assert!(!session.is_logged_in());

        session.set_token("abc").unwrap();
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert!(session.is_logged_in());

        session.clear_token();
        assert!(!session.is_logged_in());
    }

    #[test]
    fn user_info_round_trip_and_logout() {
        let session = store();
        let info = UserInfo {
            id: UserId(1),
            username: "alice".to_string(),
            nickname: "Alice".to_string(),
            avatar: String::new(),
            email: None,
        };
        session.set_token("abc").unwrap();
        session.set_user_info(&info).unwrap();
        assert_eq!(session.user_info(), Some(info));

        session.logout().unwrap();
        assert_eq!(session.user_info(), None);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn corrupt_user_info_is_ignored() {
        let session = store();
        session.kv().set("userInfo", "{oops").unwrap();
        assert_eq!(session.user_info(), None);
    }
}
