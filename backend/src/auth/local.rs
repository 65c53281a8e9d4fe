//! In-memory auth provider.
//!
//! Answers with the same raw messages as the hosted auth service so the
//! friendly-message mapping is exercised the same way.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{AuthProvider, AuthUser, ProviderError, Session};
use crate::db::checksum::calculate_checksum;
use crate::models::UserId;
use crate::services::validation::is_valid_email;

const MIN_PASSWORD_LEN: usize = 6;
const SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct StoredUser {
    user: AuthUser,
    salt: String,
    password_hash: String,
    confirmed: bool,
}

#[derive(Default)]
struct AuthData {
    users: HashMap<String, StoredUser>,
    sessions: HashMap<String, UserId>,
    reset_requests: Vec<String>,
}

#[derive(Clone, Default)]
pub struct LocalAuthProvider {
    data: Arc<RwLock<AuthData>>,
    require_confirmation: bool,
}

fn hash_password(salt: &str, password: &str) -> String {
    calculate_checksum(&format!("{}:{}", salt, password))
}

fn rejected(message: &str) -> ProviderError {
    ProviderError::Rejected(message.to_string())
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// New sign-ups cannot sign in until [`confirm_email`](Self::confirm_email).
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    pub fn confirm_email(&self, email: &str) -> bool {
        match self.data.write().users.get_mut(&email.to_lowercase()) {
            Some(stored) => {
                stored.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Token owner, if the session is live.
    pub fn user_for_token(&self, access_token: &str) -> Option<AuthUser> {
        let data = self.data.read();
        let id = data.sessions.get(access_token)?;
        data.users
            .values()
            .find(|s| s.user.id == *id)
            .map(|s| s.user.clone())
    }

    /// Emails that asked for a password reset, oldest first.
    pub fn reset_requests(&self) -> Vec<String> {
        self.data.read().reset_requests.clone()
    }

    fn open_session(data: &mut AuthData, user: &AuthUser) -> Session {
        let access_token = Uuid::new_v4().simple().to_string();
        data.sessions.insert(access_token.clone(), user.id);
        Session {
            access_token,
            refresh_token: Some(Uuid::new_v4().simple().to_string()),
            expires_in: Some(SESSION_TTL_SECS),
            user: user.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let mut data = self.data.write();
        let stored = data
            .users
            .get(&email.to_lowercase())
            .filter(|s| hash_password(&s.salt, password) == s.password_hash)
            .cloned()
            .ok_or_else(|| rejected("Invalid login credentials"))?;
        if !stored.confirmed {
            return Err(rejected("Email not confirmed"));
        }
        Ok(Self::open_session(&mut data, &stored.user))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(AuthUser, Option<Session>), ProviderError> {
        if !is_valid_email(email) {
            return Err(rejected("Invalid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(rejected("Password should be at least 6 characters"));
        }
        let key = email.to_lowercase();
        let mut data = self.data.write();
        if data.users.contains_key(&key) {
            return Err(rejected("User already registered"));
        }

        let user = AuthUser {
            id: UserId::new(),
            email: key.clone(),
            full_name: Some(full_name.to_string()).filter(|n| !n.is_empty()),
        };
        let salt = Uuid::new_v4().simple().to_string();
        let stored = StoredUser {
            user: user.clone(),
            password_hash: hash_password(&salt, password),
            salt,
            confirmed: !self.require_confirmation,
        };
        data.users.insert(key, stored);

        let session = if self.require_confirmation {
            None
        } else {
            Some(Self::open_session(&mut data, &user))
        };
        Ok((user, session))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.data.write().sessions.remove(access_token);
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        _redirect_to: Option<&str>,
    ) -> Result<(), ProviderError> {
        if !is_valid_email(email) {
            return Err(rejected("Invalid email"));
        }
        // Unknown emails succeed too, so the endpoint does not reveal accounts.
        self.data.write().reset_requests.push(email.to_lowercase());
        Ok(())
    }
}
