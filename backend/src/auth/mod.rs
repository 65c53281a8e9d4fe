//! Authentication against the backend's auth service, with per-email rate
//! limiting in front of it.
//!
//! # Module Organization
//!
//! - [`rate_limit`]: In-memory attempt counters
//! - [`local`]: In-memory provider for development and tests
//! - [`remote`]: GoTrue-style HTTP provider (feature `rest-repo`)

pub mod local;
pub mod rate_limit;
#[cfg(feature = "rest-repo")]
pub mod remote;

pub use local::LocalAuthProvider;
pub use rate_limit::{RateLimitConfig, RateLimiter};
#[cfg(feature = "rest-repo")]
pub use remote::RemoteAuthProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::UserId;
use crate::services::messages::auth_message;
use rate_limit::minutes_from_secs;

/// Signed-in user as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Error raised by an [`AuthProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The service refused the request; carries its raw message
    /// (e.g. `Invalid login credentials`).
    #[error("{0}")]
    Rejected(String),
    /// The service could not be reached.
    #[error("connection error: {0}")]
    Connection(String),
}

/// Operations offered by the backend's auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError>;

    /// Register a user. The session is absent while the email awaits
    /// confirmation.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(AuthUser, Option<Session>), ProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), ProviderError>;
}

/// Which limiter an attempt counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    Login,
    Signup,
    PasswordReset,
}

impl AuthAction {
    fn lockout_message(&self, minutes: i64) -> String {
        match self {
            Self::Login => format!(
                "Muitas tentativas de login. Tente novamente em {} minuto(s).",
                minutes
            ),
            Self::Signup => format!(
                "Muitas tentativas de cadastro. Tente novamente em {} minuto(s).",
                minutes
            ),
            Self::PasswordReset => format!(
                "Muitas solicitações de recuperação. Tente novamente em {} minuto(s).",
                minutes
            ),
        }
    }
}

pub const CONNECTION_ERROR: &str = "Erro de conexão. Verifique sua internet e tente novamente.";
pub const LOGOUT_ERROR: &str = "Erro ao fazer logout. Tente novamente.";

/// Errors surfaced to users; every variant displays as pt-BR text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{}", action.lockout_message(*retry_after_minutes))]
    RateLimited {
        action: AuthAction,
        retry_after_minutes: i64,
    },
    /// Friendly translation of a provider rejection.
    #[error("{0}")]
    Rejected(String),
    #[error("{}", CONNECTION_ERROR)]
    Connection,
    #[error("{}", LOGOUT_ERROR)]
    SignOut,
    #[error("Sessão inválida ou expirada")]
    Unauthorized,
}

impl AuthError {
    fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected(message) => Self::Rejected(auth_message(&message).to_string()),
            ProviderError::Connection(detail) => {
                log::warn!("Auth service unreachable: {}", detail);
                Self::Connection
            }
        }
    }
}

/// Rate-limited front for an [`AuthProvider`].
///
/// Attempts are keyed by the lower-cased email. A successful sign-in or
/// sign-up clears the counter for that email; password resets never do.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    login: RateLimiter,
    signup: RateLimiter,
    reset: RateLimiter,
}

impl AuthService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self::with_limits(
            provider,
            RateLimitConfig::login(),
            RateLimitConfig::signup(),
            RateLimitConfig::password_reset(),
        )
    }

    pub fn with_limits(
        provider: Arc<dyn AuthProvider>,
        login: RateLimitConfig,
        signup: RateLimitConfig,
        reset: RateLimitConfig,
    ) -> Self {
        Self {
            provider,
            login: RateLimiter::new(login),
            signup: RateLimiter::new(signup),
            reset: RateLimiter::new(reset),
        }
    }

    fn limiter(&self, action: AuthAction) -> &RateLimiter {
        match action {
            AuthAction::Login => &self.login,
            AuthAction::Signup => &self.signup,
            AuthAction::PasswordReset => &self.reset,
        }
    }

    fn admit(&self, action: AuthAction, identifier: &str) -> Result<(), AuthError> {
        let limiter = self.limiter(action);
        if limiter.check(identifier) {
            return Ok(());
        }
        Err(AuthError::RateLimited {
            action,
            retry_after_minutes: minutes_from_secs(limiter.remaining_secs(identifier)),
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let identifier = email.trim().to_lowercase();
        self.admit(AuthAction::Login, &identifier)?;
        let session = self
            .provider
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(AuthError::from_provider)?;
        self.login.reset(&identifier);
        log::info!("User signed in: {}", session.user.id);
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(AuthUser, Option<Session>), AuthError> {
        let identifier = email.trim().to_lowercase();
        self.admit(AuthAction::Signup, &identifier)?;
        let created = self
            .provider
            .sign_up(email.trim(), password, full_name.trim())
            .await
            .map_err(AuthError::from_provider)?;
        self.signup.reset(&identifier);
        log::info!("User registered: {}", created.0.id);
        Ok(created)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.provider.sign_out(access_token).await.map_err(|e| match e {
            ProviderError::Connection(_) => AuthError::Connection,
            ProviderError::Rejected(message) => {
                log::warn!("Sign-out rejected: {}", message);
                AuthError::SignOut
            }
        })
    }

    pub async fn reset_password(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        let identifier = email.trim().to_lowercase();
        self.admit(AuthAction::PasswordReset, &identifier)?;
        self.provider
            .reset_password_for_email(email.trim(), redirect_to)
            .await
            .map_err(AuthError::from_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message() {
        let err = AuthError::RateLimited {
            action: AuthAction::Login,
            retry_after_minutes: 30,
        };
        assert_eq!(
            err.to_string(),
            "Muitas tentativas de login. Tente novamente em 30 minuto(s)."
        );
        assert_eq!(AuthError::Connection.to_string(), CONNECTION_ERROR);
    }

    #[test]
    fn test_provider_rejections_are_translated() {
        let err = AuthError::from_provider(ProviderError::Rejected(
            "Invalid login credentials".into(),
        ));
        assert_eq!(err, AuthError::Rejected("Email ou senha incorretos".into()));
        let unknown = AuthError::from_provider(ProviderError::Rejected("boom".into()));
        assert_eq!(unknown.to_string(), "Erro no sistema. Tente novamente.");
    }
}
