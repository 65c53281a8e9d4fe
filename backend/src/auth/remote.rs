//! Auth provider for the hosted GoTrue-style service under `{url}/auth/v1`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{AuthProvider, AuthUser, ProviderError, Session};
use crate::db::RestConfig;
use crate::models::UserId;

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<RemoteUser> for AuthUser {
    fn from(user: RemoteUser) -> Self {
        let full_name = user
            .user_metadata
            .get("nome_completo")
            .and_then(Value::as_str)
            .map(str::to_string);
        AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    user: RemoteUser,
}

impl From<RemoteSession> for Session {
    fn from(session: RemoteSession) -> Self {
        Session {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user: session.user.into(),
        }
    }
}

/// Pull the human message out of an auth error body.
///
/// The service answers with `{"error_description": ..}`, `{"msg": ..}` or
/// `{"message": ..}` depending on the endpoint.
pub fn error_message(body: &str) -> String {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Decode a sign-up answer: a full session, or the bare user while the email
/// awaits confirmation.
pub fn parse_sign_up(value: Value) -> Result<(AuthUser, Option<Session>), ProviderError> {
    if value.get("access_token").is_some() {
        let session: RemoteSession = serde_json::from_value(value)
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;
        let session = Session::from(session);
        return Ok((session.user.clone(), Some(session)));
    }
    let user_value = value.get("user").cloned().unwrap_or(value);
    let user: RemoteUser =
        serde_json::from_value(user_value).map_err(|e| ProviderError::Rejected(e.to_string()))?;
    Ok((user.into(), None))
}

pub struct RemoteAuthProvider {
    client: reqwest::Client,
    config: RestConfig,
}

impl RemoteAuthProvider {
    pub fn new(config: RestConfig) -> Result<Self, ProviderError> {
        config.validate().map_err(ProviderError::Connection)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Connection(e.to_string()))?;
        log::info!("Auth provider configured for {}", config.auth_base());
        Ok(Self { client, config })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.config.auth_base(), path))
            .header("apikey", &self.config.anon_key)
            .header("Content-Type", "application/json")
    }

    async fn send(request: RequestBuilder, operation: &str) -> Result<Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        log::warn!("Auth call {} failed ({}): {}", operation, status, message);
        if status.is_server_error() {
            return Err(ProviderError::Connection(message));
        }
        Err(ProviderError::Rejected(message))
    }

    async fn json(response: Response) -> Result<Value, ProviderError> {
        response
            .json()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))
    }
}

#[async_trait]
impl AuthProvider for RemoteAuthProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let request = self
            .post("token")
            .query(&[("grant_type", "password")])
            .json(&json!({"email": email, "password": password}));
        let value = Self::json(Self::send(request, "token").await?).await?;
        let session: RemoteSession =
            serde_json::from_value(value).map_err(|e| ProviderError::Rejected(e.to_string()))?;
        Ok(session.into())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(AuthUser, Option<Session>), ProviderError> {
        let request = self.post("signup").json(&json!({
            "email": email,
            "password": password,
            "data": {"nome_completo": full_name},
        }));
        let value = Self::json(Self::send(request, "signup").await?).await?;
        parse_sign_up(value)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let request = self.post("logout").bearer_auth(access_token);
        Self::send(request, "logout").await?;
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), ProviderError> {
        let mut request = self.post("recover").json(&json!({"email": email}));
        if let Some(redirect) = redirect_to {
            request = request.query(&[("redirect_to", redirect)]);
        }
        Self::send(request, "recover").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(error_message("  gateway timeout "), "gateway timeout");
    }

    #[test]
    fn test_parse_sign_up_with_and_without_session() {
        let id = uuid::Uuid::new_v4();
        let pending = json!({"id": id, "email": "ana@example.com", "user_metadata": {"nome_completo": "Ana"}});
        let (user, session) = parse_sign_up(pending).unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Ana"));
        assert!(session.is_none());

        let active = json!({
            "access_token": "jwt",
            "expires_in": 3600,
            "user": {"id": id, "email": "ana@example.com"}
        });
        let (user, session) = parse_sign_up(active).unwrap();
        assert_eq!(user.id, UserId(id));
        assert_eq!(session.unwrap().access_token, "jwt");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(RemoteAuthProvider::new(RestConfig::default()).is_err());
    }
}
