//! Hosted backend repository over HTTP.
//!
//! Tables are reached through PostgREST (`/rest/v1/{table}`) and stored
//! procedures through `POST /rest/v1/rpc/{name}`. Row-level security is
//! enforced by the backend from the bearer token, so no user filter is added
//! here.
//!
//! ## Configuration
//!
//! Environment variables (see [`RestConfig::from_env`]):
//! - `BACKEND_URL`: Project base URL (required)
//! - `BACKEND_ANON_KEY`: Public API key (required)
//! - `BACKEND_ACCESS_TOKEN`: User token (optional)
//! - `BACKEND_TIMEOUT_SECS`: Request timeout (default: 30)

mod config;
mod procedures;
pub mod query;
mod tables;

pub use config::RestConfig;
pub use query::{Order, QueryBuilder};

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

/// Error body returned by PostgREST and by `raise exception` in procedures.
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "msg", alias = "error_description")]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Map a non-2xx response into a [`RepositoryError`].
///
/// # Arguments
/// * `status` - HTTP status code
/// * `body` - Raw response body (JSON error object or plain text)
/// * `operation` - Table or procedure name, recorded in the context
pub fn map_backend_error(status: u16, body: &str, operation: &str) -> RepositoryError {
    let parsed: BackendErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body.trim()));

    let mut context = ErrorContext::new(operation);
    if let Some(code) = parsed.code.clone() {
        context = context.with_code(code);
    }
    match (parsed.details, parsed.hint) {
        (Some(details), Some(hint)) => context = context.with_details(format!("{} ({})", details, hint)),
        (Some(details), None) => context = context.with_details(details),
        (None, Some(hint)) => context = context.with_details(hint),
        (None, None) => {}
    }

    let code = parsed.code.as_deref().unwrap_or("");
    if code == "PGRST116" || status == 404 {
        return RepositoryError::not_found_with_context(message, context);
    }
    if code.starts_with("23") || code.starts_with("22") {
        return RepositoryError::validation_with_context(message, context);
    }
    if code == "P0001" {
        return RepositoryError::TransactionError { message, context };
    }
    if status >= 500 {
        let context = if context.code.is_none() {
            context.with_code("NETWORK_ERROR")
        } else {
            context
        };
        return RepositoryError::connection_with_context(message, context);
    }
    if matches!(status, 400 | 409 | 422) && code.is_empty() {
        return RepositoryError::validation_with_context(message, context);
    }
    RepositoryError::query_with_context(message, context)
}

/// Repository backed by the hosted PostgREST API.
#[derive(Clone)]
pub struct RestRepository {
    client: reqwest::Client,
    config: RestConfig,
}

impl RestRepository {
    /// Create a repository; no request is made until the first call.
    pub fn new(config: RestConfig) -> RepositoryResult<Self> {
        config.validate().map_err(RepositoryError::configuration)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                RepositoryError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;
        log::info!("REST repository configured for {}", config.rest_base());
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.rest_base(), path);
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.config.bearer())
            .header("Content-Type", "application/json")
    }

    async fn check(response: Response, operation: &str) -> RepositoryResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = map_backend_error(status.as_u16(), &body, operation);
        log::warn!("Backend call {} failed: {}", operation, err);
        Err(err)
    }

    async fn json_or_null(response: Response) -> RepositoryResult<Value> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &QueryBuilder,
    ) -> RepositoryResult<Vec<T>> {
        log::debug!("GET {}?{}", table, query.render());
        let response = self
            .request(Method::GET, table)
            .query(&query.pairs())
            .send()
            .await?;
        let response = Self::check(response, table).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    pub(crate) async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: QueryBuilder,
    ) -> RepositoryResult<T> {
        self.select(table, &query.limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("No row in {}", table),
                    ErrorContext::new(table).with_entity(table).with_code("PGRST116"),
                )
            })
    }

    pub(crate) async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> RepositoryResult<T> {
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check(response, table).await?;
        let rows: Vec<T> = response.json().await?;
        rows.into_iter().next().ok_or_else(|| {
            RepositoryError::internal_with_context(
                "Insert returned no rows",
                ErrorContext::new(table).with_entity(table),
            )
        })
    }

    pub(crate) async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &QueryBuilder,
        body: &B,
    ) -> RepositoryResult<Vec<T>> {
        let response = self
            .request(Method::PATCH, table)
            .query(&query.pairs())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check(response, table).await?;
        Ok(response.json().await?)
    }

    /// PATCH a single row by id and return it.
    pub(crate) async fn update_by_id<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        id: impl std::fmt::Display,
        body: &B,
    ) -> RepositoryResult<T> {
        let id = id.to_string();
        self.update(table, &QueryBuilder::new().eq("id", &id), body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("{} {} not found", table, id),
                    ErrorContext::new("update")
                        .with_entity(table)
                        .with_entity_id(id)
                        .with_code("PGRST116"),
                )
            })
    }

    /// DELETE a single row by id; missing rows are reported as NotFound.
    pub(crate) async fn delete_by_id(
        &self,
        table: &str,
        id: impl std::fmt::Display,
    ) -> RepositoryResult<()> {
        let id = id.to_string();
        let query = QueryBuilder::new().select("id").eq("id", &id);
        let response = self
            .request(Method::DELETE, table)
            .query(&query.pairs())
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let response = Self::check(response, table).await?;
        let deleted: Vec<Value> = response.json().await?;
        if deleted.is_empty() {
            return Err(RepositoryError::not_found_with_context(
                format!("{} {} not found", table, id),
                ErrorContext::new("delete")
                    .with_entity(table)
                    .with_entity_id(id)
                    .with_code("PGRST116"),
            ));
        }
        Ok(())
    }

    /// Invoke a stored procedure and return its raw JSON result.
    pub(crate) async fn rpc_value<B: Serialize + ?Sized>(
        &self,
        name: &str,
        args: &B,
    ) -> RepositoryResult<Value> {
        log::debug!("RPC {}", name);
        let response = self
            .request(Method::POST, &format!("rpc/{}", name))
            .json(args)
            .send()
            .await?;
        let response = Self::check(response, name).await?;
        Self::json_or_null(response)
            .await
            .map_err(|e| e.with_operation(name))
    }

    pub(crate) async fn rpc<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        name: &str,
        args: &B,
    ) -> RepositoryResult<T> {
        let value = self.rpc_value(name, args).await?;
        serde_json::from_value(value).map_err(|e| RepositoryError::from(e).with_operation(name))
    }
}

/// Interpret a procedure result that signals success as a bare boolean, as
/// `{success: bool}` or as nothing at all.
pub(crate) fn success_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => true,
        Value::Object(map) => map.get("success").and_then(Value::as_bool).unwrap_or(true),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unique_violation_maps_to_validation() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":"Key (policy_number)=(1) already exists.","hint":null}"#;
        let err = map_backend_error(409, body, "apolices");
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.code(), Some("23505"));
        assert_eq!(err.context().operation.as_deref(), Some("apolices"));
    }

    #[test]
    fn test_single_row_miss_maps_to_not_found() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(matches!(
            map_backend_error(406, body, "clientes"),
            RepositoryError::NotFound { .. }
        ));
    }

    #[test]
    fn test_server_errors_are_retryable_connection_errors() {
        let err = map_backend_error(503, "upstream unavailable", "rpc");
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.code(), Some("NETWORK_ERROR"));
        assert!(err.message().contains("upstream unavailable"));
    }

    #[test]
    fn test_raise_exception_maps_to_transaction_error() {
        let body = r#"{"code":"P0001","message":"Conta de sistema não pode ser arquivada"}"#;
        let err = map_backend_error(400, body, "archive_financial_account");
        assert!(matches!(err, RepositoryError::TransactionError { .. }));
        assert_eq!(err.message(), "Conta de sistema não pode ser arquivada");
    }

    #[test]
    fn test_success_flag_shapes() {
        assert!(success_flag(&Value::Null));
        assert!(!success_flag(&json!(false)));
        assert!(!success_flag(&json!({"success": false, "error": "x"})));
        assert!(success_flag(&json!({"id": "abc"})));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(
            RestRepository::new(RestConfig::default()),
            Err(RepositoryError::ConfigurationError { .. })
        ));
    }
}
