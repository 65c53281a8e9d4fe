/// Configuration for connecting to the hosted backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://xyz.example.co`
    pub url: String,
    /// Public API key sent as the `apikey` header
    pub anon_key: String,
    /// User JWT; falls back to the anon key when absent
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl RestConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `BACKEND_URL`: Base URL (required)
    /// - `BACKEND_ANON_KEY`: Public API key (required)
    /// - `BACKEND_ACCESS_TOKEN`: User token (optional)
    /// - `BACKEND_TIMEOUT_SECS`: Request timeout (default: 30)
    pub fn from_env() -> Result<Self, String> {
        let url = std::env::var("BACKEND_URL").map_err(|_| "BACKEND_URL must be set".to_string())?;
        let anon_key = std::env::var("BACKEND_ANON_KEY")
            .map_err(|_| "BACKEND_ANON_KEY must be set".to_string())?;
        let access_token = std::env::var("BACKEND_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        let timeout_secs = std::env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let config = Self {
            url,
            anon_key,
            access_token,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("Backend URL cannot be empty".to_string());
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(format!("Backend URL must be http(s): {}", self.url));
        }
        if self.anon_key.trim().is_empty() {
            return Err("Backend anon key cannot be empty".to_string());
        }
        Ok(())
    }

    /// `{url}/rest/v1`, without a trailing slash.
    pub fn rest_base(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }

    /// `{url}/auth/v1`, without a trailing slash.
    pub fn auth_base(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }

    /// Token used in the `Authorization` header.
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases_strip_trailing_slash() {
        let config = RestConfig {
            url: "https://demo.example.co/".into(),
            anon_key: "anon".into(),
            ..Default::default()
        };
        assert_eq!(config.rest_base(), "https://demo.example.co/rest/v1");
        assert_eq!(config.auth_base(), "https://demo.example.co/auth/v1");
        assert_eq!(config.bearer(), "anon");
    }

    #[test]
    fn test_validate_rejects_non_http_urls() {
        let config = RestConfig {
            url: "ftp://demo".into(),
            anon_key: "anon".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(RestConfig::default().validate().is_err());
    }
}
