//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::accounts::Role;
use crate::error::ConfigError;

/// Default API base URL for a local back end.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Client configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the marketplace API, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token attached to every request.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Currency code sent with payment initialization.
    pub currency: String,
    /// Role override for the terminal front end (normally taken from whoami).
    pub role_override: Option<Role>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            currency: "NGN".to_string(),
            role_override: None,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url`, everything else default.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(&base_url.into())?,
            ..Self::default()
        })
    }

    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("PAESHIFT_API_BASE_URL")
            .map(|raw| normalize_base_url(&raw))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_token = lookup("PAESHIFT_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let request_timeout = match lookup("PAESHIFT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PAESHIFT_REQUEST_TIMEOUT_SECS".into(),
                    message: format!("expected whole seconds, got {raw:?}"),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(30),
        };

        let currency = lookup("PAESHIFT_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "NGN".to_string());

        let role_override = match lookup("PAESHIFT_ROLE") {
            Some(raw) => Some(raw.parse::<Role>().map_err(|message| {
                ConfigError::InvalidValue {
                    key: "PAESHIFT_ROLE".into(),
                    message,
                }
            })?),
            None => None,
        };

        Ok(Self {
            base_url,
            api_token,
            request_timeout,
            currency,
            role_override,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: "PAESHIFT_API_BASE_URL".into(),
            message: format!("expected an http(s) URL, got {raw:?}"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_token.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.currency, "NGN");
        assert!(config.role_override.is_none());
    }

    #[test]
    fn reads_all_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PAESHIFT_API_BASE_URL", "https://api.example.com/"),
            ("PAESHIFT_API_TOKEN", "tok-123"),
            ("PAESHIFT_REQUEST_TIMEOUT_SECS", "5"),
            ("PAESHIFT_CURRENCY", "usd"),
            ("PAESHIFT_ROLE", "client"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.api_token.unwrap().expose_secret(), "tok-123");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.currency, "USD");
        assert_eq!(config.role_override, Some(Role::Client));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[("PAESHIFT_API_BASE_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PAESHIFT_API_BASE_URL"));
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("PAESHIFT_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("PAESHIFT_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn rejects_unknown_role() {
        let err = ClientConfig::from_lookup(lookup(&[("PAESHIFT_ROLE", "admin")])).unwrap_err();
        assert!(err.to_string().contains("PAESHIFT_ROLE"));
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[("PAESHIFT_API_TOKEN", "  ")])).unwrap();
        assert!(config.api_token.is_none());
    }
}
