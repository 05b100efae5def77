//! Client configuration and endpoint normalization.

use url::Url;

use crate::error::ConfigError;

/// API host used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.miniapps.dev";

/// Environment variable that overrides the default endpoint.
pub const ENDPOINT_ENV_VAR: &str = "MINIAPPS_USER_ENDPOINT";

/// Immutable configuration for a [`Client`](crate::Client).
///
/// Endpoint resolution order: explicit [`ClientConfig::with_endpoint`], the
/// `MINIAPPS_USER_ENDPOINT` environment variable, then [`DEFAULT_ENDPOINT`].
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) token: String,
    pub(crate) endpoint: String,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: default_endpoint(),
        }
    }

    /// Override the endpoint for this configuration.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Validate the token and normalize the endpoint into a base URL.
    pub(crate) fn validate(&self) -> Result<Url, ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        normalize_endpoint(&self.endpoint)
    }
}

fn default_endpoint() -> String {
    std::env::var(ENDPOINT_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

/// Parse the endpoint and force HTTPS for any non-loopback host.
///
/// Loopback hosts keep their scheme so local servers stay reachable over
/// plain HTTP during development and testing.
pub(crate) fn normalize_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "endpoint is empty".to_string(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|err| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })?;

    if url.scheme() != "https" && !is_loopback(&url) {
        url.set_scheme("https")
            .map_err(|_| ConfigError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("scheme {:?} cannot be upgraded to https", url.scheme()),
            })?;
    }

    Ok(url)
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn forces_https_for_public_hosts() {
        let url = normalize_endpoint("http://api.example.com").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn keeps_scheme_for_loopback_hosts() {
        let url = normalize_endpoint("http://127.0.0.1:9090").unwrap();
        assert_eq!(url.scheme(), "http");

        let url = normalize_endpoint("http://localhost:9090").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn assumes_https_when_scheme_is_missing() {
        let url = normalize_endpoint("api.example.com").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn trims_trailing_slashes() {
        let url = normalize_endpoint("https://api.example.com///").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn rejects_unparseable_endpoints() {
        let err = normalize_endpoint("https://").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn blank_token_fails_validation() {
        let config = ClientConfig::new("   ");
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));
    }
}
