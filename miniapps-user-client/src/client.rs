//! Authenticated profile fetch with timeout and error normalization.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ConfigError, FetchError, UNKNOWN_ERROR};
use crate::profile::{ApiEnvelope, UserProfile};

/// Per-call timeout applied when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const PROFILE_PATH: &[&str] = &["api", "miniapps-user", "profile"];
const CLIENT_USER_AGENT: &str = concat!("miniapps-user-client/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call options. Never persisted by the client.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Cancellation deadline for the whole call, send through body read.
    pub timeout: Duration,
    /// Headers overlaid on the defaults; a matching name replaces the
    /// default, nothing is ever removed.
    pub extra_headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            extra_headers: Vec::new(),
        }
    }
}

/// Successful fetch payload plus any message the server attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub message: Option<String>,
}

/// The single fetch operation behind the client, abstracted so consumers
/// (and their tests) can stand in for the HTTP transport.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(
        &self,
        user_id: &str,
        options: RequestOptions,
    ) -> Result<ProfileResponse, FetchError>;
}

/// Handle owning the bearer token and base endpoint.
///
/// Cheap to clone; the underlying connection pool is shared and the
/// configuration is read-only after construction, so one client can serve
/// any number of concurrent callers.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl Client {
    /// Build a client from a validated configuration.
    ///
    /// Fails when the token is empty, the endpoint does not parse, or the
    /// HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let base = config.validate()?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(CLIENT_USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base,
            token: config.token,
        })
    }

    /// Base URL requests are issued against.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// Fetch a user profile.
    ///
    /// Exactly one network attempt per call, no retries. Every failure mode
    /// resolves to a [`FetchError`]; the future itself never panics.
    pub async fn fetch_user_profile(
        &self,
        user_id: &str,
        options: RequestOptions,
    ) -> Result<ProfileResponse, FetchError> {
        if user_id.is_empty() {
            return Err(FetchError::MissingUserId);
        }

        let url = profile_url(&self.base, user_id)?;
        let headers = build_headers(&self.token, &options.extra_headers)?;

        debug!(%url, timeout_ms = options.timeout.as_millis() as u64, "fetching user profile");

        let call = self.execute(url.clone(), headers);
        match tokio::time::timeout(options.timeout, call).await {
            Ok(result) => {
                if let Err(err) = &result {
                    warn!(%url, error = %err, "profile fetch failed");
                }
                result
            }
            Err(_) => {
                // The elapsed timer drops the in-flight request future,
                // which cancels the call.
                warn!(%url, timeout_ms = options.timeout.as_millis() as u64, "profile fetch timed out");
                Err(FetchError::Timeout)
            }
        }
    }

    async fn execute(
        &self,
        url: Url,
        headers: HeaderMap,
    ) -> Result<ProfileResponse, FetchError> {
        let response = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|err| FetchError::transport(&err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::transport(&err))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let envelope: ApiEnvelope<UserProfile> =
            serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))?;

        match envelope {
            ApiEnvelope {
                success: true,
                data: Some(profile),
                message,
            } => Ok(ProfileResponse { profile, message }),
            ApiEnvelope { message, .. } => Err(FetchError::Rejected {
                message: message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            }),
        }
    }
}

#[async_trait]
impl ProfileFetcher for Client {
    async fn fetch_profile(
        &self,
        user_id: &str,
        options: RequestOptions,
    ) -> Result<ProfileResponse, FetchError> {
        self.fetch_user_profile(user_id, options).await
    }
}

/// Append the profile path to the base endpoint, encoding the user id as a
/// single path segment.
fn profile_url(base: &Url, user_id: &str) -> Result<Url, FetchError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| FetchError::Transport(format!("endpoint {base} cannot carry a path")))?;
        segments.pop_if_empty();
        segments.extend(PROFILE_PATH.iter().copied());
        segments.push(user_id);
    }
    Ok(url)
}

/// Default headers with caller overlays applied by name.
fn build_headers(token: &str, extra: &[(String, String)]) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|err| FetchError::Transport(format!("invalid bearer token: {err}")))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| FetchError::Transport(format!("invalid header name {name:?}: {err}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            FetchError::Transport(format!("invalid value for header {name:?}: {err}"))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Map a non-2xx response to a failure, preferring the server's message over
/// a synthesized `HTTP <status>: <reason>` string.
fn status_error(status: StatusCode, body: &[u8]) -> FetchError {
    #[derive(serde::Deserialize)]
    struct FailureBody {
        message: Option<String>,
    }

    let server_message = serde_json::from_slice::<FailureBody>(body)
        .ok()
        .and_then(|body| body.message);

    let message = server_message.unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    });

    FetchError::Status { status, message }
}
