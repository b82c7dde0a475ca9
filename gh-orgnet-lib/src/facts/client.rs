//! GitHub REST API client
//!
//! Issues authenticated GET requests, keeps the API quota in check, and classifies
//! responses into pages or errors the collector can act upon.

use crate::facts::Progress;
use crate::facts::quota::{QuotaTracker, RateLimitInfo, parse_retry_after};
use crate::facts::resilient_http::{DEFAULT_REQUEST_TIMEOUT, RetryPolicy, SendError, resilient_get};
use chrono::{DateTime, Utc};
use core::fmt::{Debug, Display, Formatter};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LINK};
use serde_json::Value;
use std::sync::Arc;

const LOG_TARGET: &str = "    client";

/// Base URL of the public GitHub REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Largest page size GitHub accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Default upper bound on a single wait for the quota to reset.
pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(3600);

const USER_AGENT: &str = "gh-orgnet";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Consecutive rate-limit rejections tolerated for a single request.
const MAX_RATE_LIMIT_ROUNDS: u32 = 10;

/// Assumed quota window when a rate-limit rejection carries no reset information.
const FALLBACK_RATE_LIMIT_SECS: i64 = 60;

/// User name and personal access token presented with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    user: String,
    token: String,
}

impl Credential {
    #[must_use]
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Tunables for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub per_page: u32,
    pub retry: RetryPolicy,
    pub max_rate_limit_wait: Duration,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: MAX_PER_PAGE,
            retry: RetryPolicy::default(),
            max_rate_limit_wait: DEFAULT_MAX_RATE_LIMIT_WAIT,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Why a request did not produce a page.
#[derive(Debug)]
pub enum FetchError {
    /// The credential was rejected. Fatal for the whole run.
    Unauthorized { status: u16, url: String },

    /// The request failed for good. Fatal only for the unit being scraped.
    Http {
        status: Option<u16>,
        url: String,
        source: ohno::AppError,
    },
}

impl FetchError {
    pub(crate) fn http(url: &str, status: Option<StatusCode>, source: ohno::AppError) -> Self {
        Self::Http {
            status: status.map(|s| s.as_u16()),
            url: url.to_string(),
            source,
        }
    }

    fn from_send(url: &str, error: SendError) -> Self {
        let status = error.status();
        Self::http(url, status, app_err!("{error}"))
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unauthorized { status, url } => {
                write!(f, "GitHub rejected the credentials (HTTP {status}) for '{url}'")
            }
            Self::Http {
                status: Some(status),
                url,
                source,
            } => write!(f, "request to '{url}' failed (HTTP {status}): {source}"),
            Self::Http { status: None, url, source } => write!(f, "request to '{url}' failed: {source}"),
        }
    }
}

impl core::error::Error for FetchError {}

/// Whether the provider announced a page after the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// A `Link` header with `rel="next"` was present.
    Linked,

    /// A `Link` header was present without a `rel="next"` entry.
    Last,

    /// No `Link` header at all.
    Unknown,
}

/// One decoded response body.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub body: Value,
    pub next: NextPage,
}

impl Page {
    fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            body: Value::Null,
            next: NextPage::Unknown,
        }
    }
}

/// Rate-limited GitHub API client.
pub struct Client {
    http: reqwest::Client,
    credential: Credential,
    base_url: String,
    per_page: u32,
    retry: RetryPolicy,
    quota: QuotaTracker,
    progress: Option<Arc<dyn Progress>>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("per_page", &self.per_page)
            .field("retry", &self.retry)
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client presenting `credential` with every request.
    pub fn new(credential: Credential, options: ClientOptions) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .into_app_err("unable to create HTTP client")?;

        Ok(Self {
            http,
            credential,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            per_page: options.per_page.clamp(1, MAX_PER_PAGE),
            retry: options.retry,
            quota: QuotaTracker::new(options.max_rate_limit_wait),
            progress: None,
        })
    }

    /// Route rate-limit notices to `progress` when logging is turned off.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Absolute URL of an endpoint relative to the API base.
    #[must_use]
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Fetch a single non-paginated resource.
    pub async fn fetch_one(&self, endpoint: &str) -> Result<Value, FetchError> {
        Ok(self.fetch(endpoint, &[]).await?.body)
    }

    /// Fetch one page of `endpoint` with the given query parameters.
    ///
    /// Waits for the quota to reset when it is known to be exhausted, and transparently
    /// repeats requests that the server rejected because of its rate limit.
    pub async fn fetch(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Page, FetchError> {
        let url = self.url_for(endpoint);
        let mut rounds = 0;

        loop {
            self.wait_for_quota().await;

            log::debug!(target: LOG_TARGET, "GET {url} {query:?}");
            let response = resilient_get(
                || {
                    self.http
                        .get(&url)
                        .query(query)
                        .basic_auth(&self.credential.user, Some(&self.credential.token))
                },
                &self.retry,
            )
            .await
            .map_err(|e| FetchError::from_send(&url, e))?;

            let status = response.status();
            let headers = response.headers();
            if let Some(info) = RateLimitInfo::from_headers(headers) {
                self.quota.observe(info);
            }

            if status == StatusCode::NO_CONTENT {
                return Ok(Page::empty(&url));
            }

            if status.is_success() {
                return read_page(&url, response).await;
            }

            if let Some(reset_at) = rate_limit_reset(status, headers, Utc::now()) {
                rounds += 1;
                if rounds > MAX_RATE_LIMIT_ROUNDS {
                    return Err(FetchError::http(
                        &url,
                        Some(status),
                        app_err!("still rate limited after {MAX_RATE_LIMIT_ROUNDS} waits"),
                    ));
                }

                log::debug!(target: LOG_TARGET, "rate limited on '{url}' (HTTP {status}), round {rounds}");
                self.quota.mark_exhausted(reset_at);
                continue;
            }

            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(FetchError::Unauthorized {
                    status: status.as_u16(),
                    url,
                });
            }

            return Err(FetchError::http(&url, Some(status), app_err!("unexpected HTTP status {status}")));
        }
    }

    async fn wait_for_quota(&self) {
        let now = Utc::now();
        let Some(wait) = self.quota.pending_wait(now) else {
            return;
        };

        let resume_at = now + chrono::Duration::from_std(wait).unwrap_or_else(|_| chrono::Duration::zero());
        let formatted_time = resume_at.with_timezone(&chrono::Local).format("%T").to_string();
        log::warn!(target: LOG_TARGET, "GitHub API quota exhausted, waiting until {formatted_time}");
        if !log::log_enabled!(log::Level::Warn)
            && let Some(progress) = &self.progress
        {
            progress.println(&format!("GitHub rate limit exceeded: Waiting until {formatted_time}..."));
        }

        let _ = self.quota.wait_for_reset(now).await;
        log::info!(target: LOG_TARGET, "GitHub rate limit lifted, resuming requests");
    }
}

/// Decode a successful response into a page.
async fn read_page(url: &str, response: reqwest::Response) -> Result<Page, FetchError> {
    let status = response.status();
    let next = match response.headers().get(LINK).and_then(|h| h.to_str().ok()) {
        Some(link) if link.contains(r#"rel="next""#) => NextPage::Linked,
        Some(_) => NextPage::Last,
        None => NextPage::Unknown,
    };

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::http(url, Some(status), e.into()))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Page {
            next,
            ..Page::empty(url)
        });
    }

    let body = serde_json::from_slice(&bytes)
        .map_err(|e| FetchError::http(url, Some(status), app_err!("invalid JSON in response body: {e}")))?;

    Ok(Page {
        url: url.to_string(),
        body,
        next,
    })
}

/// When a rejected request may be repeated, if the rejection is due to the rate limit.
///
/// 429 is always a rate limit. 403 is one only when the quota is reported as exhausted
/// or the server asks to retry later; any other 403 is an authorization failure.
fn rate_limit_reset(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if !matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
        return None;
    }

    let fallback = now + chrono::Duration::seconds(FALLBACK_RATE_LIMIT_SECS);

    if let Some(secs) = parse_retry_after(headers) {
        let delay = i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds);
        return Some(delay.and_then(|d| now.checked_add_signed(d)).unwrap_or(fallback));
    }

    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    if remaining != Some(0) && status == StatusCode::FORBIDDEN {
        return None;
    }

    Some(RateLimitInfo::from_headers(headers).map_or(fallback, |info| info.reset_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::RETRY_AFTER;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn client(base_url: &str) -> Client {
        let options = ClientOptions {
            base_url: base_url.to_string(),
            ..ClientOptions::default()
        };
        Client::new(Credential::new("octocat", "ghp_secret"), options).unwrap()
    }

    #[test]
    fn test_credential_debug_hides_token() {
        let credential = Credential::new("octocat", "ghp_secret");
        let debug = format!("{credential:?}");
        assert!(debug.contains("octocat"));
        assert!(!debug.contains("ghp_secret"));
    }

    #[test]
    fn test_url_for() {
        let client = client("https://api.github.com/");
        assert_eq!(client.base_url(), "https://api.github.com");
        assert_eq!(client.url_for("orgs/acme/repos"), "https://api.github.com/orgs/acme/repos");
        assert_eq!(client.url_for("/users/octocat"), "https://api.github.com/users/octocat");
    }

    #[test]
    fn test_per_page_is_clamped() {
        let options = ClientOptions {
            per_page: 500,
            ..ClientOptions::default()
        };
        let client = Client::new(Credential::new("u", "t"), options).unwrap();
        assert_eq!(client.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn test_rate_limit_reset_exhausted_quota() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("2000"));

        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &headers, at(1000)), Some(at(2000)));
        assert_eq!(rate_limit_reset(StatusCode::TOO_MANY_REQUESTS, &headers, at(1000)), Some(at(2000)));
    }

    #[test]
    fn test_rate_limit_reset_prefers_retry_after() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("2000"));

        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &headers, at(1000)), Some(at(1030)));
    }

    #[test]
    fn test_rate_limit_reset_without_reset_header() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));

        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &headers, at(1000)), Some(at(1060)));
        assert_eq!(
            rate_limit_reset(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), at(1000)),
            Some(at(1060))
        );
    }

    #[test]
    fn test_plain_forbidden_is_not_rate_limit() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4000"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("2000"));

        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &headers, at(1000)), None);
        assert_eq!(rate_limit_reset(StatusCode::FORBIDDEN, &HeaderMap::new(), at(1000)), None);
    }

    #[test]
    fn test_other_statuses_are_not_rate_limit() {
        assert_eq!(rate_limit_reset(StatusCode::NOT_FOUND, &HeaderMap::new(), at(1000)), None);
        assert_eq!(rate_limit_reset(StatusCode::UNAUTHORIZED, &HeaderMap::new(), at(1000)), None);
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Unauthorized {
            status: 401,
            url: "https://api.github.com/orgs/acme/repos".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(
            err.to_string(),
            "GitHub rejected the credentials (HTTP 401) for 'https://api.github.com/orgs/acme/repos'"
        );

        let err = FetchError::http("https://x/y", Some(StatusCode::NOT_FOUND), app_err!("unexpected HTTP status 404 Not Found"));
        assert!(!err.is_unauthorized());
        assert!(err.to_string().starts_with("request to 'https://x/y' failed (HTTP 404)"));
    }
}
