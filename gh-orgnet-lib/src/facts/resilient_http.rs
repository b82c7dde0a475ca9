//! Resilient HTTP request utilities using exponential backoff.
//!
//! Wraps a GET request with [`backon`] retries so that transient network failures and
//! server errors are masked automatically.

use backon::{ExponentialBuilder, Retryable};
use core::fmt::{Display, Formatter};
use core::time::Duration;
use reqwest::StatusCode;

const LOG_TARGET: &str = "      http";

/// Default timeout for a single API request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on a single backoff delay, relative to the base delay.
const MAX_DELAY_FACTOR: u32 = 30;

/// How transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retry attempts (on top of the original request).
    pub max_retries: usize,

    /// Base delay for exponential backoff between retries.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Build the exponential backoff strategy for this policy.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.base_delay.saturating_mul(MAX_DELAY_FACTOR))
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Why a GET request could not produce a usable response.
#[derive(Debug)]
pub enum SendError {
    /// Connection, timeout, or body errors. Retried.
    Network(ohno::AppError),

    /// The server answered with a 5xx status. Retried.
    Server(StatusCode),

    /// The request could not even be built. Not retried.
    Invalid(ohno::AppError),
}

impl SendError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server(_))
    }

    /// The HTTP status behind the failure, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server(status) => Some(*status),
            Self::Network(_) | Self::Invalid(_) => None,
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::Invalid(error.into())
        } else {
            Self::Network(error.into())
        }
    }
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network error: {e}"),
            Self::Server(status) => write!(f, "server error: {status}"),
            Self::Invalid(e) => write!(f, "invalid request: {e}"),
        }
    }
}

/// Send an HTTP GET request with automatic retry.
///
/// `build` is called once per attempt. Network errors and 5xx responses are retried
/// with exponential backoff; every other response is handed back to the caller,
/// whatever its status.
pub async fn resilient_get<F>(build: F, policy: &RetryPolicy) -> Result<reqwest::Response, SendError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let attempt = || async {
        let response = build().send().await.map_err(SendError::from_reqwest)?;
        if response.status().is_server_error() {
            return Err(SendError::Server(response.status()));
        }
        Ok(response)
    };

    attempt
        .retry(policy.backoff())
        .when(SendError::is_transient)
        .notify(|err: &SendError, delay: Duration| {
            log::debug!(target: LOG_TARGET, "retrying HTTP GET after {err} (delay {}ms)", delay.as_millis());
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use backon::BackoffBuilder;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_is_bounded() {
        let policy = RetryPolicy {
            max_retries: 4,
            base_delay: Duration::from_millis(10),
        };
        let delays: Vec<_> = policy.backoff().build().collect();
        assert_eq!(delays.len(), 4);
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(10),
        };
        assert_eq!(policy.backoff().build().count(), 0);
    }

    #[test]
    fn test_server_error_is_transient() {
        let err = SendError::Server(StatusCode::BAD_GATEWAY);
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.to_string(), "server error: 502 Bad Gateway");
    }

    #[test]
    fn test_invalid_request_is_not_transient() {
        let err = SendError::Invalid(ohno::app_err!("bad url"));
        assert!(!err.is_transient());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_network_error_is_transient() {
        let err = SendError::Network(ohno::app_err!("connection reset"));
        assert!(err.is_transient());
        assert!(err.to_string().starts_with("network error"));
    }
}
