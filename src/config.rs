use std::time::Duration;

use url::Url;

use crate::error::{PredictionError, PredictionResult};

/// The Porter/PaleAle 4.0 submission CGI.
pub const DEFAULT_ENDPOINT: &str =
    "http://distillf.ucd.ie/~distill/cgi-bin/distill/predict_porterpaleale";

/// Settings for a `PredictionClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Where queries are POSTed.
    pub endpoint: String,

    /// Delay before each fetch of the result page.
    pub wait: Duration,

    /// Give up polling after this long. `None` polls until completion or cancellation.
    pub max_wait: Option<Duration>,

    /// Give up polling after this many fetches.
    pub max_attempts: Option<u32>,

    /// Consecutive failed fetches tolerated while polling before giving up.
    pub fetch_retries: u32,

    /// Fetch once before the first delay instead of after it.
    pub eager_first_fetch: bool,

    /// Timeout for each individual HTTP request.
    pub request_timeout: Duration,
}

fn default_wait() -> Duration {
    Duration::from_secs(2)
}

fn default_max_wait() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            wait: default_wait(),
            max_wait: default_max_wait(),
            max_attempts: None,
            fetch_retries: 0,
            eager_first_fetch: false,
            request_timeout: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_fetch_retries(mut self, fetch_retries: u32) -> Self {
        self.fetch_retries = fetch_retries;
        self
    }

    pub fn with_eager_first_fetch(mut self, eager: bool) -> Self {
        self.eager_first_fetch = eager;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Checks the configuration and returns the parsed endpoint.
    ///
    /// # Errors
    ///
    /// Returns `PredictionError::Config` if the endpoint is not an absolute http(s) URL, if
    /// `max_attempts` is zero, if the request timeout is zero, or if `wait` is zero while
    /// polling is unbounded.
    pub fn validate(&self) -> PredictionResult<Url> {
        let endpoint = Url::parse(&self.endpoint).map_err(|e| PredictionError::Config {
            message: format!("invalid endpoint '{}': {e}", self.endpoint),
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(PredictionError::Config {
                message: format!("endpoint must be http or https, got '{}'", endpoint.scheme()),
            });
        }

        if self.max_attempts == Some(0) {
            return Err(PredictionError::Config {
                message: "max_attempts must be at least 1".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(PredictionError::Config {
                message: "request timeout must be greater than zero".to_string(),
            });
        }

        if self.max_wait.is_none() && self.max_attempts.is_none() {
            if self.wait.is_zero() {
                return Err(PredictionError::Config {
                    message: "a zero wait needs max_wait or max_attempts to bound polling"
                        .to_string(),
                });
            }
            warn!("Polling is unbounded; only cancellation will stop an unfinished job");
        }

        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.wait, Duration::from_secs(2));
        assert_eq!(config.fetch_retries, 0);
        assert!(!config.eager_first_fetch);
        assert!(config.max_wait.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::default()
            .with_endpoint("http://127.0.0.1:8080/predict")
            .with_wait(Duration::from_millis(10))
            .with_max_wait(None)
            .with_max_attempts(Some(5))
            .with_fetch_retries(2)
            .with_eager_first_fetch(true);

        assert_eq!(config.wait, Duration::from_millis(10));
        assert_eq!(config.max_attempts, Some(5));
        assert_eq!(config.fetch_retries, 2);
        assert!(config.eager_first_fetch);

        let url = config.validate().unwrap();
        assert_eq!(url.path(), "/predict");
    }

    #[test]
    fn rejects_bad_endpoints() {
        let bad = ClientConfig::default().with_endpoint("not a url");
        assert!(matches!(bad.validate(), Err(PredictionError::Config { .. })));

        let ftp = ClientConfig::default().with_endpoint("ftp://example.org/predict");
        assert!(matches!(ftp.validate(), Err(PredictionError::Config { .. })));
    }

    #[test]
    fn rejects_zero_wait_without_bound() {
        let config = ClientConfig::default()
            .with_wait(Duration::ZERO)
            .with_max_wait(None);
        assert!(matches!(config.validate(), Err(PredictionError::Config { .. })));

        // any bound makes a zero wait acceptable
        assert!(config.clone().with_max_attempts(Some(3)).validate().is_ok());
        assert!(config
            .with_max_wait(Some(Duration::from_secs(1)))
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_zero_attempts() {
        let config = ClientConfig::default().with_max_attempts(Some(0));
        assert!(config.validate().is_err());
    }
}
