//! HTTP client for the Porter/PaleAle prediction service.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::watch;
use tokio::time::Instant;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{PredictionError, PredictionResult};
use crate::prediction::Prediction;
use crate::scrape;

const USER_AGENT_VALUE: &str = concat!("porter-client/", env!("CARGO_PKG_VERSION"));

/// The service's answer to a submitted query.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Final URL after redirects, used to resolve relative links.
    pub url: Url,
    pub body: String,
}

/// Client for submitting sequences and collecting predictions.
///
/// Holds no per-query state, so a single client can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: reqwest::Client,
    endpoint: Url,
    config: ClientConfig,
}

impl PredictionClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> PredictionResult<Self> {
        let endpoint = config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| PredictionError::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submits `sequence`, waits for the job and returns the parsed prediction.
    pub async fn predict(&self, sequence: &str) -> PredictionResult<Prediction> {
        self.run(sequence, None).await
    }

    /// Like `predict`, but stops with `PredictionError::Cancelled` as soon as `true` is sent
    /// on the `cancel` channel.
    pub async fn predict_cancellable(
        &self,
        sequence: &str,
        cancel: watch::Receiver<bool>,
    ) -> PredictionResult<Prediction> {
        self.run(sequence, Some(cancel)).await
    }

    async fn run(
        &self,
        sequence: &str,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> PredictionResult<Prediction> {
        info!("Submitting query of {} residues", sequence.chars().count());
        let Some(submitted) = until_cancelled(self.submit(sequence), cancel.as_mut()).await else {
            return Err(PredictionError::Cancelled { attempts: 0 });
        };
        let response = submitted?;

        let result_url = self.result_url(&response)?;
        info!("Results will be available at {result_url}");

        let prediction = self.poll(&result_url, self.config.wait, cancel).await?;

        if !same_residues(prediction.sequence(), sequence) {
            warn!("Sequence echoed by the service differs from the submitted sequence");
        }

        Ok(prediction)
    }

    /// POSTs the query to the endpoint.
    ///
    /// # Errors
    ///
    /// * `PredictionError::Network` if the request could not be sent or read.
    /// * `PredictionError::Submission` if the service answers with a non-success status.
    pub async fn submit(&self, sequence: &str) -> PredictionResult<RawResponse> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[(scrape::INPUT_FIELD, scrape::query_payload(sequence))])
            .send()
            .await?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PredictionError::Submission {
                status: status.as_u16(),
                body,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            url,
            body,
        })
    }

    /// Finds the job page in a submission response, resolving relative links against the URL
    /// the response came from.
    pub fn result_url(&self, response: &RawResponse) -> PredictionResult<Url> {
        let link = scrape::extract_result_link(&response.body)?;

        response.url.join(&link).map_err(|e| {
            PredictionError::malformed(format!("result link '{link}' is not a valid URL: {e}"))
        })
    }

    /// Polls `url` every `wait` until the page reports completion, then parses it.
    ///
    /// Polling is bounded by the configured `max_wait` and `max_attempts`.
    pub async fn poll_until_complete(
        &self,
        url: &Url,
        wait: Duration,
    ) -> PredictionResult<Prediction> {
        self.poll(url, wait, None).await
    }

    /// Like `poll_until_complete`, but also stops when `true` is sent on `cancel`.
    pub async fn poll_until_complete_cancellable(
        &self,
        url: &Url,
        wait: Duration,
        cancel: watch::Receiver<bool>,
    ) -> PredictionResult<Prediction> {
        self.poll(url, wait, Some(cancel)).await
    }

    async fn poll(
        &self,
        url: &Url,
        wait: Duration,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> PredictionResult<Prediction> {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut failures = 0u32;

        loop {
            if attempts > 0 || !self.config.eager_first_fetch {
                // never sleep past the deadline
                let delay = match self.config.max_wait {
                    Some(max) => wait.min(max.saturating_sub(started.elapsed())),
                    None => wait,
                };

                if until_cancelled(tokio::time::sleep(delay), cancel.as_mut())
                    .await
                    .is_none()
                {
                    return Err(PredictionError::Cancelled { attempts });
                }

                if let Some(max) = self.config.max_wait {
                    if started.elapsed() >= max {
                        return Err(PredictionError::Timeout {
                            attempts,
                            elapsed: started.elapsed(),
                        });
                    }
                }
            }

            attempts += 1;
            debug!("GET {url} (attempt {attempts})");

            let Some(fetched) = until_cancelled(self.fetch(url), cancel.as_mut()).await else {
                return Err(PredictionError::Cancelled { attempts });
            };

            match fetched {
                Ok(text) if scrape::is_complete(&text) => {
                    info!("Prediction complete after {attempts} attempts");
                    return scrape::parse_result_block(&text);
                }
                Ok(_) => {
                    failures = 0;
                    debug!("Job not complete yet");
                }
                Err(e) if failures < self.config.fetch_retries => {
                    failures += 1;
                    warn!(
                        "Fetch failed ({failures}/{}), retrying: {e}",
                        self.config.fetch_retries
                    );
                }
                Err(e) => return Err(e),
            }

            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(PredictionError::Timeout {
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
            }
        }
    }

    /// Fetches the result page once.
    async fn fetch(&self, url: &Url) -> PredictionResult<String> {
        let fetch_error = |status: Option<u16>, message: String| PredictionError::Fetch {
            url: url.to_string(),
            status,
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.to_string());
            return Err(fetch_error(Some(status.as_u16()), message));
        }

        response
            .text()
            .await
            .map_err(|e| fetch_error(Some(status.as_u16()), e.to_string()))
    }
}

/// Runs `fut` to completion unless `true` arrives on `cancel` first, in which case `None` is
/// returned. A dropped sender means no cancellation can arrive any more.
async fn until_cancelled<F: Future>(
    fut: F,
    cancel: Option<&mut watch::Receiver<bool>>,
) -> Option<F::Output> {
    let Some(cancel) = cancel else {
        return Some(fut.await);
    };

    if *cancel.borrow_and_update() {
        return None;
    }

    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            changed = cancel.changed() => {
                if changed.is_err() {
                    return Some(fut.await);
                }
                if *cancel.borrow_and_update() {
                    return None;
                }
            }
        }
    }
}

/// Compares sequences ignoring case and whitespace, which the service may normalise.
fn same_residues(echoed: &str, submitted: &str) -> bool {
    let normalise = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect::<String>()
    };
    normalise(echoed) == normalise(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_residues_ignores_case_and_whitespace() {
        assert!(same_residues("MKVLA", "mkv la"));
        assert!(!same_residues("MKVLA", "MKVLG"));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ClientConfig::default().with_endpoint("::nope::");
        assert!(matches!(
            PredictionClient::new(config),
            Err(PredictionError::Config { .. })
        ));
    }

    #[test]
    fn relative_links_are_resolved() {
        let client = PredictionClient::new(ClientConfig::default()).unwrap();
        let response = RawResponse {
            status: 200,
            url: Url::parse("http://host/cgi-bin/predict").unwrap(),
            body: r#"<a href="../results/42.txt">results</a>"#.to_string(),
        };
        assert_eq!(
            client.result_url(&response).unwrap().as_str(),
            "http://host/results/42.txt"
        );
    }

    #[tokio::test]
    async fn cancellation_before_start() {
        let (tx, mut rx) = watch::channel(true);
        let out = until_cancelled(async { 1 }, Some(&mut rx)).await;
        assert_eq!(out, None);
        drop(tx);
    }

    #[tokio::test]
    async fn dropped_sender_does_not_cancel() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        let out = until_cancelled(
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                7
            },
            Some(&mut rx),
        )
        .await;
        assert_eq!(out, Some(7));
    }
}
