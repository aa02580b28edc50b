//! Error types for the prediction client.

use std::time::Duration;

/// Longest response body excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Prediction errors.
///
/// Each variant is a distinct failure of the submit-poll-parse interaction, so callers can
/// tell "service rejected input" apart from "service never finished" and "service returned
/// garbage".
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// The query POST returned a non-success status.
    #[error("could not submit query (HTTP {status}): {}", excerpt(.body))]
    Submission { status: u16, body: String },

    /// The query POST did not complete at the transport level.
    #[error("network error while contacting {url}: {message}")]
    Network { url: String, message: String },

    /// The submission response carried no hyperlink to the job page.
    #[error("no result link found in submission response")]
    LinkNotFound,

    /// Fetching the result page failed while polling.
    #[error("could not fetch results from {url}{}: {message}", status_suffix(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Polling ran out of time or attempts before the job completed.
    #[error("prediction did not complete after {attempts} attempts ({:.1}s)", .elapsed.as_secs_f64())]
    Timeout { attempts: u32, elapsed: Duration },

    /// The caller asked for polling to stop.
    #[error("polling cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// The completed result page did not contain a well-formed result block.
    #[error("malformed result: {reason}")]
    MalformedResult { reason: String },

    /// The client configuration is unusable.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl PredictionError {
    /// Exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 1,

            // the service refused the query
            Self::Submission { .. } => 2,
            Self::LinkNotFound => 3,

            // transient, the service may answer later
            Self::Network { .. } => 4,
            Self::Fetch { .. } => 4,
            Self::Timeout { .. } => 5,

            Self::MalformedResult { .. } => 6,
            Self::Cancelled { .. } => 130,
        }
    }

    /// Whether the same query could succeed if tried again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Fetch { .. } | Self::Timeout { .. }
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResult {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            url: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: err.to_string(),
        }
    }
}

/// Result type for prediction operations.
pub type PredictionResult<T> = Result<T, PredictionError>;

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "<empty body>".to_string();
    }
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}
