//! Text anchors of the Porter/PaleAle web interface.
//!
//! Everything that depends on the exact markup of the remote service lives here, so a change
//! in its HTML template breaks this module and its fixture tests rather than the client.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{PredictionError, PredictionResult};
use crate::prediction::Prediction;

/// Header line of the single-record query format.
pub const SEQUENCE_HEADER: &str = ">Sequence";

/// Form field carrying the query.
pub const INPUT_FIELD: &str = "input_text";

/// Substring of the result page that marks a finished job.
pub const COMPLETION_MARKER: &str = "complete";

lazy_static! {
    /// Value of an `href` attribute, quoted or not.
    static ref HREF: Regex = Regex::new(r#"(?i)href\s*=\s*['"]?([^'"\s>]+)"#).unwrap();

    /// The block after `Query_length:` and a blank line, up to the next two blank lines.
    static ref RESULT_BLOCK: Regex = Regex::new(
        r"(?s)Query_length:.*?\n[ \t\r]*\n(.*?)(?:\n[ \t\r]*\n[ \t\r]*\n|\z)"
    )
    .unwrap();

    static ref QUERY_LENGTH: Regex = Regex::new(r"Query_length:\s*(\d+)").unwrap();
}

/// Wraps a sequence in the one-record format the service expects (`>Sequence\n<sequence>`).
///
/// The sequence is passed through verbatim; the service does its own validation.
pub fn query_payload(sequence: &str) -> String {
    format!("{SEQUENCE_HEADER}\n{sequence}")
}

/// Returns the first hyperlink target in the submission response body.
///
/// The service puts the job's status page first, so the first link wins. Any link that the
/// service adds ahead of it will be taken for the result page.
///
/// # Errors
///
/// Returns `PredictionError::LinkNotFound` if the body has no `href` attribute.
pub fn extract_result_link(body: &str) -> PredictionResult<String> {
    HREF.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|link| !link.is_empty())
        .ok_or(PredictionError::LinkNotFound)
}

/// Whether a fetched result page reports the job as finished.
pub fn is_complete(text: &str) -> bool {
    text.contains(COMPLETION_MARKER)
}

/// The residue count the service reports on the `Query_length:` line, if any.
pub fn declared_length(text: &str) -> Option<usize> {
    QUERY_LENGTH
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses the result block of a completed result page.
///
/// The block is expected to be exactly three lines: the sequence, the secondary structure and
/// the solvent accessibility, in that order.
///
/// # Errors
///
/// Returns `PredictionError::MalformedResult` if the anchor is missing, if the block does not
/// have exactly three lines, or if the lines differ in length.
pub fn parse_result_block(text: &str) -> PredictionResult<Prediction> {
    let block = RESULT_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| PredictionError::malformed("no result block after `Query_length:`"))?;

    let lines: Vec<&str> = block
        .trim_end()
        .split('\n')
        .map(|line| line.trim())
        .collect();

    let Some((sequence, structure, accessibility)) =
        lines.iter().copied().collect_tuple::<(&str, &str, &str)>()
    else {
        return Err(PredictionError::malformed(format!(
            "expected 3 lines in result block, found {}",
            lines.iter().filter(|l| !l.is_empty()).count()
        )));
    };

    let prediction = Prediction::new(sequence, structure, accessibility)?;

    if let Some(declared) = declared_length(text) {
        if declared != prediction.len() {
            warn!(
                "Service reported Query_length {declared} but returned {} residues",
                prediction.len()
            );
        }
    }

    Ok(prediction)
}
