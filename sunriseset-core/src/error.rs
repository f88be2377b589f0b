//! Causes of a failed fetch.
//!
//! These never reach the screen: the fetcher logs them and reports the event
//! as absent.

use thiserror::Error;

use crate::model::EventKind;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server answered with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response has no `results` object")]
    MissingResults,

    #[error("Response has no `{0}` field")]
    MissingField(EventKind),

    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}
