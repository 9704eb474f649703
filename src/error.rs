//! Error types shared by the taps and the target

use reqwest::StatusCode;
use thiserror::Error;

/// Classification for the HTTP retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Transient failure: rate limit, server error, timeout. Retry with backoff.
    Retry,
    /// Terminal failure: bad request, auth, decode. Retrying won't help.
    Fatal,
}

/// Errors raised while extracting data from an upstream API.
#[derive(Debug, Error)]
pub enum TapError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    /// Response body was not the JSON we expected
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// All retry attempts exhausted
    #[error("giving up on {url} after {tries} tries: {last}")]
    RetriesExhausted {
        url: String,
        tries: u32,
        #[source]
        last: Box<TapError>,
    },

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),

    /// State file could not be read or parsed
    #[error("state error: {0}")]
    State(String),

    /// A stream's embedded JSON schema failed to parse
    #[error("schema error for stream {stream}: {source}")]
    Schema {
        stream: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TapError {
    /// How the retry loop should respond to this error.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            TapError::Transport { source, .. } => {
                if source.is_timeout() || source.is_connect() {
                    RetryClass::Retry
                } else {
                    RetryClass::Fatal
                }
            }
            TapError::Status { status, .. } => {
                if *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    RetryClass::Retry
                } else {
                    RetryClass::Fatal
                }
            }
            _ => RetryClass::Fatal,
        }
    }
}

/// Errors raised while loading records into the search index.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Malformed Singer input on stdin
    #[error("invalid Singer message on line {line}: {source}")]
    Protocol {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A RECORD arrived for a stream with no preceding SCHEMA
    #[error("record for unknown stream `{0}` (no SCHEMA seen)")]
    UnknownStream(String),

    /// The index mapping file has no entry for a stream
    #[error("index for stream `{0}` was not found in the index mapping")]
    UnmappedStream(String),

    /// A record is missing one of its primary-key attributes
    #[error("record in stream `{stream}` is missing key attribute `{attribute}`")]
    MissingKeyAttribute { stream: String, attribute: String },

    /// Index mapping file could not be read or parsed
    #[error("index mapping error: {0}")]
    Mapping(String),

    /// The search index rejected a call
    #[error("search index error: {0}")]
    Index(String),

    /// Underlying extraction error (shared HTTP plumbing)
    #[error(transparent)]
    Tap(#[from] TapError),
}
