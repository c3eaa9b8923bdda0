//! Error types for the analysis pipeline and its collaborators.
//!
//! Classifier errors never leave the pipeline: they are recovered by falling
//! back to the heuristic scorer and only show up in logs and in
//! [`crate::api::FallbackReason`]. The other enums surface at the CLI edge.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the external classifier call and of reply validation.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model service returned no text")]
    EmptyResponse,

    #[error("malformed JSON in model reply: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("schema violation in `{field}`: {reason}")]
    SchemaValidation { field: &'static str, reason: String },

    #[error("invalid model endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Rejections of caller-supplied input, raised before the pipeline runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid date `{value}`: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("article {id} not found")]
    NotFound { id: u64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors returned by [`crate::pipeline::Pipeline`] operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
