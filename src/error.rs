//! Error types for each stage of the ingestion pipeline.
//!
//! Only [`SinkError`] and [`ConfigError`] ever reach `main` (a snapshot that
//! cannot be read back counts as a sink failure). The rest are
//! recovered where they happen: transport and parse failures degrade a single
//! source to an empty result, record failures drop a single record.

use crate::models::Source;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a raw payload from an upstream source.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} was not ready after {waited:?}")]
    RenderTimeout { url: String, waited: Duration },
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A payload arrived but did not have the structure its adapter expects.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected structural anchor `{0}` not found")]
    MissingAnchor(&'static str),
    #[error("feed xml could not be read: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("api payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single record could not be mapped into the unified schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("unknown source `{0}`")]
    UnknownSource(String),
    #[error("{0} records are not part of the unified table")]
    NotUnified(Source),
}

/// Output could not be persisted. Always fatal.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot encode table: {0}")]
    Csv(#[from] csv::Error),
}

/// The pipeline configuration is unreadable or inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
