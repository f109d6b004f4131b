//! Snapshot sink: human-readable JSON keyed by source name.

use crate::error::SinkError;
use crate::models::Snapshot;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `snapshot` as UTF-8 JSON indented by four spaces to `path`, replacing
/// any previous file.
///
/// # Errors
///
/// [`SinkError::Json`] if the snapshot cannot be encoded, [`SinkError::Io`] if
/// the file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), SinkError> {
    let mut json = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut json, PrettyFormatter::with_indent(b"    "));
    snapshot.serialize(&mut serializer)?;
    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write snapshot");
        return Err(SinkError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }
    info!(sources = snapshot.len(), "Wrote snapshot");
    Ok(())
}

/// Read a snapshot previously written by [`write_snapshot`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_snapshot(path: &Path) -> Result<Snapshot, SinkError> {
    let text = fs::read_to_string(path).await.map_err(|source| SinkError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: Snapshot = serde_json::from_str(&text)?;
    info!(sources = snapshot.len(), "Loaded snapshot");
    Ok(snapshot)
}
