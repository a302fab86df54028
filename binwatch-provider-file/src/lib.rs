//! Data source reading bin snapshots and fill history from JSON files.
//!
//! Snapshot file: an array of `{"id", "lat", "lon", "fill_level"}` objects
//! (`current_fill` is accepted for `fill_level`).
//! History file: an array of `{"id", "fill_level", "day"?}` objects in temporal order;
//! a missing `day` is numbered per bin in file order.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, info};

use binwatch_core::{
    model::{Bin, Coordinate, HistorySample},
    plugin::{SourceId, SourceMeta, SourcePlugin},
    ports::{HistoryPort, PortError, SnapshotPort},
    service::CollectionReport,
};

/// Single bin entry in a snapshot file.
#[derive(Debug, Deserialize)]
struct BinRecord {
    id: String,
    lat: f64,
    lon: f64,
    #[serde(alias = "current_fill")]
    fill_level: f64,
}

/// Single reading in a history file.
#[derive(Debug, Deserialize)]
struct SampleRecord {
    id: String,
    fill_level: f64,
    #[serde(default)]
    day: Option<u32>,
}

/// Snapshot source backed by a JSON file.
pub struct JsonSnapshotPort {
    path: PathBuf,
    meta: SourceMeta,
}

impl JsonSnapshotPort {
    /// Create a port reading from `path`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            meta: source_meta(),
        }
    }
}

#[async_trait]
impl SnapshotPort for JsonSnapshotPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn snapshot(&self) -> Result<Vec<Bin>, PortError> {
        // A missing file is an empty store, so callers can fall back to seed data.
        let Some(records) = read_json::<Vec<BinRecord>>(&self.path).await? else {
            debug!(path = %self.path.display(), "snapshot file missing");
            return Ok(Vec::new());
        };

        Ok(records
            .into_iter()
            .map(|record| {
                Bin::new(
                    record.id,
                    Coordinate::new(record.lat, record.lon),
                    record.fill_level,
                )
            })
            .collect())
    }
}

/// History source backed by a JSON file.
pub struct JsonHistoryPort {
    path: PathBuf,
    meta: SourceMeta,
}

impl JsonHistoryPort {
    /// Create a port reading from `path`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            meta: source_meta(),
        }
    }
}

#[async_trait]
impl HistoryPort for JsonHistoryPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn history(&self) -> Result<Vec<HistorySample>, PortError> {
        let records = read_json::<Vec<SampleRecord>>(&self.path)
            .await?
            .ok_or_else(|| {
                PortError::Internal(format!("history file {} not found", self.path.display()))
            })?;

        let mut next_day = HashMap::<String, u32>::new();
        let samples = records
            .into_iter()
            .map(|record| {
                let counter = next_day.entry(record.id.clone()).or_insert(0);
                let day = record.day.unwrap_or(*counter);
                *counter = day.saturating_add(1);
                HistorySample {
                    bin: record.id.into(),
                    day,
                    fill_level: record.fill_level,
                }
            })
            .collect();

        Ok(samples)
    }
}

/// Write `report` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns a [`PortError`] if the report cannot be encoded or the file cannot be written.
pub async fn export_report(report: &CollectionReport, path: &Path) -> Result<(), PortError> {
    let encoded = serde_json::to_vec_pretty(report)?;
    fs::write(path, encoded).await?;
    info!(
        path = %path.display(),
        flagged = report.flagged.len(),
        "collection report exported"
    );
    Ok(())
}

/// Build the plugin bundle for a pair of JSON files.
#[must_use]
pub fn plugin(snapshot_path: PathBuf, history_path: PathBuf) -> SourcePlugin {
    SourcePlugin {
        meta: source_meta(),
        snapshot_port: Arc::new(JsonSnapshotPort::new(snapshot_path)),
        history_port: Arc::new(JsonHistoryPort::new(history_path)),
    }
}

/// Identifier of the file source.
#[must_use]
pub fn source_id() -> SourceId {
    SourceId(String::from("file"))
}

fn source_meta() -> SourceMeta {
    SourceMeta {
        id: source_id(),
        name: String::from("JSON files"),
    }
}

// Read and decode a JSON file; `None` when the file does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PortError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PortError::from(err)),
    }
}
