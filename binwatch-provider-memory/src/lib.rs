//! Built-in seed bins and history, plus an alert channel that writes to the log.
//!
//! The seed source doubles as the fallback used when a real source reports no bins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use binwatch_core::{
    model::{Bin, Coordinate, FillAlert, HistorySample},
    plugin::{SourceId, SourceMeta, SourcePlugin},
    ports::{AlertPort, HistoryPort, PortError, SnapshotPort},
};

/// Seed bins: identifier, latitude, longitude, current fill.
const SEED_BINS: [(&str, f64, f64, f64); 4] = [
    ("Bin001", 18.5204, 73.8567, 85.0),
    ("Bin002", 18.5300, 73.8700, 40.0),
    ("Bin003", 18.5450, 73.8600, 92.0),
    ("Bin004", 18.5555, 73.8650, 30.0),
];

/// A week of daily readings per seed bin, oldest first.
const SEED_HISTORY: [(&str, [f64; 7]); 4] = [
    ("Bin001", [42.0, 49.0, 55.0, 63.0, 70.0, 78.0, 85.0]),
    ("Bin002", [12.0, 18.0, 21.0, 27.0, 31.0, 36.0, 40.0]),
    ("Bin003", [58.0, 63.0, 69.0, 74.0, 80.0, 86.0, 92.0]),
    ("Bin004", [24.0, 25.0, 27.0, 26.0, 28.0, 29.0, 30.0]),
];

/// The fixed seed bin list.
#[must_use]
pub fn seed_bins() -> Vec<Bin> {
    SEED_BINS
        .iter()
        .map(|&(id, lat, lon, fill_level)| Bin::new(id, Coordinate::new(lat, lon), fill_level))
        .collect()
}

/// The seed history, grouped bin by bin in temporal order.
#[must_use]
pub fn seed_history() -> Vec<HistorySample> {
    SEED_HISTORY
        .iter()
        .flat_map(|(id, readings)| {
            (0_u32..).zip(readings.iter()).map(move |(day, fill_level)| HistorySample {
                bin: (*id).into(),
                day,
                fill_level: *fill_level,
            })
        })
        .collect()
}

/// Snapshot port serving a fixed bin list.
pub struct SeedSnapshotPort {
    meta: SourceMeta,
    bins: Vec<Bin>,
}

impl SeedSnapshotPort {
    /// Create a port serving the built-in seed bins.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bins(seed_bins())
    }

    /// Create a port serving `bins`.
    #[must_use]
    pub fn with_bins(bins: Vec<Bin>) -> Self {
        Self {
            meta: source_meta(),
            bins,
        }
    }
}

impl Default for SeedSnapshotPort {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotPort for SeedSnapshotPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn snapshot(&self) -> Result<Vec<Bin>, PortError> {
        Ok(self.bins.clone())
    }
}

/// History port serving fixed readings.
pub struct SeedHistoryPort {
    meta: SourceMeta,
    samples: Vec<HistorySample>,
}

impl SeedHistoryPort {
    /// Create a port serving the built-in seed history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_samples(seed_history())
    }

    /// Create a port serving `samples`.
    #[must_use]
    pub fn with_samples(samples: Vec<HistorySample>) -> Self {
        Self {
            meta: source_meta(),
            samples,
        }
    }
}

impl Default for SeedHistoryPort {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryPort for SeedHistoryPort {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn history(&self) -> Result<Vec<HistorySample>, PortError> {
        Ok(self.samples.clone())
    }
}

/// Alert channel that emits one warning event per alert.
#[derive(Debug, Default)]
pub struct LogAlertPort;

#[async_trait]
impl AlertPort for LogAlertPort {
    async fn alert(&self, alert: &FillAlert) -> Result<(), PortError> {
        warn!(bin = %alert.bin, fill_level = alert.fill_level, "{}", alert.notification());
        Ok(())
    }
}

/// Build the plugin bundle for the seed source.
#[must_use]
pub fn plugin() -> SourcePlugin {
    SourcePlugin {
        meta: source_meta(),
        snapshot_port: Arc::new(SeedSnapshotPort::new()),
        history_port: Arc::new(SeedHistoryPort::new()),
    }
}

/// Identifier of the seed source.
#[must_use]
pub fn source_id() -> SourceId {
    SourceId(String::from("seed"))
}

fn source_meta() -> SourceMeta {
    SourceMeta {
        id: source_id(),
        name: String::from("Built-in seed bins"),
    }
}
