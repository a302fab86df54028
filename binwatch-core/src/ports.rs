//! Traits describing collaborator capabilities and shared helper types.

use std::collections::BTreeSet;
use std::io::Error as IoError;

use async_trait::async_trait;
use serde_json::Error as JsonError;

use crate::model::{Bin, FillAlert, HistorySample};
use crate::plugin::SourceMeta;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to data sources and notifiers.
pub enum PortError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
    /// A source returned data that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] JsonError),
    /// The requested source has no registered plugin.
    #[error("Unknown source")]
    UnknownSource,
    /// A source returned a record that violates the model's preconditions.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// An alert could not be delivered.
    #[error("Notification error: {0}")]
    Notification(String),
    /// Internal collaborator error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Source of the current bin snapshot.
pub trait SnapshotPort: Send + Sync {
    /// Metadata describing the source behind this port.
    fn source(&self) -> &SourceMeta;

    /// Load every known bin with its latest fill level.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backing store cannot be read or decoded.
    async fn snapshot(&self) -> Result<Vec<Bin>, PortError>;
}

#[async_trait]
/// Source of historical fill readings.
pub trait HistoryPort: Send + Sync {
    /// Metadata describing the source behind this port.
    fn source(&self) -> &SourceMeta;

    /// Load all readings. Per bin, the returned order is temporal order.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backing store cannot be read or decoded.
    async fn history(&self) -> Result<Vec<HistorySample>, PortError>;
}

#[async_trait]
/// Delivery channel for fill alerts.
pub trait AlertPort: Send + Sync {
    /// Deliver one alert.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Notification`] when the alert could not be delivered.
    async fn alert(&self, alert: &FillAlert) -> Result<(), PortError>;
}

/// Reject bins whose coordinate or fill level cannot be fed to the engine, and
/// snapshots that list the same bin twice.
///
/// # Errors
///
/// Returns [`PortError::InvalidRecord`] naming the first offending bin.
pub fn validate_bins(bins: &[Bin]) -> Result<(), PortError> {
    let mut seen = BTreeSet::new();
    for bin in bins {
        if !seen.insert(&bin.id) {
            return Err(PortError::InvalidRecord(format!(
                "bin {} appears more than once",
                bin.id
            )));
        }
        let coordinate = bin.coordinate;
        let in_range = (-90.0..=90.0).contains(&coordinate.lat)
            && (-180.0..=180.0).contains(&coordinate.lon);
        if !in_range {
            return Err(PortError::InvalidRecord(format!(
                "bin {} has coordinate out of range ({}, {})",
                bin.id, coordinate.lat, coordinate.lon
            )));
        }
        if !bin.fill_level.is_finite() {
            return Err(PortError::InvalidRecord(format!(
                "bin {} has a non-numeric fill level",
                bin.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let bins = vec![Bin::new("Bad", Coordinate::new(91.0, 0.0), 10.0)];
        let result = validate_bins(&bins);
        assert!(
            matches!(result, Err(PortError::InvalidRecord(ref msg)) if msg.contains("Bad")),
            "expected invalid record, got {result:?}"
        );
    }

    #[test]
    fn nan_fill_is_rejected() {
        let bins = vec![Bin::new("Nan", Coordinate::new(18.5, 73.8), f64::NAN)];
        assert!(validate_bins(&bins).is_err(), "NaN fill must not reach the engine");
    }

    #[test]
    fn repeated_bin_id_is_rejected() {
        let bins = vec![
            Bin::new("Twin", Coordinate::new(18.52, 73.85), 90.0),
            Bin::new("Other", Coordinate::new(18.53, 73.86), 40.0),
            Bin::new("Twin", Coordinate::new(18.54, 73.87), 95.0),
        ];
        let result = validate_bins(&bins);
        assert!(
            matches!(result, Err(PortError::InvalidRecord(ref msg)) if msg.contains("Twin")),
            "expected duplicate rejection, got {result:?}"
        );
    }

    #[test]
    fn well_formed_bins_pass() {
        let bins = vec![Bin::new("Ok", Coordinate::new(-90.0, 180.0), 0.0)];
        assert!(validate_bins(&bins).is_ok(), "boundary coordinates are valid");
    }
}
