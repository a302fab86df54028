//! High-level service facade combining sources, the route optimizer, and the forecaster.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forecast::forecast;
use crate::model::{Bin, FillAlert, Forecast, Route, flag_bins, group_history};
use crate::plugin::{SourceId, SourceMeta, SourcePlugin, SourceRegistry};
use crate::ports::{AlertPort, PortError, SnapshotPort, validate_bins};
use crate::route::RouteOptimizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Everything computed for one dashboard request.
///
/// Callers keep this value and hand it to exporters; nothing is cached process-wide.
pub struct CollectionReport {
    /// When the report was produced.
    pub generated_at: DateTime<Local>,
    /// Source the snapshot was requested from.
    pub source: SourceId,
    /// Fill threshold used for flagging.
    pub threshold: f64,
    /// Every bin in the snapshot, flagged or not.
    pub bins: Vec<Bin>,
    /// Bins at or above the threshold, in snapshot order.
    pub flagged: Vec<Bin>,
    /// Visiting order over the flagged bins.
    pub route: Route,
    /// Next-day predictions and pickup schedule.
    pub forecast: Forecast,
    /// One alert per flagged bin.
    pub alerts: Vec<FillAlert>,
}

#[derive(Debug, Clone, Copy)]
/// A routed bin together with its 1-based position on the route.
pub struct RouteStep<'report> {
    /// Position on the route, starting at 1.
    pub step: usize,
    /// The bin visited at this step.
    pub bin: &'report Bin,
}

impl CollectionReport {
    /// Join route stops back to their flagged bins.
    #[must_use]
    pub fn route_steps(&self) -> Vec<RouteStep<'_>> {
        self.route
            .stops
            .iter()
            .filter_map(|id| self.flagged.iter().find(|bin| &bin.id == id))
            .enumerate()
            .map(|(idx, bin)| RouteStep { step: idx + 1, bin })
            .collect()
    }
}

/// Public entry point for producing collection reports.
pub struct DashboardService {
    registry: Arc<SourceRegistry>,
    fallback: Option<Arc<dyn SnapshotPort>>,
    alerts: Arc<dyn AlertPort>,
    optimizer: RouteOptimizer,
}

impl DashboardService {
    /// Create a new service bound to the provided registry and alert channel.
    #[must_use]
    pub fn new(registry: Arc<SourceRegistry>, alerts: Arc<dyn AlertPort>) -> Self {
        Self {
            registry,
            fallback: None,
            alerts,
            optimizer: RouteOptimizer::default(),
        }
    }

    /// Use `fallback` whenever the requested source returns an empty snapshot.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn SnapshotPort>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Replace the route optimizer.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: RouteOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// List all available sources.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceMeta> {
        self.registry.sources()
    }

    /// Build a collection report for `source` using `threshold` as the flagging level.
    ///
    /// History failures and alert delivery failures are logged and do not fail the
    /// request; the forecast is then empty or the alert is simply not delivered.
    ///
    /// Route optimization and forecasting run on the rayon pool via [`rayon::join`] and
    /// block the calling task until both finish.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the source is unknown, its snapshot cannot be loaded,
    /// or the snapshot contains malformed bins.
    pub async fn collect(
        &self,
        source: &SourceId,
        threshold: f64,
    ) -> Result<CollectionReport, PortError> {
        let plugin = self.registry.plugin(source)?;

        let bins = self.load_bins(plugin).await?;
        validate_bins(&bins)?;
        let flagged = flag_bins(&bins, threshold);

        let history = match plugin.history_port.history().await {
            Ok(samples) => group_history(&samples),
            Err(err) => {
                warn!(source = %source, error = %err, "fill history unavailable");
                BTreeMap::new()
            }
        };

        let (route, fill_forecast) = rayon::join(
            || self.optimizer.optimize(&flagged),
            || forecast(&history),
        );

        let alerts = flagged.iter().map(FillAlert::from).collect::<Vec<_>>();
        for alert in &alerts {
            if let Err(err) = self.alerts.alert(alert).await {
                warn!(bin = %alert.bin, error = %err, "alert delivery failed");
            }
        }

        info!(
            source = %source,
            threshold,
            bins = bins.len(),
            flagged = flagged.len(),
            route_km = route.distance_km,
            forecasts = fill_forecast.predictions.len(),
            "collection report ready"
        );

        Ok(CollectionReport {
            generated_at: Local::now(),
            source: source.clone(),
            threshold,
            bins,
            flagged,
            route,
            forecast: fill_forecast,
            alerts,
        })
    }

    async fn load_bins(&self, plugin: &SourcePlugin) -> Result<Vec<Bin>, PortError> {
        let bins = plugin.snapshot_port.snapshot().await?;
        if !bins.is_empty() {
            return Ok(bins);
        }

        let Some(fallback) = &self.fallback else {
            return Ok(bins);
        };
        info!(
            source = %plugin.meta.id,
            fallback = %fallback.source().id,
            "snapshot empty, using fallback bins"
        );
        fallback.snapshot().await
    }
}
