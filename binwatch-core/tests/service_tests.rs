//! Tests for the dashboard service against in-test ports.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use binwatch_core::{
    AlertPort, Bin, BinId, Coordinate, DashboardService, FillAlert, HistoryPort, HistorySample,
    PickupBucket, PortError, SnapshotPort, SourceId, SourceMeta, SourcePlugin, SourceRegistry,
};

struct FixedSnapshot {
    meta: SourceMeta,
    bins: Vec<Bin>,
}

#[async_trait]
impl SnapshotPort for FixedSnapshot {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn snapshot(&self) -> Result<Vec<Bin>, PortError> {
        Ok(self.bins.clone())
    }
}

struct FixedHistory {
    meta: SourceMeta,
    samples: Option<Vec<HistorySample>>,
}

#[async_trait]
impl HistoryPort for FixedHistory {
    fn source(&self) -> &SourceMeta {
        &self.meta
    }

    async fn history(&self) -> Result<Vec<HistorySample>, PortError> {
        self.samples
            .clone()
            .ok_or_else(|| PortError::Internal("history offline".into()))
    }
}

#[derive(Default)]
struct RecordingAlerts {
    sent: Mutex<Vec<FillAlert>>,
    fail: bool,
}

#[async_trait]
impl AlertPort for RecordingAlerts {
    async fn alert(&self, alert: &FillAlert) -> Result<(), PortError> {
        if self.fail {
            return Err(PortError::Notification("smtp down".into()));
        }
        self.sent.lock().expect("alert log").push(alert.clone());
        Ok(())
    }
}

fn meta(id: &str) -> SourceMeta {
    SourceMeta {
        id: SourceId(id.to_owned()),
        name: id.to_owned(),
    }
}

fn scenario_bins() -> Vec<Bin> {
    vec![
        Bin::new("B1", Coordinate::new(18.5204, 73.8567), 85.0),
        Bin::new("B2", Coordinate::new(18.5300, 73.8700), 40.0),
        Bin::new("B3", Coordinate::new(18.5450, 73.8600), 92.0),
    ]
}

fn sample(bin: &str, day: u32, fill_level: f64) -> HistorySample {
    HistorySample {
        bin: bin.into(),
        day,
        fill_level,
    }
}

fn plugin(id: &str, bins: Vec<Bin>, samples: Option<Vec<HistorySample>>) -> SourcePlugin {
    SourcePlugin {
        meta: meta(id),
        snapshot_port: Arc::new(FixedSnapshot { meta: meta(id), bins }),
        history_port: Arc::new(FixedHistory { meta: meta(id), samples }),
    }
}

fn service(plugins: Vec<SourcePlugin>, alerts: Arc<RecordingAlerts>) -> DashboardService {
    DashboardService::new(Arc::new(SourceRegistry::new(plugins)), alerts)
}

#[tokio::test]
async fn collect_flags_routes_forecasts_and_alerts() {
    let samples = vec![sample("B1", 0, 10.0), sample("B1", 1, 20.0), sample("B1", 2, 30.0)];
    let alerts = Arc::new(RecordingAlerts::default());
    let service = service(vec![plugin("db", scenario_bins(), Some(samples))], Arc::clone(&alerts));

    let report = service
        .collect(&SourceId("db".into()), 80.0)
        .await
        .expect("report");

    let flagged = report.flagged.iter().map(|bin| bin.id.0.as_str()).collect::<Vec<_>>();
    assert_eq!(flagged, ["B1", "B3"], "flagged in snapshot order");
    assert_eq!(report.bins.len(), 3, "all bins kept for the map");
    assert_eq!(report.route.len(), 2, "route covers flagged bins");
    assert_eq!(report.forecast.predictions.get(&BinId::from("B1")), Some(&40.0), "trend");
    assert_eq!(
        report.forecast.schedule.get(&BinId::from("B1")),
        Some(&PickupBucket::Afternoon),
        "40 is an afternoon pickup"
    );

    let sent = alerts.sent.lock().expect("alert log").clone();
    assert_eq!(sent, report.alerts, "one delivered alert per flagged bin");
    assert_eq!(sent.len(), 2, "two flagged bins");

    let steps = report
        .route_steps()
        .iter()
        .map(|step| (step.step, step.bin.id.0.clone()))
        .collect::<Vec<_>>();
    assert_eq!(steps.len(), 2, "steps follow the route");
    assert_eq!(steps.first().map(|step| step.0), Some(1), "steps are 1-based");
}

#[tokio::test]
async fn empty_snapshot_uses_fallback() {
    let alerts = Arc::new(RecordingAlerts::default());
    let fallback = Arc::new(FixedSnapshot {
        meta: meta("seed"),
        bins: scenario_bins(),
    });
    let service = service(vec![plugin("db", Vec::new(), Some(Vec::new()))], alerts)
        .with_fallback(fallback);

    let report = service
        .collect(&SourceId("db".into()), 90.0)
        .await
        .expect("report");
    assert_eq!(report.bins.len(), 3, "fallback bins used");
    assert_eq!(report.flagged.len(), 1, "only B3 reaches 90");
    assert!(report.forecast.is_empty(), "no history, no forecast");
}

#[tokio::test]
async fn empty_snapshot_without_fallback_is_not_an_error() {
    let alerts = Arc::new(RecordingAlerts::default());
    let service = service(vec![plugin("db", Vec::new(), Some(Vec::new()))], alerts);

    let report = service
        .collect(&SourceId("db".into()), 50.0)
        .await
        .expect("report");
    assert!(report.flagged.is_empty(), "nothing flagged");
    assert!(report.route.is_empty(), "empty route");
}

#[tokio::test]
async fn history_failure_yields_empty_forecast() {
    let alerts = Arc::new(RecordingAlerts::default());
    let service = service(vec![plugin("db", scenario_bins(), None)], alerts);

    let report = service
        .collect(&SourceId("db".into()), 80.0)
        .await
        .expect("history errors are swallowed");
    assert!(report.forecast.is_empty(), "forecast skipped");
    assert_eq!(report.route.len(), 2, "routing still happens");
}

#[tokio::test]
async fn alert_failures_do_not_fail_the_request() {
    let alerts = Arc::new(RecordingAlerts {
        sent: Mutex::new(Vec::new()),
        fail: true,
    });
    let service = service(vec![plugin("db", scenario_bins(), Some(Vec::new()))], alerts);

    let report = service
        .collect(&SourceId("db".into()), 80.0)
        .await
        .expect("alert errors are swallowed");
    assert_eq!(report.alerts.len(), 2, "alerts still reported");
}

#[tokio::test]
async fn unknown_source_is_rejected() {
    let alerts = Arc::new(RecordingAlerts::default());
    let service = service(Vec::new(), alerts);

    let result = service.collect(&SourceId("missing".into()), 80.0).await;
    assert!(matches!(result, Err(PortError::UnknownSource)), "got {result:?}");
}

#[tokio::test]
async fn malformed_snapshot_is_rejected() {
    let alerts = Arc::new(RecordingAlerts::default());
    let bins = vec![Bin::new("Broken", Coordinate::new(123.0, 73.0), 90.0)];
    let service = service(vec![plugin("db", bins, Some(Vec::new()))], alerts);

    let result = service.collect(&SourceId("db".into()), 80.0).await;
    assert!(matches!(result, Err(PortError::InvalidRecord(_))), "got {result:?}");
}

#[tokio::test]
async fn repeated_bin_id_is_rejected_before_routing() {
    let alerts = Arc::new(RecordingAlerts::default());
    let bins = vec![
        Bin::new("B1", Coordinate::new(18.5204, 73.8567), 85.0),
        Bin::new("B1", Coordinate::new(18.5450, 73.8600), 92.0),
    ];
    let service = service(vec![plugin("db", bins, Some(Vec::new()))], Arc::clone(&alerts));

    let result = service.collect(&SourceId("db".into()), 80.0).await;
    assert!(matches!(result, Err(PortError::InvalidRecord(_))), "got {result:?}");
    assert!(alerts.sent.lock().expect("alert log").is_empty(), "no alerts for a rejected snapshot");
}
