use std::path::PathBuf;
use std::sync::Arc;

use binwatch_core::{
    plugin::{SourceId, SourceMeta},
    service::{CollectionReport, DashboardService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    SourceSelect,
    ThresholdInput,
    ReportView,
}

pub(crate) struct App {
    pub service: Arc<DashboardService>,

    pub screen: Screen,
    pub sources: Vec<SourceMeta>,
    pub source_list_index: usize,
    pub selected_source: Option<SourceId>,

    pub threshold_input: String,

    /// Result of the last collection; exports read from here.
    pub report: Option<CollectionReport>,
    pub export_path: PathBuf,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
}

impl App {
    pub(crate) fn new(
        service: Arc<DashboardService>,
        threshold: f64,
        export_path: PathBuf,
    ) -> Self {
        let sources = service.sources();
        Self {
            service,
            screen: Screen::SourceSelect,
            sources,
            source_list_index: 0,
            selected_source: None,
            threshold_input: threshold.to_string(),
            report: None,
            export_path,
            is_loading: false,
            error_message: None,
            info_message: None,
        }
    }

    pub(crate) fn select_current_source(&mut self) {
        if let Some(meta) = self.sources.get(self.source_list_index) {
            self.selected_source = Some(meta.id.clone());
            self.screen = Screen::ThresholdInput;
        }
    }

    pub(crate) fn selected_source_name(&self) -> &str {
        self.selected_source
            .as_ref()
            .and_then(|id| self.sources.iter().find(|meta| &meta.id == id))
            .map_or("<no source>", |meta| meta.name.as_str())
    }

    /// Parse the typed threshold as a percentage.
    pub(crate) fn threshold(&self) -> Result<f64, String> {
        let raw = self.threshold_input.trim();
        let value = raw
            .parse::<f64>()
            .map_err(|_err| format!("Threshold {raw:?} is not a number"))?;
        if (0.0..=100.0).contains(&value) {
            Ok(value)
        } else {
            Err(format!("Threshold must be between 0 and 100, got {value}"))
        }
    }

    pub(crate) fn show_report(&mut self, report: CollectionReport) {
        self.report = Some(report);
        self.screen = Screen::ReportView;
    }
}
