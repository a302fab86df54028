//! Terminal dashboard for binwatch: flag full bins, plan the collection route, and
//! preview tomorrow's fill levels.

mod app;
mod config;
mod input;
mod ui;

use std::{fs::File, io, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context, Result};
use binwatch_core::{RouteOptimizer, plugin::SourceRegistry, service::DashboardService};
use binwatch_provider_file as file_source;
use binwatch_provider_memory::{self as seed_source, LogAlertPort, SeedSnapshotPort};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::Config;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;

    // Sources + service setup
    let mut plugins = vec![seed_source::plugin()];
    if let Some(snapshot_path) = config.snapshot_path.clone() {
        plugins.push(file_source::plugin(snapshot_path, config.history_path.clone()));
    }
    let registry = Arc::new(SourceRegistry::new(plugins));
    let service = DashboardService::new(registry, Arc::new(LogAlertPort))
        .with_fallback(Arc::new(SeedSnapshotPort::new()))
        .with_optimizer(RouteOptimizer::from_kind(config.solver, config.two_opt_passes));
    info!(solver = %config.solver, threshold = config.threshold, "binwatch starting");

    // App state
    let app = App::new(Arc::new(service), config.threshold, config.export_path.clone());

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

// The UI owns stdout, so events go to a file.
fn init_logging(config: &Config) -> Result<()> {
    let log_file = File::create(&config.log_path)
        .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::Collect => {
                    let Some(source) = app.selected_source.clone() else {
                        app.error_message = Some("Select a data source first".into());
                        continue;
                    };

                    let threshold = match app.threshold() {
                        Ok(threshold) => threshold,
                        Err(msg) => {
                            app.error_message = Some(msg);
                            continue;
                        }
                    };

                    app.is_loading = true;
                    app.error_message = None;
                    app.info_message = None;
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = app.service.collect(&source, threshold).await;

                    app.is_loading = false;
                    match res {
                        Ok(report) => app.show_report(report),
                        Err(err) => {
                            error!(source = %source, error = %err, "collection failed");
                            app.error_message = Some(format!("Collection failed: {err}"));
                        }
                    }
                }
                Action::ExportReport => {
                    let Some(report) = app.report.as_ref() else {
                        app.error_message = Some("Nothing to export yet".into());
                        continue;
                    };

                    match file_source::export_report(report, &app.export_path).await {
                        Ok(()) => {
                            app.error_message = None;
                            app.info_message =
                                Some(format!("Exported to {}", app.export_path.display()));
                        }
                        Err(err) => {
                            app.error_message = Some(format!("Export failed: {err}"));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
