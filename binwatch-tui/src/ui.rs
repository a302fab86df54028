use binwatch_core::model::{Bin, FillBand};
use binwatch_core::service::CollectionReport;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new("binwatch – bin fill levels and collection routes")
        .block(Block::default().borders(Borders::ALL).title("Binwatch"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::SourceSelect => draw_source_select(frame, app, *content_area),
        Screen::ThresholdInput => draw_threshold_input(frame, app, *content_area),
        Screen::ReportView => draw_report_view(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::SourceSelect => "↑/↓ move · Enter/Space select source · q/Ctrl-C quit",
        Screen::ThresholdInput => "Type threshold % · Enter collect · ←/Esc back · q/Ctrl-C quit",
        Screen::ReportView => "e export · r refresh · Esc/←/b change threshold · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else if let Some(msg) = &app.info_message {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_source_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .sources
        .iter()
        .enumerate()
        .map(|(idx, meta)| {
            let prefix = if idx == app.source_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{}", meta.name))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select data source (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.sources.is_empty() {
        state.select(Some(app.source_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_threshold_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(0),    // help
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, help_area] = chunks else {
        return;
    };

    let input = Paragraph::new(app.threshold_input.as_str()).block(
        Block::default().borders(Borders::ALL).title(format!(
            "Fill threshold in % for {} (Enter)",
            app.selected_source_name()
        )),
    );
    frame.render_widget(input, *input_area);

    let help = Paragraph::new(
        "Bins at or above the threshold are flagged for collection, routed, and alerted. \
         Forecasts cover every bin with recorded history.",
    )
    .block(Block::default().borders(Borders::ALL).title("About"))
    .wrap(Wrap { trim: true });
    frame.render_widget(help, *help_area);
}

fn draw_report_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(report) = app.report.as_ref() else {
        let paragraph = Paragraph::new("No report yet. Enter a threshold first.")
            .block(Block::default().borders(Borders::ALL).title("Report"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let rows_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(7)])
        .split(area);
    let [tables_area, alerts_area] = rows_chunks.as_ref() else {
        return;
    };

    let column_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(38),
            Constraint::Percentage(27),
            Constraint::Percentage(35),
        ])
        .split(*tables_area);
    let [bins_area, route_area, forecast_area] = column_chunks.as_ref() else {
        return;
    };

    draw_bins(frame, report, *bins_area);
    draw_route(frame, report, *route_area);
    draw_forecast(frame, report, *forecast_area);
    draw_alerts(frame, report, *alerts_area);
}

fn draw_bins(frame: &mut Frame<'_>, report: &CollectionReport, area: Rect) {
    let rows = report.bins.iter().map(|bin| {
        let flagged = report.flagged.iter().any(|candidate| candidate.id == bin.id);
        let mut style = Style::default().fg(band_color(bin.band()));
        if flagged {
            style = style.add_modifier(Modifier::BOLD);
        }

        Row::new(vec![
            Cell::from(bin.id.to_string()),
            Cell::from(format!("{:.1}%", bin.fill_level)),
            Cell::from(format!("{:.4}, {:.4}", bin.coordinate.lat, bin.coordinate.lon)),
            Cell::from(if flagged { "collect" } else { "" }),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Min(18),
        Constraint::Length(8),
    ];

    let title = format!(
        "Bins ≥ {}%: {} of {}",
        report.threshold,
        report.flagged.len(),
        report.bins.len()
    );
    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Bin", "Fill", "Location", ""])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_route(frame: &mut Frame<'_>, report: &CollectionReport, area: Rect) {
    let title = format!("Route · {:.2} km", report.route.distance_km);

    let items = if report.route.is_empty() {
        vec![ListItem::new("No bins to collect.")]
    } else {
        report
            .route_steps()
            .into_iter()
            .map(|step| ListItem::new(step_label(step.step, step.bin)))
            .collect()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn draw_forecast(frame: &mut Frame<'_>, report: &CollectionReport, area: Rect) {
    let title = "Tomorrow's forecast";

    if report.forecast.is_empty() {
        let paragraph = Paragraph::new("No fill history available.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = report.forecast.predictions.iter().map(|(bin, predicted)| {
        let pickup = report
            .forecast
            .schedule
            .get(bin)
            .map_or("-", |bucket| bucket.time_label());
        Row::new(vec![
            Cell::from(bin.to_string()),
            Cell::from(format!("{predicted:.2}%")),
            Cell::from(pickup),
        ])
        .style(Style::default().fg(band_color(FillBand::from_fill(*predicted))))
    });

    let column_widths = [
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Min(8),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Bin", "Predicted", "Pickup"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_alerts(frame: &mut Frame<'_>, report: &CollectionReport, area: Rect) {
    let items = if report.alerts.is_empty() {
        vec![ListItem::new("No alerts.")]
    } else {
        report
            .alerts
            .iter()
            .map(|alert| ListItem::new(alert.message()).style(Style::default().fg(Color::Red)))
            .collect()
    };

    let title = format!(
        "Alerts · generated {}",
        report.generated_at.format("%d.%m.%Y %H:%M")
    );
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn step_label(step: usize, bin: &Bin) -> String {
    format!("Step {step}: {} ({}%)", bin.id, bin.fill_level)
}

fn band_color(band: FillBand) -> Color {
    match band {
        FillBand::High => Color::Red,
        FillBand::Medium => Color::Rgb(255, 165, 0),
        FillBand::Low => Color::Green,
    }
}
