//! The dashboard view: current values, the monthly charts and the energy
//! source split.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{ChartId, ChartSpec};
use crate::refresh::ChartSeries;

/// Rows of current values shown before the panel scrolls out of view.
const MAX_VALUE_ROWS: u16 = 6;

/// Render the whole dashboard into `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let values = app.state.values();
    let value_rows = (values.len() as u16).clamp(1, MAX_VALUE_ROWS);

    let chunks = Layout::vertical([
        Constraint::Length(value_rows + 2),
        Constraint::Min(6),
        Constraint::Length(3),
    ])
    .split(area);

    render_values(frame, app, chunks[0]);

    let charts = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_chart(frame, app, &ChartSpec::co2(), charts[0]);
    render_chart(frame, app, &ChartSpec::energy(), charts[1]);

    render_split(frame, app, chunks[2]);
}

fn panel<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(Span::styled(format!(" {} ", title), app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

/// Current values, one per row: label, formatted value, unit.
fn render_values(frame: &mut Frame, app: &App, area: Rect) {
    let values = app.state.values();
    let block = panel(app, "Now");

    if values.is_empty() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Waiting for current values...",
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    let label_width = values
        .keys()
        .map(|k| app.rules.label(k).chars().count())
        .max()
        .unwrap_or(0);

    let lines: Vec<Line> = values
        .iter()
        .map(|(key, text)| {
            let unit = app.rules.unit(key).unwrap_or("");
            Line::from(vec![
                Span::raw(format!(" {:<width$}  ", app.rules.label(key), width = label_width)),
                Span::styled(text.clone(), app.theme.value),
                Span::raw(format!(" {}", unit)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One grouped bar chart: a group per month, a bar per dataset.
fn render_chart(frame: &mut Frame, app: &App, spec: &ChartSpec, area: Rect) {
    let block = panel(app, spec.title);

    let Some(series) = app.state.chart(spec.id).filter(|s| !s.is_empty()) else {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Loading history...",
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(waiting, area);
        return;
    };

    let inner_width = area.width.saturating_sub(2);
    let (bar_width, bar_gap, group_gap) = bar_layout(inner_width, series.len(), month_count(&series));

    let legend = Line::from(
        series
            .iter()
            .enumerate()
            .flat_map(|(i, (dataset, values))| {
                let color = app.theme.dataset_color(spec.id, dataset.key, i);
                vec![
                    Span::styled("■ ", Style::default().fg(color)),
                    Span::raw(format!(
                        "{} {} {}  ",
                        dataset.label,
                        format_compact(values.total()),
                        dataset.unit
                    )),
                ]
            })
            .collect::<Vec<_>>(),
    );

    let mut chart = BarChart::default()
        .block(block.title_bottom(legend))
        .bar_width(bar_width)
        .bar_gap(bar_gap)
        .group_gap(group_gap);

    for group in bar_groups(app, spec.id, &series) {
        chart = chart.data(group);
    }

    frame.render_widget(chart, area);
}

fn month_count(series: &ChartSeries) -> usize {
    series.iter().map(|(_, s)| s.len()).max().unwrap_or(0)
}

/// Build one [`BarGroup`] per month, labelled with the month's short name.
fn bar_groups<'a>(app: &App, chart: ChartId, series: &'a ChartSeries) -> Vec<BarGroup<'a>> {
    let months = month_count(series);

    (0..months)
        .map(|m| {
            let label = series
                .first()
                .and_then(|(_, s)| s.buckets().get(m))
                .map(|b| b.label.clone())
                .unwrap_or_default();

            let bars: Vec<Bar> = series
                .iter()
                .enumerate()
                .map(|(i, (dataset, values))| {
                    let value = values.buckets().get(m).map(|b| b.sum).unwrap_or(0.0);
                    Bar::default()
                        .value(scaled(value))
                        .text_value(format_compact(value))
                        .style(Style::default().fg(app.theme.dataset_color(chart, dataset.key, i)))
                })
                .collect();

            BarGroup::default().label(Line::from(label)).bars(&bars)
        })
        .collect()
}

/// Bars take integer heights; keep two decimals of precision.
fn scaled(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value * 100.0).round() as u64
    } else {
        0
    }
}

/// Fit `groups` groups of `bars` bars into `width` columns.
///
/// Returns `(bar_width, bar_gap, group_gap)`.
fn bar_layout(width: u16, bars: usize, groups: usize) -> (u16, u16, u16) {
    if bars == 0 || groups == 0 {
        return (1, 0, 0);
    }
    let bars = bars as u16;
    let groups = groups as u16;

    let group_gap = 1;
    let per_group = (width / groups).saturating_sub(group_gap);
    let bar_width = (per_group / bars).max(1);
    (bar_width, 0, group_gap)
}

/// Render the solar versus grid gauge.
fn render_split(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(app, "Energy source (12 months)");

    match app.state.source_split() {
        Some(split) => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(app.theme.solar).bg(app.theme.grid))
                .percent(u16::from(split.solar_percent))
                .label(format!(
                    "Solar {}% / Grid {}%",
                    split.solar_percent, split.grid_percent
                ));
            frame.render_widget(gauge, area);
        }
        None => {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No energy consumed in the last 12 months",
                Style::default().add_modifier(Modifier::DIM),
            )))
            .block(block);
            frame.render_widget(empty, area);
        }
    }
}

/// Format a value for a narrow bar (e.g., 1234.5 -> "1.2K", 12.34 -> "12").
fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else if abs >= 10.0 || abs == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
