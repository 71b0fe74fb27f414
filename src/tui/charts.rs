use crate::model::{ProgressBand, ProgressPhase, ProgressState, SimulationResult};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};

/// Bar color for each progress band.
pub fn band_color(p: &ProgressState) -> Color {
    match p.phase {
        ProgressPhase::Failed => Color::DarkGray,
        _ => match p.band() {
            ProgressBand::Green => Color::Green,
            ProgressBand::Amber => Color::Yellow,
            ProgressBand::Red => Color::Red,
        },
    }
}

pub fn draw_progress(f: &mut Frame, area: Rect, p: &ProgressState, eta: &str) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Simulation"))
        .gauge_style(Style::default().fg(band_color(p)))
        .ratio(p.percent.clamp(0.0, 1.0))
        .label(format!("{:.1}%  {eta}", p.percent * 100.0));
    f.render_widget(gauge, area);
}

/// One gauge per chart percentage, stacked vertically.
pub fn draw_percent_gauges(f: &mut Frame, area: Rect, r: &SimulationResult) {
    let pcts = r.chart_percentages();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); pcts.len()])
        .split(area);
    for ((kind, pct), row) in pcts.iter().zip(rows.iter()) {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(kind.label()))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(pct / 100.0)
            .label(format!("{pct:.2}%"));
        f.render_widget(gauge, *row);
    }
}
