//! Text rendering of dashboard state.
//!
//! Pure formatting: everything here takes state by reference and returns
//! lines, so the TUI and the plain text mode share one source of truth.

use crate::dashboard::{DashboardState, DisplayedResult, HistoryPanel};
use crate::model::{HistoryEntry, ProgressBand, ProgressState, SimulationResult};

pub(crate) const EMPTY_HISTORY: &str = "🌱 No simulations saved yet.";

pub(crate) const HISTORY_HEADERS: [&str; 10] = [
    "Date",
    "Crew",
    "Days",
    "Profile",
    "BioAI",
    "Energy (kW)",
    "Bacteria (M)",
    "CO₂ (kg)",
    "CH₄ (kg)",
    "Nanobots",
];

/// Pre-formatted lines for text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// One formatted history table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HistoryRow {
    pub cells: [String; 10],
}

fn or_dash<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

/// Result summary block, missing values shown as zero.
pub(crate) fn build_result_summary(shown: &DisplayedResult) -> TextSummary {
    let req = &shown.request;
    let r = &shown.result;
    let mut lines = vec![
        format!("Crew: {}", req.crew_size),
        format!("Days: {}", req.duration_days),
        format!("Profile: {}", req.profile),
        format!("BioAI: {}", req.bioai_mode),
        String::new(),
    ];
    lines.extend(result_lines(r));
    TextSummary { lines }
}

pub(crate) fn result_lines(r: &SimulationResult) -> Vec<String> {
    vec![
        format!("Energy: {:.2} kW", r.energy_kw()),
        format!("Bacteria: {:.2} M", r.bacteria_millions()),
        format!("CO₂: {:.2} kg", r.co2_kg()),
        format!("CH₄: {:.2} kg", r.ch4_kg()),
        format!("Active nanobots: {}", r.nanobots_active()),
    ]
}

/// Horizontal bar for one percentage chart.
pub(crate) fn chart_line(label: &str, pct: f64, width: usize) -> String {
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "{label:<9} [{}{}] {pct:>6.2}%",
        "█".repeat(filled),
        "░".repeat(width - filled)
    )
}

pub(crate) fn build_charts(r: &SimulationResult, width: usize) -> TextSummary {
    TextSummary {
        lines: r
            .chart_percentages()
            .iter()
            .map(|(kind, pct)| chart_line(kind.label(), *pct, width))
            .collect(),
    }
}

/// Table rows, newest first.
pub(crate) fn history_rows(entries: &[HistoryEntry]) -> Vec<HistoryRow> {
    entries
        .iter()
        .rev()
        .map(|e| {
            let r = e.result.clone().unwrap_or_default();
            HistoryRow {
                cells: [
                    or_dash(e.timestamp.as_deref()),
                    or_dash(e.crew_size),
                    or_dash(e.duration_days),
                    or_dash(e.profile.as_deref()),
                    or_dash(e.bioai_mode.as_deref()),
                    format!("{:.2}", r.energy_kw()),
                    format!("{:.2}", r.bacteria_millions()),
                    format!("{:.2}", r.co2_kg()),
                    format!("{:.2}", r.ch4_kg()),
                    r.nanobots_active().to_string(),
                ],
            }
        })
        .collect()
}

pub(crate) fn build_history_table(panel: &HistoryPanel) -> TextSummary {
    let entries = match panel {
        HistoryPanel::NotLoaded => {
            return TextSummary {
                lines: vec!["Loading history…".into()],
            }
        }
        HistoryPanel::Unavailable(msg) => {
            return TextSummary {
                lines: vec![format!("⚠️ {msg}")],
            }
        }
        HistoryPanel::Loaded(entries) if entries.is_empty() => {
            return TextSummary {
                lines: vec![EMPTY_HISTORY.into()],
            }
        }
        HistoryPanel::Loaded(entries) => entries,
    };

    let rows = history_rows(entries);
    let mut widths = HISTORY_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.cells.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{c:<w$}", w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(HISTORY_HEADERS.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        lines.push(format_row(row.cells.iter().map(String::as_str).collect()));
    }
    TextSummary { lines }
}

/// Single-line progress indicator for text mode.
pub(crate) fn progress_line(p: &ProgressState, width: usize) -> String {
    let filled = ((p.percent * width as f64).round() as usize).min(width);
    let band = match p.band() {
        ProgressBand::Green => "green",
        ProgressBand::Amber => "amber",
        ProgressBand::Red => "red",
    };
    format!(
        "[{}{}] {} ({band})",
        "#".repeat(filled),
        ".".repeat(width - filled),
        p.eta_label()
    )
}

/// Render the whole dashboard as plain lines.
pub(crate) fn render_dashboard(state: &DashboardState) -> TextSummary {
    let mut lines = vec![format!("Status: {}", state.status)];
    match state.last_result.as_ref() {
        Some(shown) => {
            lines.push(String::new());
            lines.extend(build_result_summary(shown).lines);
            lines.push(String::new());
            lines.extend(build_charts(&shown.result, 20).lines);
        }
        None => lines.push(state.eta.clone()),
    }
    lines.push(String::new());
    lines.push("History:".into());
    lines.extend(build_history_table(&state.history).lines);
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        EnergyReport, GasReport, NanobotReport, ProgressPhase, SimulationRequest,
        VisualPercentages,
    };
    use std::time::Duration;

    fn entry(date: &str, crew: i64) -> HistoryEntry {
        HistoryEntry {
            timestamp: Some(date.into()),
            crew_size: Some(crew),
            duration_days: Some(30),
            profile: Some("Estándar_mision".into()),
            bioai_mode: Some("N2".into()),
            result: Some(SimulationResult {
                energy: Some(EnergyReport {
                    total_kw: Some(1.0 + crew as f64),
                }),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn summary_shows_zero_for_missing_fields() {
        let shown = DisplayedResult {
            request: SimulationRequest {
                crew_size: 3,
                duration_days: 7,
                profile: "Estándar_mision".into(),
                bioai_mode: "N1".into(),
            },
            result: SimulationResult {
                gases: Some(GasReport {
                    co2_kg: Some(4.126),
                    ch4_kg: None,
                }),
                nanobots: Some(NanobotReport { activos: None }),
                ..Default::default()
            },
        };
        let lines = build_result_summary(&shown).lines;
        assert!(lines.contains(&"Energy: 0.00 kW".to_string()));
        assert!(lines.contains(&"Bacteria: 0.00 M".to_string()));
        assert!(lines.contains(&"CO₂: 4.13 kg".to_string()));
        assert!(lines.contains(&"CH₄: 0.00 kg".to_string()));
        assert!(lines.contains(&"Active nanobots: 0".to_string()));
        assert!(lines.iter().all(|l| !l.contains("NaN") && !l.contains("None")));
    }

    #[test]
    fn charts_fill_proportionally() {
        let r = SimulationResult {
            visual: Some(VisualPercentages {
                energia_pct: Some(50.0),
                bacterias_pct: Some(250.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let lines = build_charts(&r, 10).lines;
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Energy    [█████░░░░░]  50.00%");
        assert_eq!(lines[1], "Bacteria  [██████████] 100.00%");
        assert_eq!(lines[4], "Nanobots  [░░░░░░░░░░]   0.00%");
    }

    #[test]
    fn empty_history_shows_empty_state_not_a_table() {
        let lines = build_history_table(&HistoryPanel::Loaded(Vec::new())).lines;
        assert_eq!(lines, vec![EMPTY_HISTORY.to_string()]);
    }

    #[test]
    fn history_rows_are_newest_first() {
        let entries = vec![
            entry("2025-01-01", 1),
            entry("2025-01-02", 2),
            entry("2025-01-03", 3),
        ];
        let rows = history_rows(&entries);
        assert_eq!(rows.len(), 3);
        let dates: Vec<&str> = rows.iter().map(|r| r.cells[0].as_str()).collect();
        assert_eq!(dates, vec!["2025-01-03", "2025-01-02", "2025-01-01"]);
        assert_eq!(rows[0].cells[5], "4.00");

        let lines = build_history_table(&HistoryPanel::Loaded(entries)).lines;
        // Header, rule, three rows.
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("2025-01-03"));
    }

    #[test]
    fn missing_history_fields_render_as_dash_or_zero() {
        let rows = history_rows(&[HistoryEntry::default()]);
        let cells = &rows[0].cells;
        assert_eq!(&cells[..5], &["-", "-", "-", "-", "-"]);
        assert_eq!(&cells[5..], &["0.00", "0.00", "0.00", "0.00", "0"]);
    }

    #[test]
    fn unavailable_history_is_an_inline_message() {
        let lines = build_history_table(&HistoryPanel::Unavailable("backend down".into())).lines;
        assert_eq!(lines, vec!["⚠️ backend down".to_string()]);
    }

    #[test]
    fn progress_line_tracks_band() {
        let p = ProgressState {
            elapsed: Duration::from_millis(30_600),
            total: Duration::from_millis(36_000),
            percent: 0.85,
            phase: ProgressPhase::Running,
        };
        assert_eq!(
            progress_line(&p, 20),
            "[#################...] 85% — 5.4s left (red)"
        );
    }

    #[test]
    fn dashboard_without_result_shows_eta() {
        let state = DashboardState::new(Duration::from_secs(36));
        let lines = render_dashboard(&state).lines;
        assert_eq!(lines[0], "Status: Ready");
        assert_eq!(lines[1], "Waiting for simulation…");
        assert_eq!(lines.last().map(String::as_str), Some("Loading history…"));
    }
}
