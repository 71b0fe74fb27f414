use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PROFILE: &str = "Estándar_mision";
pub const DEFAULT_BIOAI_MODE: &str = "N2";

/// Settings shared by every submission of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub progress_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub tick: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Parameters posted to `/api/calcular`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(rename = "crew")]
    pub crew_size: i64,
    #[serde(rename = "days")]
    pub duration_days: i64,
    #[serde(rename = "perfil")]
    pub profile: String,
    #[serde(rename = "bioai")]
    pub bioai_mode: String,
}

/// Raw, user-typed simulation inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationForm {
    pub crew: String,
    pub days: String,
    pub profile: String,
    pub bioai: String,
}

impl Default for SimulationForm {
    fn default() -> Self {
        Self {
            crew: "8".into(),
            days: "365".into(),
            profile: DEFAULT_PROFILE.into(),
            bioai: DEFAULT_BIOAI_MODE.into(),
        }
    }
}

impl SimulationForm {
    /// Check presence and integer parsing. Range is deliberately not checked:
    /// zero, negative and huge crews go to the backend as typed.
    pub fn validate(&self) -> Result<SimulationRequest, ValidationError> {
        let crew_size = parse_integer("crew", &self.crew)?;
        let duration_days = parse_integer("days", &self.days)?;
        let profile = require("profile", &self.profile)?;
        let bioai_mode = require("bioai", &self.bioai)?;
        Ok(SimulationRequest {
            crew_size,
            duration_days,
            profile,
            bioai_mode,
        })
    }
}

fn require(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Ok(value.to_string())
}

fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let value = require(field, raw)?;
    value
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger { field, value })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    #[serde(default)]
    pub total_kw: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacteriaReport {
    #[serde(default)]
    pub total_millones: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasReport {
    #[serde(default, rename = "CO2")]
    pub co2_kg: Option<f64>,
    #[serde(default, rename = "CH4")]
    pub ch4_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NanobotReport {
    #[serde(default)]
    pub activos: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualPercentages {
    #[serde(default)]
    pub energia_pct: Option<f64>,
    #[serde(default)]
    pub bacterias_pct: Option<f64>,
    #[serde(default)]
    pub co2_pct: Option<f64>,
    #[serde(default)]
    pub ch4_pct: Option<f64>,
    #[serde(default)]
    pub nanobots_pct: Option<f64>,
}

/// Response of `/api/calcular`. Every field may be absent or null; the
/// accessors below present missing values as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default, rename = "energia")]
    pub energy: Option<EnergyReport>,
    #[serde(default, rename = "bacterias")]
    pub bacteria: Option<BacteriaReport>,
    #[serde(default)]
    pub gases: Option<GasReport>,
    #[serde(default)]
    pub nanobots: Option<NanobotReport>,
    #[serde(default, rename = "visual")]
    pub visual: Option<VisualPercentages>,
    #[serde(default, rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl SimulationResult {
    pub fn energy_kw(&self) -> f64 {
        self.energy.as_ref().and_then(|e| e.total_kw).unwrap_or(0.0)
    }

    pub fn bacteria_millions(&self) -> f64 {
        self.bacteria
            .as_ref()
            .and_then(|b| b.total_millones)
            .unwrap_or(0.0)
    }

    pub fn co2_kg(&self) -> f64 {
        self.gases.as_ref().and_then(|g| g.co2_kg).unwrap_or(0.0)
    }

    pub fn ch4_kg(&self) -> f64 {
        self.gases.as_ref().and_then(|g| g.ch4_kg).unwrap_or(0.0)
    }

    pub fn nanobots_active(&self) -> i64 {
        self.nanobots.as_ref().and_then(|n| n.activos).unwrap_or(0)
    }

    /// Chart percentages in display order, each clamped to [0, 100].
    pub fn chart_percentages(&self) -> [(ChartKind, f64); 5] {
        let v = self.visual.clone().unwrap_or_default();
        [
            (ChartKind::Energy, clamp_pct(v.energia_pct)),
            (ChartKind::Bacteria, clamp_pct(v.bacterias_pct)),
            (ChartKind::Co2, clamp_pct(v.co2_pct)),
            (ChartKind::Ch4, clamp_pct(v.ch4_pct)),
            (ChartKind::Nanobots, clamp_pct(v.nanobots_pct)),
        ]
    }
}

fn clamp_pct(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Energy,
    Bacteria,
    Co2,
    Ch4,
    Nanobots,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Energy => "Energy",
            ChartKind::Bacteria => "Bacteria",
            ChartKind::Co2 => "CO₂",
            ChartKind::Ch4 => "CH₄",
            ChartKind::Nanobots => "Nanobots",
        }
    }
}

/// One persisted simulation as returned by `/api/historial`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, rename = "fecha")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "tripulantes")]
    pub crew_size: Option<i64>,
    #[serde(default, rename = "dias")]
    pub duration_days: Option<i64>,
    #[serde(default, rename = "perfil")]
    pub profile: Option<String>,
    #[serde(default, rename = "bioAI")]
    pub bioai_mode: Option<String>,
    #[serde(default, rename = "resultados")]
    pub result: Option<SimulationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Idle,
    Running,
    Success,
    Failed,
}

/// Presentation band of the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    Green,
    Amber,
    Red,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub elapsed: Duration,
    pub total: Duration,
    pub percent: f64,
    pub phase: ProgressPhase,
}

impl ProgressState {
    pub fn idle(total: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            total,
            percent: 0.0,
            phase: ProgressPhase::Idle,
        }
    }

    pub fn band(&self) -> ProgressBand {
        if self.percent < 0.5 {
            ProgressBand::Green
        } else if self.percent < 0.8 {
            ProgressBand::Amber
        } else {
            ProgressBand::Red
        }
    }

    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed)
    }

    pub fn eta_label(&self) -> String {
        match self.phase {
            ProgressPhase::Idle => "Waiting for simulation…".into(),
            ProgressPhase::Running if self.elapsed.is_zero() => "Starting…".into(),
            ProgressPhase::Running | ProgressPhase::Success => format!(
                "{:.0}% — {:.1}s left",
                self.percent * 100.0,
                self.remaining().as_secs_f64()
            ),
            ProgressPhase::Failed => "Simulation failed.".into(),
        }
    }
}

/// Events emitted by the submission controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum LabEvent {
    SubmissionStarted {
        request: SimulationRequest,
    },
    Progress(ProgressState),
    ResultReady {
        request: SimulationRequest,
        // Boxed to keep the enum small.
        result: Box<SimulationResult>,
    },
    SubmissionFailed {
        message: String,
    },
    HistoryLoaded {
        entries: Vec<HistoryEntry>,
    },
    HistoryFailed {
        message: String,
    },
    /// Progress and in-flight state were abandoned by a reset.
    Reset,
    Info(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_backend_field_names() {
        let req = SimulationRequest {
            crew_size: 4,
            duration_days: 30,
            profile: "Estándar_mision".into(),
            bioai_mode: "N3".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"crew": 4, "days": 30, "perfil": "Estándar_mision", "bioai": "N3"})
        );
    }

    #[test]
    fn form_accepts_out_of_range_integers() {
        let form = SimulationForm {
            crew: " 0 ".into(),
            days: "1000000".into(),
            ..Default::default()
        };
        let req = form.validate().unwrap();
        assert_eq!(req.crew_size, 0);
        assert_eq!(req.duration_days, 1_000_000);
        assert_eq!(req.bioai_mode, "N2");
    }

    #[test]
    fn form_rejects_missing_and_non_numeric_fields() {
        let form = SimulationForm {
            crew: "".into(),
            ..Default::default()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::Missing { field: "crew" })
        );

        let form = SimulationForm {
            days: "twelve".into(),
            ..Default::default()
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::NotAnInteger { field: "days", .. })
        ));

        let form = SimulationForm {
            bioai: "   ".into(),
            ..Default::default()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::Missing { field: "bioai" })
        );
    }

    #[test]
    fn missing_and_null_result_fields_present_as_zero() {
        let r: SimulationResult = serde_json::from_str(
            r#"{"energia": null, "gases": {"CO2": 12.5}, "nanobots": {}, "visual": {"co2_pct": null}}"#,
        )
        .unwrap();
        assert_eq!(r.energy_kw(), 0.0);
        assert_eq!(r.bacteria_millions(), 0.0);
        assert_eq!(r.co2_kg(), 12.5);
        assert_eq!(r.ch4_kg(), 0.0);
        assert_eq!(r.nanobots_active(), 0);
        assert!(r.chart_percentages().iter().all(|(_, p)| *p == 0.0));

        let empty: SimulationResult = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SimulationResult::default());
    }

    #[test]
    fn chart_percentages_are_clamped() {
        let r: SimulationResult = serde_json::from_str(
            r#"{"visual": {"energia_pct": 140.0, "bacterias_pct": -3, "co2_pct": 42.5}}"#,
        )
        .unwrap();
        let pcts = r.chart_percentages();
        assert_eq!(pcts[0], (ChartKind::Energy, 100.0));
        assert_eq!(pcts[1], (ChartKind::Bacteria, 0.0));
        assert_eq!(pcts[2], (ChartKind::Co2, 42.5));
    }

    #[test]
    fn history_entry_decodes_backend_keys() {
        let e: HistoryEntry = serde_json::from_str(
            r#"{"fecha": "2025-01-01 10:00:00", "tripulantes": 6, "dias": 90,
                "perfil": "Estándar_mision", "bioAI": "N1",
                "resultados": {"energia": {"total_kw": 3.25}}}"#,
        )
        .unwrap();
        assert_eq!(e.crew_size, Some(6));
        assert_eq!(e.bioai_mode.as_deref(), Some("N1"));
        assert_eq!(e.result.unwrap().energy_kw(), 3.25);
    }

    #[test]
    fn progress_bands_switch_at_half_and_eighty_percent() {
        let mut s = ProgressState::idle(Duration::from_secs(36));
        s.phase = ProgressPhase::Running;
        s.percent = 0.49;
        assert_eq!(s.band(), ProgressBand::Green);
        s.percent = 0.5;
        assert_eq!(s.band(), ProgressBand::Amber);
        s.percent = 0.8;
        assert_eq!(s.band(), ProgressBand::Red);
    }

    #[test]
    fn eta_label_reports_remaining_seconds() {
        let s = ProgressState {
            elapsed: Duration::from_millis(18_000),
            total: Duration::from_secs(36),
            percent: 0.5,
            phase: ProgressPhase::Running,
        };
        assert_eq!(s.eta_label(), "50% — 18.0s left");
    }
}
