//! Local export of displayed results.
//!
//! History itself is owned by the backend; only explicit exports touch disk.

use crate::dashboard::DisplayedResult;
use crate::model::{SimulationRequest, SimulationResult, SubmitConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRun {
    pub exported_at: String,
    /// Settings the result was produced under.
    pub config: SubmitConfig,
    pub request: SimulationRequest,
    pub result: SimulationResult,
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

pub fn export_json(path: &Path, config: &SubmitConfig, shown: &DisplayedResult) -> Result<()> {
    let run = ExportedRun {
        exported_at: now_rfc3339(),
        config: config.clone(),
        request: shown.request.clone(),
        result: shown.result.clone(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let body = serde_json::to_vec_pretty(&run).context("serialize export")?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Export into the current directory under a timestamped name.
pub fn export_to_current_dir(config: &SubmitConfig, shown: &DisplayedResult) -> Result<PathBuf> {
    let name = format!(
        "bioia-simulation-{}.json",
        now_rfc3339().replace(':', "-").replace('T', "_")
    );
    let path = std::env::current_dir()
        .context("get current directory")?
        .join(name);
    export_json(&path, config, shown)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NanobotReport;
    use std::time::Duration;

    fn config() -> SubmitConfig {
        SubmitConfig {
            base_url: "http://localhost:5500".into(),
            progress_duration: Duration::from_secs(36),
            tick: Duration::from_millis(100),
            request_timeout: Duration::from_secs(60),
            user_agent: "bioia-lab-test".into(),
        }
    }

    #[test]
    fn export_writes_request_and_result() {
        let dir = std::env::temp_dir().join(format!("bioia-export-{}", std::process::id()));
        let path = dir.join("nested").join("run.json");
        let shown = DisplayedResult {
            request: SimulationRequest {
                crew_size: 5,
                duration_days: 12,
                profile: "Estándar_mision".into(),
                bioai_mode: "N3".into(),
            },
            result: SimulationResult {
                nanobots: Some(NanobotReport { activos: Some(42) }),
                ..Default::default()
            },
        };

        export_json(&path, &config(), &shown).expect("export");
        let raw = std::fs::read_to_string(&path).expect("read back");
        let run: ExportedRun = serde_json::from_str(&raw).expect("parse");
        assert_eq!(run.request, shown.request);
        assert_eq!(run.result.nanobots_active(), 42);
        assert_eq!(run.config, config());
        assert!(raw.contains("\"perfil\""));
        // Durations are written human-readable.
        assert!(raw.contains("\"progress_duration\": \"36s\""));
        assert!(raw.contains("\"tick\": \"100ms\""));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
