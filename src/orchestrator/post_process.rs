//! Post-result processing utilities.
//!
//! Handles exports once a result is on screen, for both the CLI and TUI.

use crate::cli::{build_config, Cli};
use crate::dashboard::DisplayedResult;
use crate::storage;
use anyhow::Result;
use std::path::PathBuf;

/// Write the exports requested on the command line. Returns the files written.
pub(crate) fn run_exports(args: &Cli, shown: &DisplayedResult) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if let Some(export_path) = args.export_json.as_deref() {
        storage::export_json(export_path, &build_config(args), shown)?;
        written.push(export_path.to_path_buf());
    }
    Ok(written)
}

/// Run the exports and describe what happened, for a status line.
#[cfg(feature = "tui")]
pub(crate) fn process_result_exports(args: &Cli, shown: &DisplayedResult) -> Vec<String> {
    match run_exports(args, shown) {
        Ok(paths) => paths
            .iter()
            .map(|p| format!("Exported JSON: {}", p.display()))
            .collect(),
        Err(e) => vec![format!("Export JSON failed: {e:#}")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SimulationRequest, SimulationResult};
    use clap::Parser;

    fn shown() -> DisplayedResult {
        DisplayedResult {
            request: SimulationRequest {
                crew_size: 3,
                duration_days: 90,
                profile: "Estándar_mision".into(),
                bioai_mode: "N1".into(),
            },
            result: SimulationResult::default(),
        }
    }

    #[test]
    fn nothing_is_written_without_export_flag() {
        let args = Cli::parse_from(["bioia-lab", "--text"]);
        assert!(run_exports(&args, &shown()).unwrap().is_empty());
    }

    #[test]
    fn export_flag_writes_the_file_with_run_settings() {
        let path = std::env::temp_dir().join(format!("bioia-post-{}.json", std::process::id()));
        let args = Cli::parse_from([
            "bioia-lab",
            "--text",
            "--base-url",
            "http://lab.example:5500",
            "--export-json",
            path.to_str().unwrap(),
        ]);

        let written = run_exports(&args, &shown()).unwrap();
        assert_eq!(written, vec![path.clone()]);
        let raw = std::fs::read_to_string(&path).unwrap();
        let run: storage::ExportedRun = serde_json::from_str(&raw).unwrap();
        assert_eq!(run.config.base_url, "http://lab.example:5500");
        assert_eq!(run.request.bioai_mode, "N1");

        let _ = std::fs::remove_file(&path);
    }

    #[cfg(feature = "tui")]
    #[test]
    fn export_failure_becomes_a_status_message() {
        // A directory cannot be overwritten with a file.
        let dir = std::env::temp_dir();
        let args = Cli::parse_from([
            "bioia-lab",
            "--export-json",
            dir.to_str().unwrap(),
        ]);
        let messages = process_result_exports(&args, &shown());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Export JSON failed"));
    }
}
