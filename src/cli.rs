use crate::dashboard::{DashboardState, DisplayedResult, HistoryPanel};
use crate::engine::BioiaClient;
use crate::model::{
    LabEvent, ProgressPhase, SimulationForm, SubmitConfig, DEFAULT_BIOAI_MODE, DEFAULT_PROFILE,
};
use crate::orchestrator::SubmissionController;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "bioia-lab",
    version,
    about = "BIOIA_LAB bioreactor simulation client with optional TUI"
)]
pub struct Cli {
    /// Base URL of the BIOIA backend
    #[arg(long, default_value = "http://localhost:5500")]
    pub base_url: String,

    /// Crew size
    #[arg(long, default_value = "8")]
    pub crew: String,

    /// Mission duration in days
    #[arg(long, default_value = "365")]
    pub days: String,

    /// Waste profile tag
    #[arg(long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// BioAI mode tag (N1, N2, N3, Manual)
    #[arg(long, default_value = DEFAULT_BIOAI_MODE)]
    pub bioai: String,

    /// Total duration of the progress sequence
    #[arg(long, default_value = "36s")]
    pub progress_duration: humantime::Duration,

    /// Progress tick interval
    #[arg(long, default_value = "100ms")]
    pub tick: humantime::Duration,

    /// Give up on a backend request after this long
    #[arg(long, default_value = "60s")]
    pub request_timeout: humantime::Duration,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Only fetch and print the simulation history
    #[arg(long)]
    pub history: bool,

    /// Export the result as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Submit the form values as soon as the TUI starts
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub submit_on_launch: bool,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !(self.json || self.text || self.silent || self.history)
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default level.
pub fn init_logging(args: &Cli) {
    let default_level = if args.silent { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    if args.history {
        return run_history(args).await;
    }

    if args.silent {
        return run_json(args, true).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args, false).await;
    }

    run_text(args).await
}

/// Build a `SubmitConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SubmitConfig {
    SubmitConfig {
        base_url: args.base_url.clone(),
        progress_duration: Duration::from(args.progress_duration),
        tick: Duration::from(args.tick),
        request_timeout: Duration::from(args.request_timeout),
        user_agent: format!("bioia-lab/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// The simulation form as given on the command line.
pub fn build_form(args: &Cli) -> SimulationForm {
    SimulationForm {
        crew: args.crew.clone(),
        days: args.days.clone(),
        profile: args.profile.clone(),
        bioai: args.bioai.clone(),
    }
}

fn build_controller(cfg: &SubmitConfig) -> Result<SubmissionController<BioiaClient>> {
    let client = BioiaClient::new(cfg)?;
    Ok(SubmissionController::new(client, cfg))
}

/// Submit once and print the result as JSON.
async fn run_json(args: Cli, silent: bool) -> Result<()> {
    let cfg = build_config(&args);
    let request = build_form(&args)
        .validate()
        .context("invalid simulation input")?;
    let ctrl = build_controller(&cfg)?;

    // Progress is not shown in JSON mode; events go nowhere.
    let (evt_tx, _) = mpsc::unbounded_channel::<LabEvent>();
    let result = match ctrl.submit(request.clone(), &evt_tx).await {
        Ok(r) => r,
        Err(e) => return Err(anyhow::Error::new(e.clone()).context(e.user_message())),
    };

    let shown = DisplayedResult { request, result };
    crate::orchestrator::run_exports(&args, &shown)?;

    if !silent {
        let (out_tx, out_handle) = spawn_output_writer();
        let out = serde_json::to_string_pretty(&shown.result)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
        drop(out_tx);
        let _ = out_handle.await;
    }
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let request = build_form(&args)
        .validate()
        .context("invalid simulation input")?;
    let ctrl = build_controller(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<LabEvent>();

    let handle = tokio::spawn(async move { ctrl.submit(request, &evt_tx).await });

    let mut state = DashboardState::new(cfg.progress_duration);
    let mut last_decile = None;
    while let Some(ev) = evt_rx.recv().await {
        match &ev {
            LabEvent::SubmissionStarted { .. } => {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "Connecting to backend at {}…",
                    cfg.base_url
                )));
            }
            LabEvent::Progress(p) => {
                // One line per 10% step keeps the log readable.
                let decile = (p.percent * 10.0).floor() as u8;
                if p.phase == ProgressPhase::Running && last_decile != Some(decile) {
                    last_decile = Some(decile);
                    let _ = out_tx.send(OutputLine::Stderr(
                        crate::text_summary::progress_line(p, 30),
                    ));
                }
            }
            LabEvent::SubmissionFailed { message } => {
                let _ = out_tx.send(OutputLine::Stderr(format!("❌ {message}")));
            }
            LabEvent::HistoryFailed { message } => {
                let _ = out_tx.send(OutputLine::Stderr(format!("⚠️ {message}")));
            }
            LabEvent::Info(msg) => {
                let _ = out_tx.send(OutputLine::Stderr(msg.clone()));
            }
            _ => {}
        }
        state.apply(ev);
    }

    let outcome = handle.await.context("submission task failed")?;
    if let Err(e) = outcome {
        drop(out_tx);
        let _ = out_handle.await;
        return Err(anyhow::Error::new(e.clone()).context(e.user_message()));
    }

    if let Some(shown) = state.last_result.as_ref() {
        crate::orchestrator::run_exports(&args, shown)?;
    }
    for line in crate::text_summary::render_dashboard(&state).lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

/// Fetch the history once and print it.
async fn run_history(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let ctrl = build_controller(&cfg)?;
    let (evt_tx, _) = mpsc::unbounded_channel::<LabEvent>();
    let (out_tx, out_handle) = spawn_output_writer();

    let fetched = ctrl.refresh_history(&evt_tx).await;
    let res = match fetched {
        Ok(entries) if args.json => {
            let out = serde_json::to_string_pretty(&entries)?;
            let _ = out_tx.send(OutputLine::Stdout(out));
            Ok(())
        }
        Ok(entries) => {
            let panel = HistoryPanel::Loaded(entries);
            for line in crate::text_summary::build_history_table(&panel).lines {
                let _ = out_tx.send(OutputLine::Stdout(line));
            }
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("could not load history")),
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_web_dashboard() {
        let args = Cli::parse_from(["bioia-lab"]);
        let cfg = build_config(&args);
        assert_eq!(cfg.base_url, "http://localhost:5500");
        assert_eq!(cfg.progress_duration, Duration::from_millis(36_000));
        assert_eq!(cfg.tick, Duration::from_millis(100));
        assert_eq!(cfg.request_timeout, Duration::from_secs(60));
        assert_eq!(build_form(&args), SimulationForm::default());
        assert!(args.is_interactive());
    }

    #[test]
    fn flags_flow_into_config_and_form() {
        let args = Cli::parse_from([
            "bioia-lab",
            "--base-url",
            "https://lab.example",
            "--crew",
            "12",
            "--bioai",
            "N3",
            "--progress-duration",
            "5s",
            "--text",
        ]);
        let cfg = build_config(&args);
        assert_eq!(cfg.base_url, "https://lab.example");
        assert_eq!(cfg.progress_duration, Duration::from_secs(5));
        let req = build_form(&args).validate().unwrap();
        assert_eq!(req.crew_size, 12);
        assert_eq!(req.bioai_mode, "N3");
        assert!(!args.is_interactive());
    }

    #[tokio::test]
    async fn silent_requires_json() {
        let args = Cli::parse_from(["bioia-lab", "--silent"]);
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("--silent can only be used with --json"));
    }
}
