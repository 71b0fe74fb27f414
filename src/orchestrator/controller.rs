//! Interactive session controller.
//!
//! Owns submit/refresh/reset orchestration and forwards events for presentation layers.

use super::submission::SubmissionController;
use crate::engine::SimulationBackend;
use crate::error::SubmitError;
use crate::model::{LabEvent, SimulationForm, SimulationResult};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Commands emitted by UI layers to drive the session.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(SimulationForm),
    RefreshHistory,
    /// Abandon any in-flight submission and return progress to idle.
    Reset,
    Quit,
}

fn spawn_submission<B: SimulationBackend + 'static>(
    ctrl: &Arc<SubmissionController<B>>,
    form: SimulationForm,
    event_tx: &UnboundedSender<LabEvent>,
) -> JoinHandle<Result<SimulationResult, SubmitError>> {
    let ctrl = ctrl.clone();
    let event_tx = event_tx.clone();
    tokio::spawn(async move { ctrl.submit_form(&form, &event_tx).await })
}

fn spawn_history<B: SimulationBackend + 'static>(
    ctrl: &Arc<SubmissionController<B>>,
    event_tx: &UnboundedSender<LabEvent>,
) -> JoinHandle<()> {
    let ctrl = ctrl.clone();
    let event_tx = event_tx.clone();
    tokio::spawn(async move {
        let _ = ctrl.refresh_history(&event_tx).await;
    })
}

/// Drive submissions from UI commands until quit. History is loaded once on start.
pub(crate) async fn run_controller<B: SimulationBackend + 'static>(
    ctrl: Arc<SubmissionController<B>>,
    submit_on_launch: Option<SimulationForm>,
    event_tx: UnboundedSender<LabEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut history: Option<JoinHandle<()>> = Some(spawn_history(&ctrl, &event_tx));
    let mut submission =
        submit_on_launch.map(|form| spawn_submission(&ctrl, form, &event_tx));

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(form)) => {
                        if submission.is_some() {
                            let _ = event_tx.send(LabEvent::Info(SubmitError::Busy.user_message()));
                        } else {
                            submission = Some(spawn_submission(&ctrl, form, &event_tx));
                        }
                    }
                    Some(UiCommand::RefreshHistory) => {
                        if let Some(h) = history.take() {
                            h.abort();
                        }
                        history = Some(spawn_history(&ctrl, &event_tx));
                    }
                    Some(UiCommand::Reset) => {
                        if let Some(h) = submission.take() {
                            h.abort();
                            // Wait for the abort so the in-flight flag is clear
                            // before the next submit arrives.
                            let _ = h.await;
                            info!("abandoned in-flight submission");
                        }
                        let _ = event_tx.send(LabEvent::Reset);
                    }
                    Some(UiCommand::Quit) | None => {
                        if let Some(h) = submission.take() {
                            h.abort();
                        }
                        if let Some(h) = history.take() {
                            h.abort();
                        }
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(h) = submission.as_mut() {
                    return Some(h.await);
                }
                futures::future::pending().await
            } => {
                submission = None;
                match maybe_done {
                    Some(Ok(Ok(_))) => debug!("submission finished"),
                    // Already reported through events.
                    Some(Ok(Err(e))) => debug!(error = %e, "submission ended with error"),
                    Some(Err(e)) if !e.is_cancelled() => {
                        let _ = event_tx.send(LabEvent::Info(format!("Submission task failed: {e}")));
                    }
                    _ => {}
                }
            }
        }
    };

    res
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
