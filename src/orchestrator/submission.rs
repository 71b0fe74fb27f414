//! Submission lifecycle.
//!
//! Runs the backend request and the progress sequence side by side and only
//! reveals a result once both are done.

use crate::engine::progress::ProgressSequence;
use crate::engine::SimulationBackend;
use crate::error::{BackendError, SubmitError};
use crate::model::{
    HistoryEntry, LabEvent, SimulationForm, SimulationRequest, SimulationResult, SubmitConfig,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub const HISTORY_UNAVAILABLE: &str =
    "Could not load history. Check that the backend is running.";

pub struct SubmissionController<B> {
    backend: B,
    progress_total: Duration,
    tick: Duration,
    request_timeout: Duration,
    in_flight: AtomicBool,
    /// Ticket of the most recent history refresh.
    history_seq: AtomicU64,
}

/// Clears the in-flight flag on every exit path, including task abort.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: SimulationBackend> SubmissionController<B> {
    pub fn new(backend: B, cfg: &SubmitConfig) -> Self {
        Self {
            backend,
            progress_total: cfg.progress_duration,
            tick: cfg.tick,
            request_timeout: cfg.request_timeout,
            in_flight: AtomicBool::new(false),
            history_seq: AtomicU64::new(0),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    /// Validate raw inputs, then submit.
    pub async fn submit_form(
        &self,
        form: &SimulationForm,
        events: &UnboundedSender<LabEvent>,
    ) -> Result<SimulationResult, SubmitError> {
        let request = match form.validate() {
            Ok(r) => r,
            Err(e) => {
                let err = SubmitError::from(e);
                let _ = events.send(LabEvent::SubmissionFailed {
                    message: err.user_message(),
                });
                return Err(err);
            }
        };
        self.submit(request, events).await
    }

    pub async fn submit(
        &self,
        request: SimulationRequest,
        events: &UnboundedSender<LabEvent>,
    ) -> Result<SimulationResult, SubmitError> {
        let Some(_guard) = self.try_begin() else {
            let _ = events.send(LabEvent::Info(SubmitError::Busy.user_message()));
            return Err(SubmitError::Busy);
        };

        info!(
            crew = request.crew_size,
            days = request.duration_days,
            profile = %request.profile,
            bioai = %request.bioai_mode,
            "submitting simulation"
        );
        let _ = events.send(LabEvent::SubmissionStarted {
            request: request.clone(),
        });

        let mut sequence = ProgressSequence::new(self.progress_total, self.tick);
        // Fresh sequence, cannot be running.
        let _ = sequence.start();
        let _ = events.send(LabEvent::Progress(sequence.state().clone()));
        let report = |s: &crate::model::ProgressState| {
            let _ = events.send(LabEvent::Progress(s.clone()));
        };

        let network = tokio::time::timeout(self.request_timeout, self.backend.simulate(&request));
        tokio::pin!(network);
        let early = tokio::select! {
            res = &mut network => Some(res),
            _ = sequence.run(report) => None,
        };
        let outcome = match early {
            Some(res) => res,
            None => network.await,
        }
        .unwrap_or_else(|_| Err(BackendError::Timeout(self.request_timeout)));

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "simulation request failed");
                sequence.finish(false);
                let _ = events.send(LabEvent::Progress(sequence.state().clone()));
                let _ = events.send(LabEvent::SubmissionFailed {
                    message: err.user_message().into(),
                });
                return Err(err.into());
            }
        };

        // The response may arrive long before the sequence ends; hold it back.
        sequence.run(report).await;
        sequence.finish(true);
        let _ = events.send(LabEvent::Progress(sequence.state().clone()));
        info!(
            energy_kw = result.energy_kw(),
            nanobots = result.nanobots_active(),
            "simulation result ready"
        );
        let _ = events.send(LabEvent::ResultReady {
            request: request.clone(),
            result: Box::new(result.clone()),
        });

        // A failed refresh is reported on its own and does not undo the result.
        let _ = self.refresh_history(events).await;
        Ok(result)
    }

    /// Fetch the full history and publish it.
    ///
    /// Overlapping refreshes only publish the newest one; a slower, older
    /// response is returned to the caller but never reaches the screen.
    pub async fn refresh_history(
        &self,
        events: &UnboundedSender<LabEvent>,
    ) -> Result<Vec<HistoryEntry>, BackendError> {
        let ticket = self.history_seq.fetch_add(1, Ordering::AcqRel) + 1;
        let outcome = tokio::time::timeout(self.request_timeout, self.backend.history())
            .await
            .unwrap_or_else(|_| Err(BackendError::Timeout(self.request_timeout)));
        if self.history_seq.load(Ordering::Acquire) != ticket {
            debug!(ticket, "superseded history response dropped");
            return outcome;
        }
        match outcome {
            Ok(entries) => {
                info!(count = entries.len(), "history loaded");
                let _ = events.send(LabEvent::HistoryLoaded {
                    entries: entries.clone(),
                });
                Ok(entries)
            }
            Err(err) => {
                warn!(error = %err, "history refresh failed");
                let _ = events.send(LabEvent::HistoryFailed {
                    message: HISTORY_UNAVAILABLE.into(),
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
