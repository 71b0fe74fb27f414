//! Displayable state derived from controller events.
//!
//! The controller never touches this directly; UI and CLI layers feed every
//! `LabEvent` through [`DashboardState::apply`] and render from the result.

use crate::model::{
    HistoryEntry, LabEvent, ProgressPhase, ProgressState, SimulationRequest, SimulationResult,
};
use std::time::Duration;

/// The last result that made it to the screen, with the inputs that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedResult {
    pub request: SimulationRequest,
    pub result: SimulationResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPanel {
    NotLoaded,
    /// Oldest first, exactly as received.
    Loaded(Vec<HistoryEntry>),
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub status: String,
    pub eta: String,
    pub progress: ProgressState,
    pub in_flight: bool,
    pub pending_request: Option<SimulationRequest>,
    pub last_result: Option<DisplayedResult>,
    pub history: HistoryPanel,
}

impl DashboardState {
    pub fn new(progress_total: Duration) -> Self {
        let progress = ProgressState::idle(progress_total);
        Self {
            status: "Ready".into(),
            eta: progress.eta_label(),
            progress,
            in_flight: false,
            pending_request: None,
            last_result: None,
            history: HistoryPanel::NotLoaded,
        }
    }

    pub fn apply(&mut self, ev: LabEvent) {
        match ev {
            LabEvent::SubmissionStarted { request } => {
                self.in_flight = true;
                self.pending_request = Some(request);
                self.progress = ProgressState::idle(self.progress.total);
                self.status = "Connecting to backend…".into();
            }
            LabEvent::Progress(p) => {
                self.eta = p.eta_label();
                self.progress = p;
            }
            LabEvent::ResultReady { request, result } => {
                self.last_result = Some(DisplayedResult {
                    request,
                    result: *result,
                });
                self.in_flight = false;
                self.pending_request = None;
                self.status = "Ready ✔".into();
            }
            LabEvent::SubmissionFailed { message } => {
                // The previous result stays on screen.
                self.in_flight = false;
                self.pending_request = None;
                if self.progress.phase == ProgressPhase::Failed {
                    self.eta = self.progress.eta_label();
                }
                self.status = format!("❌ {message}");
            }
            LabEvent::HistoryLoaded { entries } => {
                self.history = HistoryPanel::Loaded(entries);
            }
            LabEvent::HistoryFailed { message } => {
                self.history = HistoryPanel::Unavailable(message);
            }
            LabEvent::Reset => self.reset_progress(),
            LabEvent::Info(msg) => self.status = msg,
        }
    }

    /// Back to the idle "waiting" state. Results and history are kept.
    pub fn reset_progress(&mut self) {
        self.progress = ProgressState::idle(self.progress.total);
        self.eta = self.progress.eta_label();
        self.in_flight = false;
        self.pending_request = None;
        self.status = "Ready".into();
    }
}
