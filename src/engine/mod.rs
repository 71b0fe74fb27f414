mod bioia;
pub mod progress;

pub use bioia::BioiaClient;

use crate::error::BackendError;
use crate::model::{HistoryEntry, SimulationRequest, SimulationResult};
use async_trait::async_trait;

/// The two remote operations the submission flow depends on.
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// Run one simulation on the backend.
    async fn simulate(&self, request: &SimulationRequest)
        -> Result<SimulationResult, BackendError>;

    /// Fetch the full history, oldest first.
    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError>;
}
