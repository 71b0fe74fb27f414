use super::SimulationBackend;
use crate::error::BackendError;
use crate::model::{HistoryEntry, SimulationRequest, SimulationResult, SubmitConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const SIMULATE_PATH: &str = "/api/calcular";
const HISTORY_PATH: &str = "/api/historial";

/// HTTP client for the BIOIA backend.
#[derive(Clone)]
pub struct BioiaClient {
    http: reqwest::Client,
    base_url: String,
}

impl BioiaClient {
    pub fn new(cfg: &SubmitConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Check the status, then decode the body. Decoding is done by hand so a bad
/// payload is reported as `Decode` rather than a transport failure.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(BackendError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl SimulationBackend for BioiaClient {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, BackendError> {
        let url = self.url(SIMULATE_PATH);
        debug!(%url, "posting simulation request");
        let resp = self.http.post(&url).json(request).send().await?;
        read_json(resp).await
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError> {
        let url = self.url(HISTORY_PATH);
        debug!(%url, "fetching history");
        let resp = self.http.get(&url).send().await?;
        let value: serde_json::Value = read_json(resp).await?;
        match value {
            serde_json::Value::Array(items) => Ok(items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| match serde_json::from_value::<HistoryEntry>(item) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        // One malformed row must not blank the whole table.
                        warn!(index, error = %e, "skipping unreadable history entry");
                        None
                    }
                })
                .collect()),
            other => {
                // Anything but an array reads as "no history yet".
                warn!(kind = json_kind(&other), "history payload is not an array");
                Ok(Vec::new())
            }
        }
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
