use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::model::Report;

/// Remote mirror errors. Connectivity problems are never fatal to the
/// workflow; the caller downgrades them to an offline/sync-error indicator
/// and keeps working from the local cache.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no API base configured; running local-only")]
    Unconfigured,
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected payload: {0}")]
    Decode(String),
}

/// Tri-state connectivity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    Synced,
    Syncing,
    OfflineOrError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub configured: bool,
    pub state: SyncState,
    pub offline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Best-effort client for the persistence adapter. The local store is
/// authoritative: pulls replace it wholesale, pushes mirror single changed
/// reports upstream, and nothing here ever rolls a local mutation back.
pub struct SyncClient {
    base: Option<String>,
    http: reqwest::blocking::Client,
    offline: bool,
    syncing: bool,
    last_error: Option<String>,
}

impl SyncClient {
    pub fn new(base: Option<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        SyncClient {
            base,
            http,
            // Local-only until the first successful pull proves otherwise.
            offline: true,
            syncing: false,
            last_error: None,
        }
    }

    pub fn configured(&self) -> bool {
        self.base.is_some()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn status(&self) -> SyncStatus {
        let state = if self.syncing {
            SyncState::Syncing
        } else if self.offline || self.last_error.is_some() {
            SyncState::OfflineOrError
        } else {
            SyncState::Synced
        };
        SyncStatus {
            configured: self.configured(),
            state,
            offline: self.offline,
            last_error: self.last_error.clone(),
        }
    }

    fn base(&self) -> Result<&str, SyncError> {
        self.base.as_deref().ok_or(SyncError::Unconfigured)
    }

    /// Full snapshot pull. Success flips the client online; any failure
    /// drops to local mode until the next explicit refresh.
    pub fn pull_snapshot(&mut self) -> Result<Vec<Report>, SyncError> {
        let base = self.base()?.to_string();
        let result = self.do_pull(&base);
        match &result {
            Ok(reports) => {
                debug!(count = reports.len(), "remote snapshot pulled");
                self.offline = false;
                self.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, "snapshot pull failed; running in local mode");
                self.offline = true;
                self.last_error = Some(e.to_string());
            }
        }
        result
    }

    fn do_pull(&self, base: &str) -> Result<Vec<Report>, SyncError> {
        let resp = self.http.get(base).send()?;
        let resp = check_status(resp)?;
        let reports: Vec<Report> = resp.json()?;
        Ok(reports)
    }

    /// Upsert one changed report. A failure flags a retryable sync error but
    /// leaves the local mutation in place; the next mutation's push carries
    /// the same report again.
    pub fn push(&mut self, report: &Report) -> Result<(), SyncError> {
        let base = self.base()?.to_string();
        self.syncing = true;
        let result = (|| -> Result<(), SyncError> {
            let resp = self.http.post(&base).json(report).send()?;
            check_status(resp)?;
            Ok(())
        })();
        self.syncing = false;
        match &result {
            Ok(()) => {
                debug!(report_id = %report.id, revision = report.revision, "report pushed");
                self.offline = false;
                self.last_error = None;
            }
            Err(e) => {
                // Deliberately not flipping offline: the next mutation
                // retries the push.
                warn!(report_id = %report.id, error = %e, "cloud save failed; changes kept locally");
                self.last_error = Some(format!("cloud save failed: {e}"));
            }
        }
        result
    }

    /// Diagnostics side-channel: asks the adapter for its current time.
    pub fn probe(&self) -> Result<String, SyncError> {
        let base = self.base()?;
        let url = format!("{base}?test=true");
        let resp = self.http.get(&url).send()?;
        let resp = check_status(resp)?;
        let body: serde_json::Value = resp.json()?;
        if body.get("status").and_then(|v| v.as_str()) != Some("ok") {
            return Err(SyncError::Decode(format!("unexpected probe body: {body}")));
        }
        Ok(body
            .get("time")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    // The adapter reports faults as an opaque { "error": ... } message.
    let message = resp
        .json::<serde_json::Value>()
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| status.to_string());
    Err(SyncError::Status {
        status: status.as_u16(),
        message,
    })
}
