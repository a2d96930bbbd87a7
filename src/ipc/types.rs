use std::path::PathBuf;

use serde::Deserialize;

use crate::db::ReportStore;
use crate::session::Session;
use crate::sync::SyncClient;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<ReportStore>,
    pub session: Option<Session>,
    pub sync: SyncClient,
}

impl AppState {
    pub fn new(api_base: Option<String>) -> Self {
        AppState {
            workspace: None,
            store: None,
            session: None,
            sync: SyncClient::new(api_base),
        }
    }
}
