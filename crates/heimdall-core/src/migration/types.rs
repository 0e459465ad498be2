use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One executed migration edge. Records are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    /// Backup taken before the run this edge belonged to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    pub success: bool,
}
