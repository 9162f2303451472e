//! Serialized form of a managed zone record
//!
//! Setting snapshots are kept as JSON objects keyed by local setting name, in
//! the same local representation users write desired settings in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Current document layout version
pub const DOCUMENT_VERSION: u32 = 1;

/// Managed zone record as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedZoneDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub zone_id: String,
    #[serde(default)]
    pub desired: Map<String, Value>,
    pub baseline: BaselineDocument,
    #[serde(default)]
    pub observed: Map<String, Value>,
    #[serde(default)]
    pub read_only: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,
}

/// Captured pre-management state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineDocument {
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub read_only: BTreeSet<String>,
    pub captured_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}
