//! Wire DTOs of the Cloudflare v4 API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Zone setting as returned by the settings endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSettingDto {
    pub id: String,
    pub value: Value,
    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

/// Entry of a batch update
#[derive(Debug, Clone, Serialize)]
pub struct SettingItem<'a> {
    pub id: &'a str,
    pub value: &'a Value,
}

/// `PATCH /zones/{zone}/settings`
#[derive(Debug, Serialize)]
pub struct BulkUpdateRequest<'a> {
    pub items: Vec<SettingItem<'a>>,
}

/// `PATCH /zones/{zone}/settings/{id}`
#[derive(Debug, Serialize)]
pub struct SingleUpdateRequest<'a> {
    pub value: &'a Value,
}

/// Universal SSL status, read and written as-is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversalSslDto {
    pub enabled: bool,
}

/// Zone details, only the fields the gateway reports
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
