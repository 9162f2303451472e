//! Remote settings gateway
//!
//! The remote exposes three endpoint families: the batch settings endpoint,
//! dedicated per-setting endpoints for a few settings, and a separate
//! on/off feature-status endpoint for universal SSL. Implementations own
//! timeouts and retries; the engine treats any error as terminal.

use crate::contract::{GatewayError, Setting, TargetDetails, ZoneSettingsError};
use async_trait::async_trait;
use serde_json::Value;

/// Gateway over the remote zone settings API
#[async_trait]
pub trait ZoneGateway: Send + Sync {
    /// Read every setting served by the batch endpoint
    async fn read_all(&self, zone_id: &str) -> Result<Vec<Setting>, GatewayError>;

    /// Read one setting through its dedicated endpoint
    async fn read_single(&self, zone_id: &str, setting_id: &str) -> Result<Setting, GatewayError>;

    /// Write one setting through its dedicated endpoint
    async fn write_single(
        &self,
        zone_id: &str,
        setting_id: &str,
        setting: &Setting,
    ) -> Result<(), GatewayError>;

    /// Read the feature toggle
    async fn read_toggle(&self, zone_id: &str) -> Result<bool, GatewayError>;

    /// Write the feature toggle
    async fn write_toggle(&self, zone_id: &str, enabled: bool) -> Result<(), GatewayError>;

    /// Write a batch of settings in one call
    async fn write_many(&self, zone_id: &str, settings: &[Setting]) -> Result<(), GatewayError>;

    /// Zone metadata; `None` when the zone does not exist
    async fn target_details(&self, zone_id: &str) -> Result<Option<TargetDetails>, GatewayError>;

    /// Whether the zone exists
    async fn target_exists(&self, zone_id: &str) -> Result<bool, GatewayError> {
        Ok(self.target_details(zone_id).await?.is_some())
    }
}

// ===== Toggle boundary =====
//
// The toggle-backed setting is an "on"/"off" string everywhere except on the
// toggle endpoint itself.

/// Wrap a toggle state as a regular setting
pub fn toggle_setting(wire_name: &str, enabled: bool) -> Setting {
    Setting::new(wire_name, Value::String(if enabled { "on" } else { "off" }.to_string()))
}

/// Toggle state carried by a setting; `None` for an empty value
///
/// An empty value comes from snapshots taken without toggle information and
/// is never written.
pub fn toggle_flag(setting: &Setting) -> Result<Option<bool>, ZoneSettingsError> {
    match setting.value.as_str() {
        Some("on") => Ok(Some(true)),
        Some("off") => Ok(Some(false)),
        Some("") => Ok(None),
        _ => Err(ZoneSettingsError::encoding(
            &setting.id,
            format!("toggle value must be \"on\" or \"off\", got {}", setting.value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toggle_conversion() {
        let on = toggle_setting("universal_ssl", true);
        assert_eq!(on.value, json!("on"));
        assert!(on.editable);
        assert_eq!(toggle_flag(&on).unwrap(), Some(true));
        assert_eq!(toggle_flag(&toggle_setting("universal_ssl", false)).unwrap(), Some(false));
        assert_eq!(
            toggle_flag(&Setting::new("universal_ssl", json!(""))).unwrap(),
            None
        );
        assert!(toggle_flag(&Setting::new("universal_ssl", json!(true))).is_err());
    }
}
