//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to manage zone settings
//! overrides. NO HTTP - direct function calls.

use super::{error::ZoneSettingsError, model::{ManagedZone, ZoneSettings}};
use async_trait::async_trait;

/// Zone settings override API for inter-module communication
#[async_trait]
pub trait ZoneSettingsApi: Send + Sync {
    // ===== Lifecycle =====

    /// Capture the zone's baseline and apply the desired settings
    async fn manage(
        &self,
        zone_id: &str,
        desired: ZoneSettings,
    ) -> Result<ManagedZone, ZoneSettingsError>;

    /// Apply a new desired state to a managed zone
    async fn update(
        &self,
        zone_id: &str,
        desired: ZoneSettings,
    ) -> Result<ManagedZone, ZoneSettingsError>;

    /// Re-read a managed zone; `None` when the zone no longer exists
    async fn refresh(&self, zone_id: &str) -> Result<Option<ManagedZone>, ZoneSettingsError>;

    /// Revert to the baseline and stop managing the zone
    async fn release(&self, zone_id: &str) -> Result<(), ZoneSettingsError>;

    /// Drop bookkeeping without touching the remote zone
    async fn forget(&self, zone_id: &str) -> Result<bool, ZoneSettingsError>;

    // ===== Bookkeeping =====

    /// Get a managed zone record
    async fn get(&self, zone_id: &str) -> Result<ManagedZone, ZoneSettingsError>;

    /// List all managed zone records
    async fn list(&self) -> Result<Vec<ManagedZone>, ZoneSettingsError>;
}
