//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{ManagedZone, ZoneSettings, ZoneSettingsApi, ZoneSettingsError};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ZoneSettingsApi for NativeClient {
    async fn manage(
        &self,
        zone_id: &str,
        desired: ZoneSettings,
    ) -> Result<ManagedZone, ZoneSettingsError> {
        self.service.manage(zone_id, desired).await
    }

    async fn update(
        &self,
        zone_id: &str,
        desired: ZoneSettings,
    ) -> Result<ManagedZone, ZoneSettingsError> {
        self.service.update(zone_id, desired).await
    }

    async fn refresh(&self, zone_id: &str) -> Result<Option<ManagedZone>, ZoneSettingsError> {
        self.service.refresh(zone_id).await
    }

    async fn release(&self, zone_id: &str) -> Result<(), ZoneSettingsError> {
        self.service.release(zone_id).await
    }

    async fn forget(&self, zone_id: &str) -> Result<bool, ZoneSettingsError> {
        self.service.forget(zone_id).await
    }

    async fn get(&self, zone_id: &str) -> Result<ManagedZone, ZoneSettingsError> {
        self.service.get(zone_id).await
    }

    async fn list(&self) -> Result<Vec<ManagedZone>, ZoneSettingsError> {
        self.service.list().await
    }
}
