//! Domain service - managed zone lifecycle orchestration

use super::codec;
use super::engine::Reconciler;
use super::gateway::ZoneGateway;
use super::repository::ManagedZoneRepository;
use crate::contract::{ManagedZone, ZoneSettings, ZoneSettingsError};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Domain service for zone settings overrides
///
/// Keeps one bookkeeping record per managed zone. Callers serialize calls per
/// zone; distinct zones may be handled concurrently.
pub struct Service {
    reconciler: Reconciler,
    repo: Arc<dyn ManagedZoneRepository>,
}

impl Service {
    /// Create a new service instance
    pub fn new(gateway: Arc<dyn ZoneGateway>, repo: Arc<dyn ManagedZoneRepository>) -> Self {
        Self {
            reconciler: Reconciler::new(gateway),
            repo,
        }
    }

    // ===== Lifecycle =====

    /// Start managing a zone: capture its baseline, then apply `desired`
    ///
    /// The record is stored before the first write so the baseline survives
    /// a failed apply.
    pub async fn manage(
        &self,
        zone_id: &str,
        desired: ZoneSettings,
    ) -> Result<ManagedZone, ZoneSettingsError> {
        if self.find(zone_id).await?.is_some() {
            return Err(ZoneSettingsError::AlreadyManaged {
                target: zone_id.to_string(),
            });
        }
        validate_desired(&desired)?;

        info!("Creating zone settings override for zone {:?}", zone_id);

        let baseline = self.reconciler.capture_baseline(zone_id).await?;
        let mut record = ManagedZone::new(zone_id, desired, baseline);
        self.store(&record).await?;

        let observed = self
            .reconciler
            .apply(zone_id, &record.desired, &record.observed)
            .await?;
        record.observe(&observed);
        self.store(&record).await?;

        Ok(record)
    }

    /// Apply a new desired state to a managed zone
    pub async fn update(
        &self,
        zone_id: &str,
        desired: ZoneSettings,
    ) -> Result<ManagedZone, ZoneSettingsError> {
        let mut record = self.require(zone_id).await?;

        let observed = self
            .reconciler
            .apply(zone_id, &desired, &record.observed)
            .await?;
        record.desired = desired;
        record.observe(&observed);
        self.store(&record).await?;

        Ok(record)
    }

    /// Re-read a managed zone
    ///
    /// Returns `None` and drops the record when the zone no longer exists.
    pub async fn refresh(&self, zone_id: &str) -> Result<Option<ManagedZone>, ZoneSettingsError> {
        let mut record = self.require(zone_id).await?;

        let Some(details) = self.reconciler.describe(zone_id).await? else {
            info!("Zone {:?} not found, dropping its override record", zone_id);
            self.remove(zone_id).await?;
            return Ok(None);
        };

        let observed = match self.reconciler.read(zone_id, &record.observed).await {
            Ok(observed) => observed,
            Err(ZoneSettingsError::TargetNotFound { .. }) => {
                info!("Zone {:?} disappeared during read, dropping its override record", zone_id);
                self.remove(zone_id).await?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        record.describe(&details);
        record.observe(&observed);
        self.store(&record).await?;

        Ok(Some(record))
    }

    /// Revert to the baseline, then drop the record
    ///
    /// Nothing is reverted when no settings were ever declared.
    pub async fn release(&self, zone_id: &str) -> Result<(), ZoneSettingsError> {
        let record = self.require(zone_id).await?;

        if !record.desired.is_empty() {
            match self
                .reconciler
                .revert(zone_id, &record.baseline, &record.observed)
                .await
            {
                Ok(_) => {}
                Err(ZoneSettingsError::TargetNotFound { .. }) => {
                    warn!("Zone {:?} no longer exists, nothing to revert", zone_id);
                }
                Err(err) => return Err(err),
            }
        }

        self.remove(zone_id).await?;
        Ok(())
    }

    /// Drop a record without touching the remote zone
    pub async fn forget(&self, zone_id: &str) -> Result<bool, ZoneSettingsError> {
        self.remove(zone_id).await
    }

    // ===== Bookkeeping =====

    /// Get a managed zone record
    pub async fn get(&self, zone_id: &str) -> Result<ManagedZone, ZoneSettingsError> {
        self.require(zone_id).await
    }

    /// List all managed zone records
    pub async fn list(&self) -> Result<Vec<ManagedZone>, ZoneSettingsError> {
        self.repo.list_all().await.map_err(storage_error)
    }

    // ===== Helper Methods =====

    async fn find(&self, zone_id: &str) -> Result<Option<ManagedZone>, ZoneSettingsError> {
        self.repo.find(zone_id).await.map_err(storage_error)
    }

    async fn require(&self, zone_id: &str) -> Result<ManagedZone, ZoneSettingsError> {
        self.find(zone_id)
            .await?
            .ok_or_else(|| ZoneSettingsError::NotManaged {
                target: zone_id.to_string(),
            })
    }

    async fn store(&self, record: &ManagedZone) -> Result<(), ZoneSettingsError> {
        self.repo.upsert(record).await.map_err(storage_error)
    }

    async fn remove(&self, zone_id: &str) -> Result<bool, ZoneSettingsError> {
        self.repo.delete(zone_id).await.map_err(storage_error)
    }
}

/// Reject invalid input before anything is read or stored
fn validate_desired(desired: &ZoneSettings) -> Result<(), ZoneSettingsError> {
    desired
        .iter()
        .try_for_each(|(name, value)| codec::validate(name, value))
}

fn storage_error(err: anyhow::Error) -> ZoneSettingsError {
    error!("Zone override storage failure: {:#}", err);
    ZoneSettingsError::Storage {
        message: format!("{:#}", err),
    }
}
