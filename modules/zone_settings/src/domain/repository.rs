//! Repository trait for managed-zone bookkeeping
//!
//! Implementations are in infra/storage.

use crate::contract::ManagedZone;
use anyhow::Result;
use async_trait::async_trait;

/// Repository for managed zone records
#[async_trait]
pub trait ManagedZoneRepository: Send + Sync {
    /// Find a record by zone identifier
    async fn find(&self, zone_id: &str) -> Result<Option<ManagedZone>>;

    /// List all records
    async fn list_all(&self) -> Result<Vec<ManagedZone>>;

    /// Create or replace a record
    async fn upsert(&self, zone: &ManagedZone) -> Result<()>;

    /// Delete a record, returning whether it existed
    async fn delete(&self, zone_id: &str) -> Result<bool>;
}
