//! Managed zone repository implementations

use super::document::ManagedZoneDocument;
use crate::contract::ManagedZone;
use crate::domain::repository::ManagedZoneRepository;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

// ===== In-Memory Repository =====

/// Process-local repository, used by tests and embedders that keep their own
/// persistence
#[derive(Default)]
pub struct InMemoryZoneRepository {
    zones: RwLock<BTreeMap<String, ManagedZone>>,
}

impl InMemoryZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ManagedZoneRepository for InMemoryZoneRepository {
    async fn find(&self, zone_id: &str) -> Result<Option<ManagedZone>> {
        Ok(self.zones.read().get(zone_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ManagedZone>> {
        Ok(self.zones.read().values().cloned().collect())
    }

    async fn upsert(&self, zone: &ManagedZone) -> Result<()> {
        self.zones.write().insert(zone.zone_id.clone(), zone.clone());
        Ok(())
    }

    async fn delete(&self, zone_id: &str) -> Result<bool> {
        Ok(self.zones.write().remove(zone_id).is_some())
    }
}

// ===== File Repository =====

const RECORD_EXTENSION: &str = "json";

/// Repository keeping one JSON document per zone in a directory
///
/// Writes go to a temporary file that is renamed over the record, so a
/// crashed write never leaves a truncated document behind.
pub struct FileZoneRepository {
    dir: PathBuf,
}

impl FileZoneRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, zone_id: &str) -> Result<PathBuf> {
        let valid = !zone_id.is_empty()
            && !zone_id.starts_with('.')
            && zone_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            bail!("invalid zone identifier {:?}", zone_id);
        }
        Ok(self.dir.join(format!("{zone_id}.{RECORD_EXTENSION}")))
    }

    async fn read_record(path: &Path) -> Result<ManagedZone> {
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let doc: ManagedZoneDocument = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        ManagedZone::try_from(doc).with_context(|| format!("failed to load {}", path.display()))
    }
}

#[async_trait]
impl ManagedZoneRepository for FileZoneRepository {
    async fn find(&self, zone_id: &str) -> Result<Option<ManagedZone>> {
        let path = self.record_path(zone_id)?;
        match fs::metadata(&path).await {
            Ok(_) => Ok(Some(Self::read_record(&path).await?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to stat {}", path.display())),
        }
    }

    async fn list_all(&self) -> Result<Vec<ManagedZone>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to list {}", self.dir.display()))
            }
        };

        let mut zones = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(zone) => zones.push(zone),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable zone record: {:#}", e),
            }
        }
        zones.sort_by(|a, b| a.zone_id.cmp(&b.zone_id));
        Ok(zones)
    }

    async fn upsert(&self, zone: &ManagedZone) -> Result<()> {
        let path = self.record_path(&zone.zone_id)?;
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let doc = ManagedZoneDocument::from(zone);
        let body = serde_json::to_vec_pretty(&doc)?;
        let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        fs::write(&tmp, body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))?;

        debug!(zone_id = %zone.zone_id, path = %path.display(), "Stored zone record");
        Ok(())
    }

    async fn delete(&self, zone_id: &str) -> Result<bool> {
        let path = self.record_path(zone_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}
