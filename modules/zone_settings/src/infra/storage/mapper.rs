//! Document to model mappers
//!
//! Conversions between stored documents and contract models

use super::document::{BaselineDocument, ManagedZoneDocument, DOCUMENT_VERSION};
use crate::contract::{Baseline, ManagedZone};
use crate::domain::codec::{restore_snapshot, snapshot_json};
use anyhow::{bail, Context};

// ===== Managed Zone Conversions =====

impl From<&ManagedZone> for ManagedZoneDocument {
    fn from(zone: &ManagedZone) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            zone_id: zone.zone_id.clone(),
            desired: snapshot_json(&zone.desired),
            baseline: (&zone.baseline).into(),
            observed: snapshot_json(&zone.observed),
            read_only: zone.read_only.clone(),
            zone_status: zone.zone_status.clone(),
            zone_type: zone.zone_type.clone(),
        }
    }
}

impl TryFrom<ManagedZoneDocument> for ManagedZone {
    type Error = anyhow::Error;

    fn try_from(doc: ManagedZoneDocument) -> Result<Self, Self::Error> {
        if doc.version > DOCUMENT_VERSION {
            bail!(
                "record for zone '{}' has unsupported version {}",
                doc.zone_id,
                doc.version
            );
        }
        let desired = restore_snapshot(&doc.desired)
            .with_context(|| format!("invalid desired settings for zone '{}'", doc.zone_id))?;
        let observed = restore_snapshot(&doc.observed)
            .with_context(|| format!("invalid observed settings for zone '{}'", doc.zone_id))?;
        let baseline = Baseline::try_from(doc.baseline)
            .with_context(|| format!("invalid baseline for zone '{}'", doc.zone_id))?;

        Ok(Self {
            zone_id: doc.zone_id,
            desired,
            baseline,
            observed,
            read_only: doc.read_only,
            zone_status: doc.zone_status,
            zone_type: doc.zone_type,
        })
    }
}

// ===== Baseline Conversions =====

impl From<&Baseline> for BaselineDocument {
    fn from(baseline: &Baseline) -> Self {
        Self {
            settings: snapshot_json(&baseline.settings),
            read_only: baseline.read_only.clone(),
            captured_at: baseline.captured_at,
        }
    }
}

impl TryFrom<BaselineDocument> for Baseline {
    type Error = anyhow::Error;

    fn try_from(doc: BaselineDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            settings: restore_snapshot(&doc.settings)?,
            read_only: doc.read_only,
            captured_at: doc.captured_at,
        })
    }
}
