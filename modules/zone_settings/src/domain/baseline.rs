//! Baseline capture
//!
//! The baseline is the zone's state before any managed write. It is taken
//! once, when management starts, and only replaced by releasing and
//! re-managing the zone.

use super::engine::Reconciler;
use crate::contract::{Baseline, Phase, ZoneSettingsError};
use chrono::{SecondsFormat, Utc};
use tracing::info;

impl Reconciler {
    /// Full read of the zone stored verbatim with a capture timestamp
    pub async fn capture_baseline(&self, zone_id: &str) -> Result<Baseline, ZoneSettingsError> {
        let state = self.fetch(zone_id, Phase::Read).await?;
        let baseline = Baseline {
            settings: state.settings,
            read_only: state.read_only,
            captured_at: Utc::now(),
        };

        info!(
            zone_id,
            settings = baseline.settings.len(),
            read_only = baseline.read_only.len(),
            captured_at = %baseline.captured_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            "Captured zone baseline"
        );
        Ok(baseline)
    }
}
