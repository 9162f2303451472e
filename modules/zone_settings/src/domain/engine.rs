//! Reconciliation engine
//!
//! A cycle runs: collect read-only names -> compute write-set -> dispatch ->
//! re-read. The write-set is computed completely before the first remote
//! write, so a read-only violation never leaves the zone half written.
//! Writes already committed when a later dispatch call fails are kept; the
//! next cycle sees them through its own read.

use super::codec;
use super::gateway::{self, ZoneGateway};
use super::registry::{self, Route, SettingDescriptor, POLISH, WEBP};
use crate::contract::{
    Baseline, GatewayError, ObservedState, Phase, Setting, SettingValue, SubProtocol,
    TargetDetails, ZoneSettings, ZoneSettingsError,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Decoded result of one full remote read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteState {
    /// Known settings in registry order
    pub settings: ZoneSettings,
    /// Known names the remote reports as non-editable
    pub read_only: BTreeSet<String>,
}

impl RemoteState {
    /// Decode raw remote settings, logging and skipping what cannot be used
    pub fn from_settings(raw: &[Setting]) -> Self {
        let mut decoded: HashMap<&'static str, SettingValue> = HashMap::new();
        let mut read_only = BTreeSet::new();

        for setting in raw {
            match codec::decode(&setting.id, &setting.value) {
                Ok((desc, value)) => {
                    if !setting.editable {
                        read_only.insert(desc.name.to_string());
                    }
                    decoded.insert(desc.name, value);
                }
                Err(ZoneSettingsError::UnknownSetting { name }) => {
                    warn!(
                        "Value not in registry returned from zone settings API (is it new?) - {:?}: {}",
                        name, setting.value
                    );
                }
                Err(err) => {
                    warn!("Skipping unexpected value in zone settings API response: {}", err);
                }
            }
        }

        let settings = registry::all()
            .filter_map(|d| decoded.remove(d.name).map(|v| (d.name.to_string(), v)))
            .collect();

        Self { settings, read_only }
    }
}

/// One setting scheduled for writing
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub descriptor: &'static SettingDescriptor,
    /// Wire-encoded setting
    pub setting: Setting,
}

/// Settings to write in one cycle, in registry order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSet {
    writes: Vec<PlannedWrite>,
}

/// Write-set split by endpoint family
#[derive(Debug, Default)]
pub struct Partition {
    pub toggle: Option<PlannedWrite>,
    pub single: Vec<PlannedWrite>,
    pub bulk: Vec<PlannedWrite>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedWrite> {
        self.writes.iter()
    }

    /// Local names in write order
    pub fn names(&self) -> Vec<&'static str> {
        self.writes.iter().map(|w| w.descriptor.name).collect()
    }

    /// Split into toggle, single-fetch and bulk writes, keeping registry order
    pub fn partition(self) -> Partition {
        let mut partition = Partition::default();
        for write in self.writes {
            match write.descriptor.route {
                Route::Toggle => partition.toggle = Some(write),
                Route::Single => partition.single.push(write),
                Route::Bulk => partition.bulk.push(write),
            }
        }
        partition
    }
}

/// Compute the writes that bring `current` to `desired`
///
/// Only names present in `desired` whose value differs from `current` are
/// considered. Changing a read-only setting is an error; nothing has been
/// written when it is returned.
pub fn plan_apply(
    desired: &ZoneSettings,
    current: &RemoteState,
) -> Result<WriteSet, ZoneSettingsError> {
    for (name, value) in desired.iter() {
        codec::validate(name, value)?;
    }

    let polish = desired.get(POLISH).or_else(|| current.settings.get(POLISH));
    let mut writes = Vec::new();

    for desc in registry::all() {
        let Some(wanted) = desired.get(desc.name) else {
            continue;
        };
        let wanted = &codec::fill_omitted(wanted, current.settings.get(desc.name));
        if current.settings.get(desc.name) == Some(wanted) {
            continue;
        }
        if current.read_only.contains(desc.name) {
            return Err(ZoneSettingsError::ReadOnlyViolation {
                name: desc.name.to_string(),
                value: codec::local_json(wanted).to_string(),
            });
        }
        if let Some(hint) = desc.deprecation {
            warn!("Zone setting '{}' is deprecated: {}", desc.name, hint);
        }
        if let Some(setting) = candidate(desc, wanted, polish)? {
            writes.push(PlannedWrite {
                descriptor: desc,
                setting,
            });
        }
    }

    Ok(WriteSet { writes })
}

/// Compute the writes that bring `current` back to `baseline`
///
/// Read-only names are left out silently.
pub fn plan_revert(
    baseline: &Baseline,
    current: &RemoteState,
) -> Result<WriteSet, ZoneSettingsError> {
    let polish = baseline.settings.get(POLISH);
    let mut writes = Vec::new();

    for desc in registry::all() {
        let Some(initial) = baseline.settings.get(desc.name) else {
            continue;
        };
        if current.settings.get(desc.name) == Some(initial) {
            continue;
        }
        if current.read_only.contains(desc.name) {
            debug!("Not reverting read-only zone setting '{}'", desc.name);
            continue;
        }
        if let Some(setting) = candidate(desc, initial, polish)? {
            writes.push(PlannedWrite {
                descriptor: desc,
                setting,
            });
        }
    }

    Ok(WriteSet { writes })
}

/// Encode one write; `None` when the coupling rules suppress it
fn candidate(
    desc: &'static SettingDescriptor,
    value: &SettingValue,
    polish: Option<&SettingValue>,
) -> Result<Option<Setting>, ZoneSettingsError> {
    if desc.name == WEBP && !codec::webp_allowed(polish) {
        debug!("Skipping webp, it only applies while polish is enabled");
        return Ok(None);
    }

    let setting = codec::encode(desc.name, value)?;
    if desc.route == Route::Toggle && gateway::toggle_flag(&setting)?.is_none() {
        debug!("Skipping {} update, no value recorded", desc.name);
        return Ok(None);
    }

    Ok(Some(setting))
}

fn remote(
    phase: Phase,
    protocol: SubProtocol,
    setting: Option<String>,
    source: GatewayError,
) -> ZoneSettingsError {
    ZoneSettingsError::RemoteCall {
        phase,
        protocol,
        setting,
        source,
    }
}

fn observe(state: RemoteState, prior: &ZoneSettings) -> ObservedState {
    let mut settings = state.settings;
    codec::preserve_webp(&mut settings, prior);
    ObservedState {
        settings,
        read_only: state.read_only,
    }
}

/// Runs reconciliation cycles for zones through a gateway
///
/// Holds no per-zone state; every call works on the values passed in.
#[derive(Clone)]
pub struct Reconciler {
    gateway: Arc<dyn ZoneGateway>,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn ZoneGateway>) -> Self {
        Self { gateway }
    }

    /// Zone metadata; `None` when the zone is gone
    pub async fn describe(&self, zone_id: &str) -> Result<Option<TargetDetails>, ZoneSettingsError> {
        self.gateway
            .target_details(zone_id)
            .await
            .map_err(|source| remote(Phase::Read, SubProtocol::Target, None, source))
    }

    /// Full read: bulk, then each single-fetch setting, then the toggle
    pub async fn fetch(&self, zone_id: &str, phase: Phase) -> Result<RemoteState, ZoneSettingsError> {
        let bulk = match self.gateway.read_all(zone_id).await {
            Ok(settings) => settings,
            Err(source) => return Err(self.read_failure(zone_id, phase, source).await),
        };

        // Dedicated endpoints are authoritative for their settings
        let mut raw: Vec<Setting> = bulk
            .into_iter()
            .filter(|s| registry::lookup_wire(&s.id).map_or(true, |d| d.route == Route::Bulk))
            .collect();

        for desc in registry::with_route(Route::Single) {
            let setting = self
                .gateway
                .read_single(zone_id, desc.wire_name)
                .await
                .map_err(|source| {
                    remote(phase, SubProtocol::Single, Some(desc.name.to_string()), source)
                })?;
            raw.push(setting);
        }

        for desc in registry::with_route(Route::Toggle) {
            let enabled = self.gateway.read_toggle(zone_id).await.map_err(|source| {
                remote(phase, SubProtocol::Toggle, Some(desc.name.to_string()), source)
            })?;
            raw.push(gateway::toggle_setting(desc.wire_name, enabled));
        }

        let state = RemoteState::from_settings(&raw);
        debug!(
            zone_id,
            settings = state.settings.len(),
            read_only = ?state.read_only,
            "Read zone settings"
        );
        Ok(state)
    }

    /// Read the zone as it should be reported to the caller
    ///
    /// `prior` is the previously stored local snapshot; it supplies `webp`
    /// while `polish` is off.
    pub async fn read(
        &self,
        zone_id: &str,
        prior: &ZoneSettings,
    ) -> Result<ObservedState, ZoneSettingsError> {
        let state = self.fetch(zone_id, Phase::Read).await?;
        Ok(observe(state, prior))
    }

    /// Apply a desired (sparse) state and return the re-read result
    pub async fn apply(
        &self,
        zone_id: &str,
        desired: &ZoneSettings,
        prior: &ZoneSettings,
    ) -> Result<ObservedState, ZoneSettingsError> {
        let current = self.fetch(zone_id, Phase::Read).await?;
        let plan = plan_apply(desired, &current)?;

        if plan.is_empty() {
            debug!(zone_id, "No zone setting changes to apply");
        } else {
            info!(zone_id, settings = ?plan.names(), "Updating zone settings");
            self.dispatch(zone_id, plan).await?;
        }

        let after = self.fetch(zone_id, Phase::Reread).await?;
        Ok(observe(after, &prior.overlaid(desired)))
    }

    /// Restore every setting that drifted from the baseline
    pub async fn revert(
        &self,
        zone_id: &str,
        baseline: &Baseline,
        prior: &ZoneSettings,
    ) -> Result<ObservedState, ZoneSettingsError> {
        let current = self.fetch(zone_id, Phase::Read).await?;
        let plan = plan_revert(baseline, &current)?;

        if plan.is_empty() {
            debug!(zone_id, "Skipped revert, no settings changed since the baseline");
        } else {
            info!(zone_id, settings = ?plan.names(), "Reverting zone settings to baseline");
            self.dispatch(zone_id, plan).await?;
        }

        let after = self.fetch(zone_id, Phase::Reread).await?;
        Ok(observe(after, prior))
    }

    /// Write a write-set: toggle, then single-fetch settings, then one batch
    ///
    /// Stops at the first failing call.
    pub async fn dispatch(&self, zone_id: &str, plan: WriteSet) -> Result<(), ZoneSettingsError> {
        let Partition {
            toggle,
            single,
            bulk,
        } = plan.partition();

        if let Some(write) = toggle {
            if let Some(enabled) = gateway::toggle_flag(&write.setting)? {
                self.gateway
                    .write_toggle(zone_id, enabled)
                    .await
                    .map_err(|source| {
                        remote(
                            Phase::Dispatch,
                            SubProtocol::Toggle,
                            Some(write.descriptor.name.to_string()),
                            source,
                        )
                    })?;
            }
        }

        for write in &single {
            self.gateway
                .write_single(zone_id, &write.setting.id, &write.setting)
                .await
                .map_err(|source| {
                    remote(
                        Phase::Dispatch,
                        SubProtocol::Single,
                        Some(write.descriptor.name.to_string()),
                        source,
                    )
                })?;
        }

        if bulk.is_empty() {
            debug!(zone_id, "Skipped bulk update call because no bulk settings changed");
            return Ok(());
        }

        let names = bulk
            .iter()
            .map(|w| w.descriptor.name)
            .collect::<Vec<_>>()
            .join(", ");
        let settings: Vec<Setting> = bulk.into_iter().map(|w| w.setting).collect();
        self.gateway
            .write_many(zone_id, &settings)
            .await
            .map_err(|source| remote(Phase::Dispatch, SubProtocol::Bulk, Some(names), source))
    }

    async fn read_failure(
        &self,
        zone_id: &str,
        phase: Phase,
        source: GatewayError,
    ) -> ZoneSettingsError {
        match self.gateway.target_exists(zone_id).await {
            Ok(false) => {
                info!("Zone {:?} not found", zone_id);
                ZoneSettingsError::TargetNotFound {
                    target: zone_id.to_string(),
                }
            }
            Ok(true) | Err(_) => remote(phase, SubProtocol::Bulk, None, source),
        }
    }
}
