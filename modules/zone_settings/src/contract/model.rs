//! Contract models for zone settings overrides
//!
//! These models are transport-agnostic and shared by the engine, the gateway
//! and the storage layer.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;

/// A zone setting as the remote settings API reports or accepts it
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Wire identifier (e.g. "cache_level", "0rtt")
    pub id: String,
    /// Raw wire value
    pub value: Value,
    /// Whether the zone's plan currently allows editing this setting
    pub editable: bool,
}

impl Setting {
    /// Create an editable setting, the form used for writes
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value,
            editable: true,
        }
    }
}

/// Local representation of a setting value
///
/// One variant per registry shape. Nested objects are held unwrapped; the
/// codec adds and removes wire envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// Enumerated or free-form string
    Text(String),
    /// Integer (TTLs, sizes)
    Integer(i64),
    /// List of strings (cipher suites)
    List(Vec<String>),
    /// Minification toggles
    Minify(Minify),
    /// Mobile redirect configuration
    MobileRedirect(MobileRedirect),
    /// HSTS policy of the security header setting
    SecurityHeader(StrictTransportSecurity),
}

impl SettingValue {
    /// Shorthand for a `Text` value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Borrow the string of a `Text` value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Integer(_) => "integer",
            Self::List(_) => "list of strings",
            Self::Minify(_) => "minify object",
            Self::MobileRedirect(_) => "mobile_redirect object",
            Self::SecurityHeader(_) => "security_header object",
        }
    }
}

/// Minification toggles, each "on" or "off"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minify {
    pub css: String,
    pub html: String,
    pub js: String,
}

/// Mobile redirect configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileRedirect {
    /// Subdomain prefix to redirect to; the API reports null while disabled
    pub mobile_subdomain: Option<String>,
    /// Drop the URI path when redirecting
    pub strip_uri: bool,
    /// "on" or "off"
    pub status: String,
}

/// Strict-Transport-Security policy
///
/// Every field is optional: an omitted field is left out of the written
/// object and the API applies its own default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrictTransportSecurity {
    pub enabled: Option<bool>,
    pub preload: Option<bool>,
    pub max_age: Option<i64>,
    pub include_subdomains: Option<bool>,
    pub nosniff: Option<bool>,
}

/// Snapshot of settings keyed by local setting name
///
/// Used for Current, Desired and Baseline alike. Desired is sparse: a missing
/// name means "no opinion". Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSettings {
    values: IndexMap<String, SettingValue>,
}

impl ZoneSettings {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: SettingValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: SettingValue) -> Option<SettingValue> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<SettingValue> {
        self.values.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Copy of this snapshot with `other`'s values laid over it
    pub fn overlaid(&self, other: &ZoneSettings) -> ZoneSettings {
        let mut merged = self.clone();
        for (name, value) in other.iter() {
            merged.insert(name, value.clone());
        }
        merged
    }
}

impl FromIterator<(String, SettingValue)> for ZoneSettings {
    fn from_iter<I: IntoIterator<Item = (String, SettingValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Pre-management snapshot used for revert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// Full read of the zone (bulk + single-fetch + toggle)
    pub settings: ZoneSettings,
    /// Names that were non-editable at capture time
    pub read_only: BTreeSet<String>,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

/// Externally observable state produced by a read cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    /// Decoded settings in registry order
    pub settings: ZoneSettings,
    /// Names currently reported non-editable
    pub read_only: BTreeSet<String>,
}

impl ObservedState {
    /// Restrict the observed settings to the names `desired` has an opinion on
    pub fn managed_view(&self, desired: &ZoneSettings) -> ZoneSettings {
        self.settings
            .iter()
            .filter(|(name, _)| desired.contains(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

/// Zone metadata used to tell "gone" from other failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDetails {
    pub id: String,
    pub name: String,
    /// Zone status (e.g. "active", "pending")
    pub status: String,
    /// Zone type (e.g. "full", "partial")
    pub kind: Option<String>,
}

/// Bookkeeping for one managed zone, owned by the caller's storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedZone {
    pub zone_id: String,
    /// User-declared target settings
    pub desired: ZoneSettings,
    /// Captured once, never mutated
    pub baseline: Baseline,
    /// Last observed values of the managed names
    pub observed: ZoneSettings,
    /// Read-only names from the latest read
    pub read_only: BTreeSet<String>,
    pub zone_status: Option<String>,
    pub zone_type: Option<String>,
}

impl ManagedZone {
    /// Start bookkeeping for a zone whose baseline was just captured
    pub fn new(zone_id: impl Into<String>, desired: ZoneSettings, baseline: Baseline) -> Self {
        let read_only = baseline.read_only.clone();
        Self {
            zone_id: zone_id.into(),
            desired,
            baseline,
            observed: ZoneSettings::new(),
            read_only,
            zone_status: None,
            zone_type: None,
        }
    }

    /// Record the outcome of a read or apply cycle
    pub fn observe(&mut self, observed: &ObservedState) {
        self.observed = observed.managed_view(&self.desired);
        self.read_only = observed.read_only.clone();
    }

    /// Record zone metadata
    pub fn describe(&mut self, details: &TargetDetails) {
        self.zone_status = Some(details.status.clone());
        self.zone_type = details.kind.clone();
    }
}
