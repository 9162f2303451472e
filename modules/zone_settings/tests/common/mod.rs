//! Common test utilities: a recording in-memory gateway and zone fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use zone_settings::contract::{GatewayError, Setting, SettingValue, TargetDetails, ZoneSettings};
use zone_settings::domain::ZoneGateway;

pub const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";

/// Wire identifiers served by dedicated endpoints
const SINGLE_IDS: &[&str] = &["h2_prioritization", "image_resizing", "binary_ast", "early_hints"];

/// One gateway call, as recorded by [`MockGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ReadAll,
    ReadSingle(String),
    WriteSingle(String, Value),
    ReadToggle,
    WriteToggle(bool),
    /// Batch write with `(wire id, value)` pairs in request order
    WriteMany(Vec<(String, Value)>),
    TargetDetails,
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Call::WriteSingle(..) | Call::WriteToggle(_) | Call::WriteMany(_)
        )
    }
}

struct MockState {
    zone: Option<TargetDetails>,
    /// Wire id -> setting, in insertion order
    settings: Vec<Setting>,
    universal_ssl: bool,
    calls: Vec<Call>,
    /// Failing operations keyed by `"op"` or `"op:wire_id"`
    failures: HashMap<String, GatewayError>,
}

/// In-memory zone that applies writes like the remote does
#[derive(Clone)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Zone populated with [`default_remote_settings`]
    pub fn new() -> Self {
        Self::with_settings(default_remote_settings())
    }

    pub fn with_settings(settings: Vec<Setting>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                zone: Some(TargetDetails {
                    id: ZONE_ID.to_string(),
                    name: "example.com".to_string(),
                    status: "active".to_string(),
                    kind: Some("full".to_string()),
                }),
                settings,
                universal_ssl: true,
                calls: Vec::new(),
                failures: HashMap::new(),
            })),
        }
    }

    /// Make every call to `key` fail, e.g. `"write_many"` or `"write_single:early_hints"`
    pub fn fail(&self, key: &str, err: GatewayError) {
        self.state.lock().failures.insert(key.to_string(), err);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Delete the zone; reads fail with not-found afterwards
    pub fn remove_zone(&self) {
        self.state.lock().zone = None;
    }

    /// Change a remote value behind the engine's back
    pub fn set_remote(&self, wire_id: &str, value: Value) {
        let mut state = self.state.lock();
        match state.settings.iter_mut().find(|s| s.id == wire_id) {
            Some(setting) => setting.value = value,
            None => state.settings.push(Setting::new(wire_id, value)),
        }
    }

    pub fn remote(&self, wire_id: &str) -> Option<Value> {
        let state = self.state.lock();
        state
            .settings
            .iter()
            .find(|s| s.id == wire_id)
            .map(|s| s.value.clone())
    }

    pub fn universal_ssl(&self) -> bool {
        self.state.lock().universal_ssl
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Record a call and return the injected failure for it, if any
    fn record(&self, call: Call, key: &str, wire_id: Option<&str>) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if let Some(err) = wire_id
            .and_then(|id| state.failures.get(&format!("{key}:{id}")))
            .or_else(|| state.failures.get(key))
        {
            return Err(err.clone());
        }
        if state.zone.is_none() {
            return Err(GatewayError::NotFound {
                resource: format!("zone {}", ZONE_ID),
            });
        }
        Ok(())
    }

    fn store(&self, setting: &Setting) {
        let mut state = self.state.lock();
        match state.settings.iter_mut().find(|s| s.id == setting.id) {
            Some(existing) => existing.value = setting.value.clone(),
            None => state.settings.push(setting.clone()),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ZoneGateway for MockGateway {
    async fn read_all(&self, _zone_id: &str) -> Result<Vec<Setting>, GatewayError> {
        self.record(Call::ReadAll, "read_all", None)?;
        let state = self.state.lock();
        Ok(state
            .settings
            .iter()
            .filter(|s| !SINGLE_IDS.contains(&s.id.as_str()))
            .cloned()
            .collect())
    }

    async fn read_single(&self, _zone_id: &str, setting_id: &str) -> Result<Setting, GatewayError> {
        self.record(
            Call::ReadSingle(setting_id.to_string()),
            "read_single",
            Some(setting_id),
        )?;
        let state = self.state.lock();
        state
            .settings
            .iter()
            .find(|s| s.id == setting_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                resource: format!("setting {}", setting_id),
            })
    }

    async fn write_single(
        &self,
        _zone_id: &str,
        setting_id: &str,
        setting: &Setting,
    ) -> Result<(), GatewayError> {
        self.record(
            Call::WriteSingle(setting_id.to_string(), setting.value.clone()),
            "write_single",
            Some(setting_id),
        )?;
        self.store(setting);
        Ok(())
    }

    async fn read_toggle(&self, _zone_id: &str) -> Result<bool, GatewayError> {
        self.record(Call::ReadToggle, "read_toggle", None)?;
        Ok(self.state.lock().universal_ssl)
    }

    async fn write_toggle(&self, _zone_id: &str, enabled: bool) -> Result<(), GatewayError> {
        self.record(Call::WriteToggle(enabled), "write_toggle", None)?;
        self.state.lock().universal_ssl = enabled;
        Ok(())
    }

    async fn write_many(&self, _zone_id: &str, settings: &[Setting]) -> Result<(), GatewayError> {
        let items = settings
            .iter()
            .map(|s| (s.id.clone(), s.value.clone()))
            .collect();
        self.record(Call::WriteMany(items), "write_many", None)?;
        for setting in settings {
            self.store(setting);
        }
        Ok(())
    }

    async fn target_details(&self, _zone_id: &str) -> Result<Option<TargetDetails>, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(Call::TargetDetails);
        if let Some(err) = state.failures.get("target_details") {
            return Err(err.clone());
        }
        Ok(state.zone.clone())
    }
}

// ===== Fixtures =====

fn editable(id: &str, value: Value) -> Setting {
    Setting::new(id, value)
}

fn locked(id: &str, value: Value) -> Setting {
    Setting {
        id: id.to_string(),
        value,
        editable: false,
    }
}

/// Remote state of a freshly created zone; `waf` is locked by the plan
pub fn default_remote_settings() -> Vec<Setting> {
    vec![
        editable("always_online", json!("on")),
        editable("brotli", json!("on")),
        editable("browser_cache_ttl", json!(14400)),
        editable("cache_level", json!("basic")),
        editable("minify", json!({"css": "off", "html": "off", "js": "off"})),
        editable("polish", json!("off")),
        editable("webp", json!("off")),
        editable(
            "security_header",
            json!({"strict_transport_security": {
                "enabled": false,
                "max_age": 0,
                "include_subdomains": false,
                "preload": false,
                "nosniff": false
            }}),
        ),
        editable("ssl", json!("full")),
        locked("waf", json!("off")),
        editable("min_tls_version", json!("1.0")),
        editable("0rtt", json!("off")),
        editable("h2_prioritization", json!("off")),
        editable("image_resizing", json!("off")),
        editable("binary_ast", json!("off")),
        editable("early_hints", json!("off")),
    ]
}

pub fn text(value: &str) -> SettingValue {
    SettingValue::text(value)
}

/// Build a snapshot from `(name, value)` pairs
pub fn settings(pairs: &[(&str, SettingValue)]) -> ZoneSettings {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn api_error(status: u16) -> GatewayError {
    GatewayError::Api {
        status,
        code: Some(1000),
        message: "simulated failure".to_string(),
    }
}

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}
