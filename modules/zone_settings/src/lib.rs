//! Zone Settings Module
//!
//! Declarative management of per-zone setting overrides. A user declares the
//! settings a zone should carry; the module captures the zone's prior state
//! once, drives the remote API until the declared values hold, and restores
//! the captured values when management is released.

// Public exports
pub mod contract;
pub use contract::{
    client::ZoneSettingsApi, error::GatewayError, error::ZoneSettingsError, Baseline,
    ManagedZone, ObservedState, Setting, SettingValue, ZoneSettings,
};

pub mod config;
pub use config::{ApiConfig, Config};

pub mod domain;
pub use domain::{Reconciler, Service, ZoneGateway};

// Adapters (exposed for wiring, hidden from docs)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod infra;

pub use api::native::NativeClient;
