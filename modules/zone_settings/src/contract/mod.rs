//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - wire and storage shapes live in infra.

pub mod client;
pub mod error;
pub mod model;

pub use client::ZoneSettingsApi;
pub use error::{GatewayError, Phase, SubProtocol, ZoneSettingsError};
pub use model::{
    Baseline, ManagedZone, Minify, MobileRedirect, ObservedState, Setting, SettingValue,
    StrictTransportSecurity, TargetDetails, ZoneSettings,
};
