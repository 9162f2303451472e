//! Domain layer - registry, codec and reconciliation

pub mod baseline;
pub mod codec;
pub mod engine;
pub mod gateway;
pub mod registry;
pub mod repository;
pub mod service;

pub use engine::{plan_apply, plan_revert, Reconciler, RemoteState, WriteSet};
pub use gateway::ZoneGateway;
pub use repository::ManagedZoneRepository;
pub use service::Service;
