//! Storage layer - managed zone documents and repositories

pub mod document;
pub mod mapper;
pub mod repositories;

pub use document::ManagedZoneDocument;
pub use repositories::{FileZoneRepository, InMemoryZoneRepository};
