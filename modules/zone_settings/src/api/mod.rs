//! API layer - entry points for other modules

pub mod native;
