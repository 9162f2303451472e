//! Infrastructure layer - remote API gateway and record storage

pub mod cloudflare;
pub mod storage;
