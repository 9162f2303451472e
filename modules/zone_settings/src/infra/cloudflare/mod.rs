//! Cloudflare v4 API gateway

pub mod client;
pub mod dto;
pub mod mapper;

pub use client::CloudflareGateway;
