//! photo-proxy: a media proxy for travel place photos
//!
//! Fetches photographs from several independent third-party providers,
//! normalizes them behind one interface, caches the binary results with
//! provider-specific freshness windows, serves stale content immediately
//! while refreshing it in the background, and protects each upstream
//! provider with a fixed-window rate limit.

pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod rate_limit;
pub mod services;
pub mod web;
