//! Service layer
//!
//! Business logic sitting between the HTTP handlers and the leaf
//! components (adapters, cache store, rate limiter).

pub mod photo_proxy;

pub use photo_proxy::PhotoProxyService;
