//! Centralized error handling for the photo proxy
//!
//! Adapter failures on the synchronous (cache-miss) path propagate to the
//! caller verbatim; on the background-refresh path they are caught at the
//! task boundary, logged and discarded.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using ProxyError
pub type ProxyResult<T> = Result<T, ProxyError>;
