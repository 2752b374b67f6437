//! # Roster Infrastructure
//!
//! Concrete implementations of the ports defined in `roster-core`.
//!
//! ## Feature Flags
//!
//! - `http` (default) - reqwest-backed [`HttpTransport`](roster_core::ports::HttpTransport)

pub mod files;
pub mod storage;

#[cfg(feature = "http")]
pub mod http;

// Re-exports
pub use files::LocalFileSource;
pub use storage::{FileStore, InMemoryStore};

#[cfg(feature = "http")]
pub use http::ReqwestTransport;
