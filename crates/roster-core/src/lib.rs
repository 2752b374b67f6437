//! # Roster Core
//!
//! The client layer of the Roster people directory.
//! Everything here talks to the outside world only through the traits in
//! [`ports`], so the same logic runs against reqwest, files on disk, or
//! the fakes used in tests.

pub mod api;
pub mod client;
pub mod domain;
pub mod draft;
pub mod error;
pub mod form;
pub mod image;
pub mod network;
pub mod ports;
pub mod retry;
pub mod session;

pub use client::{ApiClient, ClientConfig, RequestOptions};
pub use error::{ApiError, ClientError, FileError, StoreError, ValidationErrors};
pub use network::{NetworkMonitor, NetworkStatus};
pub use retry::RetryPolicy;
pub use session::AuthSession;
