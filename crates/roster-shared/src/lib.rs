//! # Roster Shared
//!
//! Wire types shared by every layer of the client.
//! Nothing in here performs I/O.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, AuthResponse};
