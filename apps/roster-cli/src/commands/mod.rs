//! CLI commands

pub mod auth;
pub mod people;
