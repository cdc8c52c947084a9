//! # Outreach CRM Library
//!
//! Core of the outreach CRM service: configuration, persistence, the HTTP API
//! and the offline cache gateway that can front it.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod offline_cache;
pub mod password;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod stats;
pub mod telemetry;
pub use migration;
