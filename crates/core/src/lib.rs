//! Core types and shared functionality for sitewatch.
//!
//! This crate provides:
//! - Domain record store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use store::{DomainDb, DomainRecord, DomainStore, DomainUpdate, NewDomain, UNKNOWN};
