//! Shared topic fan-out domain primitives.
//!
//! This crate owns configuration validation, identifier list shaping, the
//! published event contract, and the provisioning-time resource wiring
//! manifest. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod config;
pub mod error;
pub mod event;
pub mod identifiers;
pub mod wiring;
