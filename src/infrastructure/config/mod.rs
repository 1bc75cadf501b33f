//! Layered configuration for conclave.
//!
//! Defaults, then `.conclave/config.yaml` and `.conclave/local.yaml`, then
//! `CONCLAVE_*` environment variables.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
