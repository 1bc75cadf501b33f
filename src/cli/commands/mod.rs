//! CLI command implementations.

pub mod plan;
pub mod providers;
pub mod route;
pub mod run;
pub mod templates;
