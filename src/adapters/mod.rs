//! Adapters implementing domain ports.

pub mod providers;
