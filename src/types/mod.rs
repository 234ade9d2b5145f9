//! Core types

mod config;

pub use config::{DEFAULT_CONTROL_PORT, DEFAULT_USER_AGENT, RaopConfig, RaopConfigBuilder};
