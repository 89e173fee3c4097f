//! Port traits: the seams to data sources and configuration.

pub mod config_port;
pub mod data_port;
