//! influxcat - dump and restore a single InfluxDB measurement
//!
//! The pipelines live in `influxcat-core`; this crate adds the InfluxDB HTTP
//! client, line protocol encoding, configuration layering and the command line.

pub mod client;
pub mod commands;
pub mod config;
pub mod line_protocol;
pub mod logging;

pub use client::InfluxClient;
pub use config::{FileConfig, InfluxConfig, Overrides, Settings};
pub use logging::{init_logging, LogFormat, LoggingConfig};
