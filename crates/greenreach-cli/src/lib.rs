//! greenreach CLI - batch driver for network-distance classification.
//!
//! Reads a road network (GeoJSON) and a samples table (CSV), runs the
//! classifier from `greenreach-core` and writes the requested exports.

pub mod config;
pub mod export;
pub mod input;

pub use config::Config;
