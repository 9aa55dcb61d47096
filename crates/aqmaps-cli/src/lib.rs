//! aqmaps CLI - map server access and plan output for the survey drone.
//!
//! This crate provides:
//! - source: blocking client for the map web server
//! - output: GeoJSON readings map and flight log rendering
//! - the `aqmaps` binary tying both to the core planner

pub mod output;
pub mod source;

pub use output::{render_flight_log, render_geojson, write_outputs};
pub use source::MapServerClient;
