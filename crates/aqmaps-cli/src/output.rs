//! Plan rendering: GeoJSON readings map and the per-move flight log.

use anyhow::{Context, Result};
use aqmaps_core::{FlightPlan, Target};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const MARKER_SIZE: &str = "medium";

fn sensor_feature(target: &Target) -> Value {
    let mut properties = json!({
        "marker-size": MARKER_SIZE,
        "location": target.location,
        "rgb-string": target.state.marker_color(),
        "marker-color": target.state.marker_color(),
    });
    if let Some(symbol) = target.state.marker_symbol() {
        properties["marker-symbol"] = json!(symbol);
    }
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [target.position.lng, target.position.lat],
        },
        "properties": properties,
    })
}

/// Readings map: one point per sensor plus the flown route as a line.
pub fn render_geojson(plan: &FlightPlan) -> Value {
    let mut features: Vec<Value> = plan
        .visited
        .iter()
        .chain(plan.skipped.iter())
        .map(sensor_feature)
        .collect();

    let route: Vec<[f64; 2]> = plan.route().iter().map(|p| [p.lng, p.lat]).collect();
    features.push(json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": route,
        },
        "properties": {},
    }));

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// One line per move: `seq,from_lng,from_lat,angle,to_lng,to_lat,location`.
pub fn render_flight_log(plan: &FlightPlan) -> String {
    let mut log = String::new();
    for record in plan.moves() {
        let _ = writeln!(
            log,
            "{},{},{},{},{},{},{}",
            record.sequence,
            record.from.lng,
            record.from.lat,
            record.angle,
            record.to.lng,
            record.to.lat,
            record.location.as_deref().unwrap_or("null"),
        );
    }
    log
}

/// `(readings-DD-MM-YYYY.geojson, flightpath-DD-MM-YYYY.txt)`
pub fn output_file_names(date: NaiveDate) -> (String, String) {
    let stamp = date.format("%d-%m-%Y");
    (
        format!("readings-{}.geojson", stamp),
        format!("flightpath-{}.txt", stamp),
    )
}

/// Write both output files into `dir`, returning their paths.
pub fn write_outputs(dir: &Path, date: NaiveDate, plan: &FlightPlan) -> Result<(PathBuf, PathBuf)> {
    let (readings_name, log_name) = output_file_names(date);
    let readings_path = dir.join(readings_name);
    let log_path = dir.join(log_name);

    let geojson = serde_json::to_string(&render_geojson(plan)).context("Failed to encode GeoJSON")?;
    fs::write(&readings_path, geojson)
        .with_context(|| format!("Failed to write {}", readings_path.display()))?;
    fs::write(&log_path, render_flight_log(plan))
        .with_context(|| format!("Failed to write {}", log_path.display()))?;

    Ok((readings_path, log_path))
}
