//! Reading classification for visited sensors.

use crate::models::{Target, VisitedState};

/// Marker colours for readings in [0, 256), one per band of 32.
pub const READING_COLORS: [&str; 8] = [
    "#00ff00", "#40ff00", "#80ff00", "#c0ff00", "#ffc000", "#ff8000", "#ff4000", "#ff0000",
];

const BAND_WIDTH: f64 = 32.0;
const DANGER_FROM: f64 = 128.0;

/// Classify a single sensor visit.
pub fn classify(battery: f64, reading: &str, battery_threshold: f64) -> VisitedState {
    if battery < battery_threshold {
        return VisitedState::LowBattery;
    }

    let Ok(value) = reading.trim().parse::<f64>() else {
        return VisitedState::Abnormal;
    };
    if !(0.0..256.0).contains(&value) {
        return VisitedState::Abnormal;
    }

    let band = (value / BAND_WIDTH).floor() as usize;
    let symbol = if value < DANGER_FROM { "lighthouse" } else { "danger" };
    VisitedState::Nominal {
        color: READING_COLORS[band.min(READING_COLORS.len() - 1)].to_string(),
        symbol: symbol.to_string(),
    }
}

/// Produce visited copies of the given targets. The inputs are untouched.
pub fn finalize(visited: &[Target], battery_threshold: f64) -> Vec<Target> {
    visited
        .iter()
        .map(|target| Target {
            state: classify(target.battery, &target.reading, battery_threshold),
            ..target.clone()
        })
        .collect()
}
