//! Planner configuration.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::Bounds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Length of every move, in degrees
    pub move_distance: f64,
    /// Distance at which a sensor can be read
    pub read_distance: f64,
    /// Distance from the start that counts as having returned
    pub ending_distance: f64,
    /// Hard cap on moves over the whole flight
    pub max_moves: usize,
    /// Move headings are multiples of this many degrees
    pub angle_step: u32,
    pub bounds: Bounds,
    /// Candidates kept by the path search after each expansion
    pub beam_width: usize,
    /// Expansions after which a path search gives up
    pub max_expansions: usize,
    /// Readings from sensors below this battery level are not trusted
    pub battery_threshold: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            move_distance: 0.0003,
            read_distance: 0.0002,
            ending_distance: 0.0003,
            max_moves: 150,
            angle_step: 10,
            bounds: Bounds::default(),
            beam_width: 100,
            max_expansions: 20_000,
            battery_threshold: 10.0,
        }
    }
}

impl PlannerConfig {
    /// Defaults overlaid with any `AQMAPS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            move_distance: env_or("AQMAPS_MOVE_DISTANCE", defaults.move_distance)?,
            read_distance: env_or("AQMAPS_READ_DISTANCE", defaults.read_distance)?,
            ending_distance: env_or("AQMAPS_ENDING_DISTANCE", defaults.ending_distance)?,
            max_moves: env_or("AQMAPS_MAX_MOVES", defaults.max_moves)?,
            angle_step: env_or("AQMAPS_ANGLE_STEP", defaults.angle_step)?,
            bounds: defaults.bounds,
            beam_width: env_or("AQMAPS_BEAM_WIDTH", defaults.beam_width)?,
            max_expansions: env_or("AQMAPS_MAX_EXPANSIONS", defaults.max_expansions)?,
            battery_threshold: env_or("AQMAPS_BATTERY_THRESHOLD", defaults.battery_threshold)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.move_distance.is_finite() && self.move_distance > 0.0) {
            return Err(ConfigError::MoveDistance(self.move_distance));
        }
        for (name, value) in [
            ("read distance", self.read_distance),
            ("ending distance", self.ending_distance),
            ("battery threshold", self.battery_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Tolerance { name, value });
            }
        }
        if self.angle_step == 0 || self.angle_step > 360 || 360 % self.angle_step != 0 {
            return Err(ConfigError::AngleStep(self.angle_step));
        }
        if self.max_moves == 0 {
            return Err(ConfigError::MaxMoves);
        }
        if self.beam_width == 0 {
            return Err(ConfigError::BeamWidth);
        }
        if self.max_expansions == 0 {
            return Err(ConfigError::MaxExpansions);
        }
        let b = &self.bounds;
        let finite = [b.min_lng, b.max_lng, b.min_lat, b.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite || b.min_lng >= b.max_lng || b.min_lat >= b.max_lat {
            return Err(ConfigError::Bounds);
        }
        Ok(())
    }

    /// Headings the drone may fly, in degrees.
    pub fn angles(&self) -> impl Iterator<Item = u32> {
        (0..360).step_by(self.angle_step.max(1) as usize)
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PlannerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.angles().count(), 36);
    }

    #[test]
    fn angle_step_must_divide_360() {
        let config = PlannerConfig {
            angle_step: 7,
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::AngleStep(7)));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut config = PlannerConfig::default();
        config.bounds.min_lat = config.bounds.max_lat + 1.0;
        assert_eq!(config.validate(), Err(ConfigError::Bounds));
    }

    #[test]
    fn non_positive_move_distance_is_rejected() {
        let config = PlannerConfig {
            move_distance: 0.0,
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MoveDistance(0.0)));
    }
}
