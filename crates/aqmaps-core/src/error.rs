//! Error types for planner setup.

use thiserror::Error;

use crate::models::Position;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("move distance must be positive and finite, got {0}")]
    MoveDistance(f64),
    #[error("{name} must be non-negative and finite, got {value}")]
    Tolerance { name: &'static str, value: f64 },
    #[error("angle step must be in 1..=360 and divide 360 evenly, got {0}")]
    AngleStep(u32),
    #[error("max moves must be at least 1")]
    MaxMoves,
    #[error("beam width must be at least 1")]
    BeamWidth,
    #[error("max expansions must be at least 1")]
    MaxExpansions,
    #[error("confinement bounds are empty or not finite")]
    Bounds,
    #[error("environment variable {name} has invalid value {value:?}")]
    Env { name: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum PlannerError {
    #[error("invalid planner configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("invalid no-fly zone {name:?}: {reason}")]
    InvalidObstacle { name: String, reason: String },
    #[error("start position ({}, {}) is outside the confinement area", .0.lng, .0.lat)]
    StartOutOfBounds(Position),
}
