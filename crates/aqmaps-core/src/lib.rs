//! Route planning for the air-quality sensor survey drone.
//!
//! The drone flies fixed-length moves at headings that are multiples of a
//! configured angle step, must stay inside the confinement area, may not
//! cross a no-fly zone edge, and has a hard cap on moves per flight.

pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod path_search;
pub mod planner;
pub mod route_order;

pub use classify::{classify, finalize};
pub use config::PlannerConfig;
pub use error::{ConfigError, PlannerError};
pub use geometry::{move_is_legal, segments_intersect, within_bounds};
pub use models::{
    Bounds, FlightPlan, Leg, MoveRecord, Obstacle, Position, SensorRecord, Target, VisitedState,
};
pub use path_search::find_path;
pub use planner::FlightPlanner;
pub use route_order::{solve_order, two_opt, CostMatrix};
