//! Core data models for the survey planner.

use serde::{Deserialize, Serialize};

/// A planar position. x is longitude, y is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Axis-aligned confinement area the drone must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_lng: -3.192473,
            max_lng: -3.184319,
            min_lat: 55.942617,
            max_lat: 55.946233,
        }
    }
}

/// Sensor entry as served by the map server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// what3words address, e.g. "slips.mass.baking"
    pub location: String,
    pub battery: f64,
    pub reading: String,
}

/// Outcome of a visit, assigned once the plan is final.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VisitedState {
    /// Not part of the final plan
    #[default]
    Unvisited,
    /// Reading inside the expected range
    Nominal { color: String, symbol: String },
    /// Battery below the reliability threshold, reading discarded
    LowBattery,
    /// Reading missing, unparsable or out of range
    Abnormal,
}

impl VisitedState {
    pub fn marker_color(&self) -> &str {
        match self {
            VisitedState::Unvisited => "#aaaaaa",
            VisitedState::Nominal { color, .. } => color,
            VisitedState::LowBattery | VisitedState::Abnormal => "#000000",
        }
    }

    pub fn marker_symbol(&self) -> Option<&str> {
        match self {
            VisitedState::Unvisited => None,
            VisitedState::Nominal { symbol, .. } => Some(symbol),
            VisitedState::LowBattery | VisitedState::Abnormal => Some("cross"),
        }
    }

    pub fn is_visited(&self) -> bool {
        !matches!(self, VisitedState::Unvisited)
    }
}

/// A sensor the drone should fly to and read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub location: String,
    pub position: Position,
    pub battery: f64,
    pub reading: String,
    #[serde(default)]
    pub state: VisitedState,
}

impl Target {
    pub fn from_record(record: SensorRecord, position: Position) -> Self {
        Self {
            location: record.location,
            position,
            battery: record.battery,
            reading: record.reading,
            state: VisitedState::Unvisited,
        }
    }
}

/// A no-fly zone. The ring is closed (first == last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub name: String,
    pub ring: Vec<Position>,
}

impl Obstacle {
    /// Iterate over the ring's edges as (start, end) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (Position, Position)> + '_ {
        self.ring.windows(2).map(|edge| (edge[0], edge[1]))
    }

    /// Validate ring shape.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.ring.len() < 4 {
            errors.push(format!(
                "ring must have at least 4 positions, found {}",
                self.ring.len()
            ));
        }

        if let (Some(first), Some(last)) = (self.ring.first(), self.ring.last()) {
            if first != last {
                errors.push("ring must be closed (first position must equal last)".to_string());
            }
        }

        if self
            .ring
            .iter()
            .any(|p| !p.lng.is_finite() || !p.lat.is_finite())
        {
            errors.push("ring contains non-finite coordinates".to_string());
        }

        errors
    }
}

/// One leg of the flight: an origin followed by one position per move.
///
/// Always holds exactly one more position than angles, so the origin and end
/// exist for every leg. Legs are only built by the path search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    positions: Vec<Position>,
    /// Heading in degrees of move i (positions[i] -> positions[i + 1])
    angles: Vec<u32>,
}

impl Leg {
    pub fn new(origin: Position) -> Self {
        Self {
            positions: vec![origin],
            angles: Vec::new(),
        }
    }

    pub fn origin(&self) -> Position {
        self.positions[0]
    }

    pub fn end(&self) -> Position {
        self.positions[self.angles.len()]
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn angles(&self) -> &[u32] {
        &self.angles
    }

    pub fn move_count(&self) -> usize {
        self.angles.len()
    }

    pub(crate) fn push(&mut self, angle: u32, position: Position) {
        self.angles.push(angle);
        self.positions.push(position);
    }
}

/// A single drone move, as written to the flight log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based position of this move in the whole flight
    pub sequence: usize,
    pub from: Position,
    pub angle: u32,
    pub to: Position,
    /// Sensor read at the end of this move, if any
    pub location: Option<String>,
}

/// The finished plan: legs in flight order plus the sensors they reach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightPlan {
    pub start: Position,
    /// leg i ends at visited[i]; the last leg returns to start
    pub legs: Vec<Leg>,
    pub visited: Vec<Target>,
    /// Input targets that are not part of the plan, in input order
    pub skipped: Vec<Target>,
}

impl FlightPlan {
    pub fn total_moves(&self) -> usize {
        self.legs.iter().map(Leg::move_count).sum()
    }

    /// Full route: start once, then every leg's positions after its origin.
    pub fn route(&self) -> Vec<Position> {
        let mut route = vec![self.start];
        for leg in &self.legs {
            route.extend_from_slice(&leg.positions[1..]);
        }
        route
    }

    /// Flatten the legs into a numbered move list.
    pub fn moves(&self) -> Vec<MoveRecord> {
        let mut records = Vec::with_capacity(self.total_moves());
        for (leg_idx, leg) in self.legs.iter().enumerate() {
            let reached = self.visited.get(leg_idx).map(|t| t.location.clone());
            for (i, angle) in leg.angles.iter().enumerate() {
                let is_last = i + 1 == leg.angles.len();
                records.push(MoveRecord {
                    sequence: records.len() + 1,
                    from: leg.positions[i],
                    angle: *angle,
                    to: leg.positions[i + 1],
                    location: if is_last { reached.clone() } else { None },
                });
            }
        }
        records
    }
}
