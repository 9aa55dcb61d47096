//! Flight planning under a move budget.
//!
//! The planner orders the sensors, builds one leg per sensor plus the return
//! leg, and while the flight is over budget drops the sensor whose removal
//! saves the most moves. Legs before the dropped sensor are kept; the route
//! is reassembled from there.

use tracing::{debug, info, warn};

use crate::classify::finalize;
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::geometry::within_bounds;
use crate::models::{FlightPlan, Leg, Obstacle, Position, Target};
use crate::path_search::find_path;
use crate::route_order::solve_order_indices;

/// Move count charged for a leg that could not be found.
const MISSING_LEG_MOVES: i64 = i32::MAX as i64;

pub struct FlightPlanner {
    config: PlannerConfig,
    obstacles: Vec<Obstacle>,
}

impl FlightPlanner {
    pub fn new(config: PlannerConfig, obstacles: Vec<Obstacle>) -> Result<Self, PlannerError> {
        config.validate()?;
        for obstacle in &obstacles {
            if let Some(reason) = obstacle.validate().into_iter().next() {
                return Err(PlannerError::InvalidObstacle {
                    name: obstacle.name.clone(),
                    reason,
                });
            }
        }
        Ok(Self { config, obstacles })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Plan a closed flight from `start` visiting as many targets as the
    /// move budget allows.
    pub fn plan(&self, targets: &[Target], start: Position) -> Result<FlightPlan, PlannerError> {
        if !within_bounds(start, &self.config.bounds) {
            return Err(PlannerError::StartOutOfBounds(start));
        }

        let mut order = solve_order_indices(targets, start, &self.obstacles, &self.config);
        let mut legs: Vec<Leg> = Vec::with_capacity(order.len() + 1);

        let return_leg = loop {
            self.assemble(targets, &mut order, &mut legs, start);
            if order.is_empty() {
                // Nothing left to visit: the drone never leaves the start.
                break Leg::new(start);
            }

            let position = legs.last().map(Leg::end).unwrap_or(start);
            let outbound: usize = legs.iter().map(Leg::move_count).sum();
            let return_leg = match self.return_leg(position, start) {
                Some(leg) if outbound + leg.move_count() <= self.config.max_moves => break leg,
                other => other,
            };
            let total = return_leg
                .as_ref()
                .map(|leg| (outbound + leg.move_count()) as i64)
                .unwrap_or(MISSING_LEG_MOVES);
            debug!(visits = order.len(), total, "assembled flight over budget");
            if return_leg.is_none() {
                warn!(position = ?position, "no return leg to start, pruning");
            }

            let drop_at = self.most_costly_visit(targets, &order, &legs, return_leg.as_ref(), start);
            let dropped = order.remove(drop_at);
            legs.truncate(drop_at);
            info!(
                location = %targets[dropped].location,
                over_budget_by = total - self.config.max_moves as i64,
                "dropping sensor to meet move budget"
            );
        };

        legs.push(return_leg);

        let visited: Vec<Target> = order.iter().map(|idx| targets[*idx].clone()).collect();
        let skipped: Vec<Target> = (0..targets.len())
            .filter(|idx| !order.contains(idx))
            .map(|idx| targets[idx].clone())
            .collect();

        let plan = FlightPlan {
            start,
            legs,
            visited: finalize(&visited, self.config.battery_threshold),
            skipped,
        };
        info!(
            visited = plan.visited.len(),
            skipped = plan.skipped.len(),
            moves = plan.total_moves(),
            "flight plan final"
        );
        Ok(plan)
    }

    /// Extend `legs` until every target in `order` has one, dropping targets
    /// that cannot be reached from the current position.
    fn assemble(&self, targets: &[Target], order: &mut Vec<usize>, legs: &mut Vec<Leg>, start: Position) {
        while legs.len() < order.len() {
            let position = legs.last().map(Leg::end).unwrap_or(start);
            let target = &targets[order[legs.len()]];
            match find_path(
                position,
                target.position,
                self.config.read_distance,
                1,
                &self.obstacles,
                &self.config,
            ) {
                Some(leg) => legs.push(leg),
                None => {
                    warn!(location = %target.location, "sensor unreachable, skipping");
                    order.remove(legs.len());
                }
            }
        }
    }

    fn return_leg(&self, from: Position, start: Position) -> Option<Leg> {
        find_path(
            from,
            start,
            self.config.ending_distance,
            0,
            &self.obstacles,
            &self.config,
        )
    }

    /// Index into `order` of the visit whose removal saves the most moves.
    /// Ties go to the earliest visit.
    fn most_costly_visit(
        &self,
        targets: &[Target],
        order: &[usize],
        legs: &[Leg],
        return_leg: Option<&Leg>,
        start: Position,
    ) -> usize {
        let moves = |leg: Option<&Leg>| {
            leg.map(|l| l.move_count() as i64)
                .unwrap_or(MISSING_LEG_MOVES)
        };

        let mut best = 0usize;
        let mut best_savings = i64::MIN;
        for k in 0..order.len() {
            let from = if k == 0 { start } else { legs[k - 1].end() };
            let inbound = moves(legs.get(k));
            let outbound = if k + 1 < order.len() {
                moves(legs.get(k + 1))
            } else {
                moves(return_leg)
            };

            let direct = if k + 1 < order.len() {
                let next = targets[order[k + 1]].position;
                find_path(from, next, self.config.read_distance, 1, &self.obstacles, &self.config)
            } else {
                self.return_leg(from, start)
            };
            let savings = inbound + outbound - moves(direct.as_ref());

            if savings > best_savings {
                best_savings = savings;
                best = k;
            }
        }
        debug!(index = best, savings = best_savings, "selected visit to drop");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::models::{Bounds, VisitedState};

    fn config() -> PlannerConfig {
        PlannerConfig {
            bounds: Bounds {
                min_lng: -0.01,
                max_lng: 0.01,
                min_lat: -0.01,
                max_lat: 0.01,
            },
            ..PlannerConfig::default()
        }
    }

    fn target(location: &str, lng: f64, lat: f64) -> Target {
        Target {
            location: location.to_string(),
            position: Position::new(lng, lat),
            battery: 80.0,
            reading: "50".to_string(),
            state: VisitedState::Unvisited,
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let bad = PlannerConfig {
            angle_step: 0,
            ..config()
        };
        let err = FlightPlanner::new(bad, Vec::new()).err();
        assert_eq!(err, Some(PlannerError::InvalidConfig(ConfigError::AngleStep(0))));
    }

    #[test]
    fn rejects_open_obstacle_ring() {
        let zone = Obstacle {
            name: "open".to_string(),
            ring: vec![
                Position::new(0.0, 0.0),
                Position::new(0.001, 0.0),
                Position::new(0.001, 0.001),
                Position::new(0.0, 0.001),
            ],
        };
        let err = FlightPlanner::new(config(), vec![zone]).err();
        assert!(matches!(err, Some(PlannerError::InvalidObstacle { .. })));
    }

    #[test]
    fn rejects_start_outside_bounds() {
        let planner = FlightPlanner::new(config(), Vec::new()).unwrap();
        let start = Position::new(1.0, 1.0);
        assert_eq!(
            planner.plan(&[], start).err(),
            Some(PlannerError::StartOutOfBounds(start))
        );
    }

    #[test]
    fn empty_target_list_yields_return_only_plan() {
        let planner = FlightPlanner::new(config(), Vec::new()).unwrap();
        let start = Position::new(0.0, 0.0);
        let plan = planner.plan(&[], start).unwrap();

        assert_eq!(plan.legs.len(), 1);
        assert_eq!(plan.total_moves(), 0);
        assert!(plan.visited.is_empty());
        assert_eq!(plan.route(), vec![start]);
    }

    #[test]
    fn unreachable_sensor_is_skipped_not_fatal() {
        let bounded = PlannerConfig {
            max_expansions: 3_000,
            ..config()
        };
        let planner = FlightPlanner::new(bounded, Vec::new()).unwrap();
        let start = Position::new(0.0, 0.0);
        // Outside the confinement area, so no legal move ends near it
        let outside = target("out.of.bounds", 0.0, 0.0105);
        let inside = target("in.the.box", 0.0009, 0.0);

        let plan = planner.plan(&[outside, inside], start).unwrap();

        assert_eq!(plan.visited.len(), 1);
        assert_eq!(plan.visited[0].location, "in.the.box");
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].location, "out.of.bounds");
        assert_eq!(plan.skipped[0].state, VisitedState::Unvisited);
        assert_eq!(plan.legs.len(), 2);
    }

    #[test]
    fn sensor_without_a_way_back_is_pruned() {
        // Only east and west moves. Every west move shifts the latitude by the
        // same tiny rounding error, so once the drone has flown east it can
        // never land exactly on the start again.
        let strict = PlannerConfig {
            angle_step: 180,
            ending_distance: 0.0,
            ..config()
        };
        let planner = FlightPlanner::new(strict, Vec::new()).unwrap();
        let start = Position::new(0.0, 0.0);
        let sensor = target("east.of.start", 0.0006, 0.0);

        let outbound = find_path(start, sensor.position, 0.0002, 1, &[], planner.config());
        assert_eq!(outbound.map(|leg| leg.move_count()), Some(2));

        let plan = planner.plan(&[sensor], start).unwrap();

        assert!(plan.visited.is_empty());
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].location, "east.of.start");
        assert_eq!(plan.legs.len(), 1);
        assert_eq!(plan.total_moves(), 0);
        assert_eq!(plan.route(), vec![start]);
    }

    #[test]
    fn legs_chain_end_to_origin() {
        let planner = FlightPlanner::new(config(), Vec::new()).unwrap();
        let start = Position::new(0.0, 0.0);
        let targets = vec![
            target("a.a.a", 0.0012, 0.0),
            target("b.b.b", 0.0012, 0.0009),
            target("c.c.c", 0.0, 0.0009),
        ];
        let plan = planner.plan(&targets, start).unwrap();

        assert_eq!(plan.visited.len(), 3);
        assert_eq!(plan.legs.len(), 4);
        assert_eq!(plan.legs[0].origin(), start);
        for pair in plan.legs.windows(2) {
            assert_eq!(pair[0].end(), pair[1].origin());
        }
        assert!(plan.visited.iter().all(|t| t.state.is_visited()));
    }
}
