//! Beam search over discretized drone moves.
//!
//! The branching factor is 360 / angle_step per move, so a full A* frontier
//! grows far too quickly. Instead only the best `beam_width` partial legs are
//! kept after every expansion. This makes the search incomplete: a goal that
//! a wider search would reach may be reported as unreachable.
//!
//! Different orderings of the same moves land on the same position, so both
//! the beam and the set of expanded positions are keyed on the end position.
//! Otherwise the beam fills with permutations of one path.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use tracing::debug;

use crate::config::PlannerConfig;
use crate::geometry::{distance, move_is_legal, step};
use crate::models::{Leg, Obstacle, Position};

/// A partial leg waiting in the frontier.
#[derive(Debug, Clone)]
struct Candidate {
    leg: Leg,
    heuristic: usize,
    remaining: f64,
    /// Creation order, keeps ties deterministic
    seq: u64,
}

impl Candidate {
    fn new(leg: Leg, goal: Position, acceptable_error: f64, move_distance: f64, seq: u64) -> Self {
        let remaining = distance(leg.end(), goal);
        Self {
            leg,
            heuristic: moves_lower_bound(remaining, acceptable_error, move_distance),
            remaining,
            seq,
        }
    }

    fn cost(&self) -> usize {
        self.leg.move_count()
    }

    fn estimate(&self) -> usize {
        self.cost() + self.heuristic
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimate()
            .cmp(&other.estimate())
            .then_with(|| self.remaining.total_cmp(&other.remaining))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Grid used to decide that two end positions are the same, in degrees.
const POSITION_KEY_RESOLUTION: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PositionKey {
    lng: i64,
    lat: i64,
}

impl PositionKey {
    fn of(p: Position) -> Self {
        Self {
            lng: (p.lng / POSITION_KEY_RESOLUTION).round() as i64,
            lat: (p.lat / POSITION_KEY_RESOLUTION).round() as i64,
        }
    }
}

/// Fewest moves that could still reach the goal, assuming every remaining
/// move heads straight at it.
pub fn moves_lower_bound(remaining: f64, acceptable_error: f64, move_distance: f64) -> usize {
    let gap = (remaining - acceptable_error).max(0.0);
    (gap / move_distance).ceil() as usize
}

/// Search for a leg from `start` that ends within `acceptable_error` of
/// `goal` using at least `min_moves` moves.
///
/// Every move in the returned leg is legal: it ends inside the confinement
/// area and crosses no no-fly zone edge. Returns `None` when the beam empties
/// or the expansion budget runs out.
pub fn find_path(
    start: Position,
    goal: Position,
    acceptable_error: f64,
    min_moves: usize,
    obstacles: &[Obstacle],
    config: &PlannerConfig,
) -> Option<Leg> {
    let beam_width = config.beam_width.max(1);
    let mut seq = 0u64;
    let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
    frontier.push(Reverse(Candidate::new(
        Leg::new(start),
        goal,
        acceptable_error,
        config.move_distance,
        seq,
    )));

    let mut closed_set: HashSet<PositionKey> = HashSet::new();
    let mut expansions = 0usize;
    while let Some(Reverse(current)) = frontier.pop() {
        if current.remaining <= acceptable_error && current.cost() >= min_moves {
            debug!(
                expansions,
                moves = current.cost(),
                "path search reached goal"
            );
            return Some(current.leg);
        }

        // Already expanded with no more moves than this candidate
        if !closed_set.insert(PositionKey::of(current.leg.end())) {
            continue;
        }

        expansions += 1;
        if expansions > config.max_expansions {
            debug!(expansions, "path search expansion budget exhausted");
            return None;
        }

        if current.cost() + 1 >= config.max_moves {
            continue;
        }

        let from = current.leg.end();
        for angle in config.angles() {
            let to = step(from, angle, config.move_distance);
            if closed_set.contains(&PositionKey::of(to))
                || !move_is_legal(from, to, obstacles, &config.bounds)
            {
                continue;
            }
            let mut leg = current.leg.clone();
            leg.push(angle, to);
            seq += 1;
            frontier.push(Reverse(Candidate::new(
                leg,
                goal,
                acceptable_error,
                config.move_distance,
                seq,
            )));
        }

        frontier = truncate_beam(frontier, &closed_set, beam_width);
    }

    debug!(expansions, "path search frontier exhausted");
    None
}

/// Keep the best `beam_width` candidates, one per unexpanded end position.
fn truncate_beam(
    mut frontier: BinaryHeap<Reverse<Candidate>>,
    closed_set: &HashSet<PositionKey>,
    beam_width: usize,
) -> BinaryHeap<Reverse<Candidate>> {
    let mut kept = BinaryHeap::with_capacity(beam_width.min(frontier.len()));
    let mut seen: HashSet<PositionKey> = HashSet::with_capacity(kept.capacity());
    while kept.len() < beam_width {
        let Some(Reverse(candidate)) = frontier.pop() else {
            break;
        };
        let key = PositionKey::of(candidate.leg.end());
        if closed_set.contains(&key) || !seen.insert(key) {
            continue;
        }
        kept.push(Reverse(candidate));
    }
    kept
}
