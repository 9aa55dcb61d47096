//! Visit ordering: a 2-opt tour over path-search move counts.

use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::models::{Obstacle, Position, Target};
use crate::path_search::find_path;

/// Cost used when no path was found between two points. Small enough that
/// adding a full tour of them cannot overflow a `u64`.
pub const UNREACHABLE_COST: u64 = (u32::MAX / 4) as u64;

/// Symmetric matrix of estimated moves between visit points.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    costs: Vec<u64>,
}

impl CostMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            costs: vec![0; size * size],
        }
    }

    /// Build from explicit rows. Returns `None` unless the rows form a
    /// square matrix.
    pub fn from_rows(rows: &[Vec<u64>]) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            size,
            costs: rows.concat(),
        })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.costs[i * self.size + j]
    }

    pub fn set_symmetric(&mut self, i: usize, j: usize, cost: u64) {
        self.costs[i * self.size + j] = cost;
        self.costs[j * self.size + i] = cost;
    }

    /// Total cost of visiting `order` as a closed cycle.
    pub fn tour_cost(&self, order: &[usize]) -> u64 {
        let n = order.len();
        (0..n)
            .map(|k| self.get(order[k], order[(k + 1) % n]))
            .sum()
    }
}

/// Estimated move counts between all targets, with the start at index N.
pub fn build_cost_matrix(
    targets: &[Target],
    start: Position,
    obstacles: &[Obstacle],
    config: &PlannerConfig,
) -> CostMatrix {
    let points: Vec<Position> = targets
        .iter()
        .map(|t| t.position)
        .chain(std::iter::once(start))
        .collect();
    let mut matrix = CostMatrix::new(points.len());
    let mut unreachable = 0usize;

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let cost = match find_path(points[i], points[j], config.read_distance, 1, obstacles, config)
            {
                Some(leg) => leg.move_count() as u64,
                None => {
                    unreachable += 1;
                    UNREACHABLE_COST
                }
            };
            matrix.set_symmetric(i, j, cost);
        }
    }

    debug!(points = points.len(), unreachable, "built cost matrix");
    matrix
}

/// Improve a cyclic order in place by 2-opt segment reversals.
///
/// Each accepted reversal strictly lowers the tour cost; the loop stops at
/// the first full scan with no improving reversal. Returns the number of
/// reversals applied.
pub fn two_opt(costs: &CostMatrix, order: &mut [usize]) -> usize {
    let n = order.len();
    if n < 4 {
        return 0;
    }

    let mut reversals = 0usize;
    let mut improved = true;
    while improved {
        improved = false;
        for i in 0..n - 2 {
            for j in (i + 1)..n - 1 {
                let before = order[(i + n - 1) % n];
                let after = order[j + 1];
                let current = costs.get(before, order[i]) + costs.get(order[j], after);
                let swapped = costs.get(before, order[j]) + costs.get(order[i], after);
                if swapped < current {
                    order[i..=j].reverse();
                    reversals += 1;
                    improved = true;
                }
            }
        }
    }
    reversals
}

/// Rotate a cycle so it starts right after `anchor`, dropping the anchor.
fn rotate_after(order: &[usize], anchor: usize) -> Vec<usize> {
    let Some(pos) = order.iter().position(|idx| *idx == anchor) else {
        return order.to_vec();
    };
    (1..order.len())
        .map(|k| order[(pos + k) % order.len()])
        .collect()
}

/// Order targets for visiting, starting and ending at `start`.
///
/// The result is a permutation of `targets`; nothing is dropped here.
pub fn solve_order(
    targets: &[Target],
    start: Position,
    obstacles: &[Obstacle],
    config: &PlannerConfig,
) -> Vec<Target> {
    solve_order_indices(targets, start, obstacles, config)
        .into_iter()
        .map(|idx| targets[idx].clone())
        .collect()
}

/// Same as [`solve_order`], returning indices into `targets`.
pub fn solve_order_indices(
    targets: &[Target],
    start: Position,
    obstacles: &[Obstacle],
    config: &PlannerConfig,
) -> Vec<usize> {
    if targets.len() < 2 {
        return (0..targets.len()).collect();
    }

    let costs = build_cost_matrix(targets, start, obstacles, config);
    let mut order: Vec<usize> = (0..costs.len()).collect();
    let initial = costs.tour_cost(&order);
    let reversals = two_opt(&costs, &mut order);
    info!(
        targets = targets.len(),
        initial_cost = initial,
        final_cost = costs.tour_cost(&order),
        reversals,
        "visit order selected"
    );

    rotate_after(&order, targets.len())
}
