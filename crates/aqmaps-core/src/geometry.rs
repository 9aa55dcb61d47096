//! Planar geometry for move legality checks.
//!
//! Coordinates are treated as planar: over the survey area the distortion
//! between degrees of longitude and latitude is irrelevant for the planner,
//! which only needs consistent distances and intersection tests.

use crate::models::{Bounds, Obstacle, Position};

/// Tolerance applied to every bound test. Touching counts as intersecting.
pub const EPSILON: f64 = 1e-10;

/// Line through two points in the form a·x + b·y + c = 0.
#[derive(Debug, Clone, Copy)]
struct Line {
    a: f64,
    b: f64,
    c: f64,
}

impl Line {
    fn through(p: Position, q: Position) -> Self {
        let a = p.lat - q.lat;
        let b = q.lng - p.lng;
        let c = -(p.lng * a) - (p.lat * b);
        Self { a, b, c }
    }

    fn norm(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Perpendicular distance from `p` to the line.
    fn distance_to(&self, p: Position) -> f64 {
        (self.a * p.lng + self.b * p.lat + self.c).abs() / self.norm()
    }
}

pub fn distance(a: Position, b: Position) -> f64 {
    (a.lng - b.lng).hypot(a.lat - b.lat)
}

/// Position reached by moving `distance` from `from` along `angle_deg`
/// (0 = east, 90 = north).
pub fn step(from: Position, angle_deg: u32, distance: f64) -> Position {
    let theta = f64::from(angle_deg).to_radians();
    Position {
        lng: from.lng + theta.cos() * distance,
        lat: from.lat + theta.sin() * distance,
    }
}

pub fn within_bounds(p: Position, bounds: &Bounds) -> bool {
    p.lng >= bounds.min_lng
        && p.lng <= bounds.max_lng
        && p.lat >= bounds.min_lat
        && p.lat <= bounds.max_lat
}

fn within(a: f64, b: f64, value: f64) -> bool {
    value >= a.min(b) - EPSILON && value <= a.max(b) + EPSILON
}

fn in_box(p: Position, q: Position, r: Position) -> bool {
    within(p.lng, q.lng, r.lng) && within(p.lat, q.lat, r.lat)
}

fn is_degenerate(p: Position, q: Position) -> bool {
    distance(p, q) <= EPSILON
}

/// Whether point `r` lies on segment `[p, q]`.
fn on_segment(p: Position, q: Position, r: Position) -> bool {
    if is_degenerate(p, q) {
        return distance(p, r) <= EPSILON;
    }
    Line::through(p, q).distance_to(r) <= EPSILON && in_box(p, q, r)
}

/// Check whether segments `[a1, a2]` and `[b1, b2]` share at least one point.
///
/// Non-parallel lines are intersected directly and the crossing point is
/// tested against both bounding boxes. Parallel lines only intersect when
/// they are the same line and the segments overlap along it.
pub fn segments_intersect(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    if is_degenerate(a1, a2) {
        return on_segment(b1, b2, a1);
    }
    if is_degenerate(b1, b2) {
        return on_segment(a1, a2, b1);
    }

    let la = Line::through(a1, a2);
    let lb = Line::through(b1, b2);
    let det = la.a * lb.b - lb.a * la.b;

    if det.abs() > EPSILON * la.norm() * lb.norm() {
        let x = (la.b * lb.c - lb.b * la.c) / det;
        let y = (lb.a * la.c - la.a * lb.c) / det;
        let crossing = Position::new(x, y);
        return in_box(a1, a2, crossing) && in_box(b1, b2, crossing);
    }

    if la.distance_to(b1) > EPSILON {
        return false;
    }
    collinear_overlap(a1, a2, b1, b2)
}

/// Project both collinear segments onto the direction of `[a1, a2]` and
/// compare the resulting intervals.
fn collinear_overlap(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    let dx = a2.lng - a1.lng;
    let dy = a2.lat - a1.lat;
    let length = dx.hypot(dy);
    let project = |p: Position| ((p.lng - a1.lng) * dx + (p.lat - a1.lat) * dy) / length;

    let (b_start, b_end) = (project(b1), project(b2));
    let lo = b_start.min(b_end).max(0.0);
    let hi = b_start.max(b_end).min(length);
    lo <= hi + EPSILON
}

/// A move is legal when it ends inside the confinement area and crosses no
/// no-fly zone edge.
pub fn move_is_legal(start: Position, end: Position, obstacles: &[Obstacle], bounds: &Bounds) -> bool {
    if !within_bounds(end, bounds) {
        return false;
    }
    !obstacles.iter().any(|obstacle| {
        obstacle
            .edges()
            .any(|(e1, e2)| segments_intersect(start, end, e1, e2))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lng: f64, lat: f64) -> Position {
        Position::new(lng, lat)
    }

    fn square(name: &str, min: Position, max: Position) -> Obstacle {
        Obstacle {
            name: name.to_string(),
            ring: vec![
                p(min.lng, min.lat),
                p(max.lng, min.lat),
                p(max.lng, max.lat),
                p(min.lng, max.lat),
                p(min.lng, min.lat),
            ],
        }
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(1.0, 0.0)));
    }

    #[test]
    fn separated_segments_do_not_intersect() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 2.0)));
        // Lines cross, segments don't reach each other
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 1.0), p(3.0, 0.0), p(2.5, 0.5)));
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        assert!(segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 5.0)));
    }

    #[test]
    fn parallel_distinct_lines_do_not_intersect() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
    }

    #[test]
    fn collinear_overlap_with_exterior_endpoints_intersects() {
        // Edge fully contains the move; neither edge endpoint lies within the move's box.
        assert!(segments_intersect(p(1.0, 1.0), p(2.0, 2.0), p(0.0, 0.0), p(3.0, 3.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(3.0, 3.0), p(1.0, 1.0), p(2.0, 2.0)));
    }

    #[test]
    fn collinear_disjoint_segments_do_not_intersect() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)));
    }

    #[test]
    fn works_at_survey_area_scale() {
        let base = p(-3.1878, 55.9444);
        let end = step(base, 0, 0.0003);
        let edge_a = p(base.lng + 0.00015, base.lat - 0.0001);
        let edge_b = p(base.lng + 0.00015, base.lat + 0.0001);
        assert!(segments_intersect(base, end, edge_a, edge_b));

        let end = step(base, 180, 0.0003);
        assert!(!segments_intersect(base, end, edge_a, edge_b));
    }

    #[test]
    fn step_follows_heading() {
        let from = p(0.0, 0.0);
        let north = step(from, 90, 2.0);
        assert!(north.lng.abs() < 1e-12);
        assert!((north.lat - 2.0).abs() < 1e-12);
        assert!((distance(from, step(from, 230, 0.0003)) - 0.0003).abs() < 1e-15);
    }

    #[test]
    fn move_legality_checks_bounds_and_zones() {
        let bounds = Bounds {
            min_lng: 0.0,
            max_lng: 10.0,
            min_lat: 0.0,
            max_lat: 10.0,
        };
        let zone = square("block", p(4.0, 4.0), p(6.0, 6.0));
        let obstacles = vec![zone];

        assert!(move_is_legal(p(1.0, 1.0), p(2.0, 2.0), &obstacles, &bounds));
        assert!(!move_is_legal(p(3.0, 5.0), p(5.0, 5.0), &obstacles, &bounds));
        assert!(!move_is_legal(p(9.0, 9.0), p(11.0, 9.0), &obstacles, &bounds));
        // Sliding along an edge touches it
        assert!(!move_is_legal(p(3.0, 4.0), p(5.0, 4.0), &obstacles, &bounds));
        assert!(within_bounds(p(10.0, 0.0), &bounds));
    }
}
