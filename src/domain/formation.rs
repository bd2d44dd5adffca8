//! Formation geometry
//!
//! Pure, deterministic shape generation. All coordinates are relative to the
//! leader, which sits at the origin. Shapes are generated for a swarm of `n`
//! drones; [`assignable_slots`] then drops the leader's own origin point so the
//! remaining list can be handed out to followers.

use serde::{Deserialize, Serialize};

use super::mission::value_objects::FormationType;

/// Planar coordinate relative to the leader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Line formation: slot i at `(i * spacing, 0)` for i in `0..n`
pub fn line(n: usize, spacing: f64) -> Vec<Point> {
    (0..n).map(|i| Point::new(i as f64 * spacing, 0.0)).collect()
}

/// Vee formation centred on x = 0, arms rising at 60 degrees
pub fn vee(n: usize, spacing: f64) -> Vec<Point> {
    let centre = (n as f64 - 1.0) / 2.0;
    let slope = (std::f64::consts::PI / 3.0).tan();

    (0..n)
        .map(|i| {
            let x = (i as f64 - centre) * spacing;
            Point::new(x, x.abs() * slope)
        })
        .collect()
}

/// Ring formation: the origin followed by `n - 1` points on a circle
pub fn ring(n: usize, radius: f64) -> Vec<Point> {
    let mut points = Vec::with_capacity(n.max(1));
    points.push(Point::ORIGIN);

    let around = n.saturating_sub(1);
    for i in 0..around {
        let angle = 2.0 * std::f64::consts::PI * i as f64 / around as f64;
        points.push(Point::new(radius * angle.cos(), radius * angle.sin()));
    }

    points
}

/// Full coordinate list for a formation, including the leader's origin
/// where the shape has one
pub fn generate(formation: FormationType, n: usize, spacing: f64) -> Vec<Point> {
    match formation {
        FormationType::Line => line(n, spacing),
        FormationType::Vee => vee(n, spacing),
        FormationType::Ring => ring(n, spacing),
    }
}

/// Coordinates followers may claim: the generated shape without the
/// leader's origin point. Slot number `k` on the ledger is index `k - 1` here.
///
/// An even-sized Vee has no point at the vertex, so the shape is generated
/// one larger and its apex dropped. The leader stays at the vertex and the
/// `n` slots keep the arm spacing on both sides.
pub fn assignable_slots(formation: FormationType, n: usize, spacing: f64) -> Vec<Point> {
    let mut points = match formation {
        FormationType::Vee if n % 2 == 0 => vee(n + 1, spacing),
        _ => generate(formation, n, spacing),
    };
    if let Some(origin) = points.iter().position(Point::is_origin) {
        points.remove(origin);
    }
    points
}

/// Distance from `position` to every slot, in slot order
pub fn distances_from(position: &Point, slots: &[Point]) -> Vec<f64> {
    slots.iter().map(|slot| position.distance_to(slot)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn line_has_increasing_x_and_zero_y() {
        for n in 2..12 {
            for spacing in [0.5, 1.0, 3.0, 20.0] {
                let points = line(n, spacing);
                assert_eq!(points.len(), n);
                assert!(points.iter().all(|p| p.y == 0.0));
                assert!(points.windows(2).all(|w| w[1].x > w[0].x));
            }
        }
    }

    #[test]
    fn vee_is_symmetric_and_non_negative() {
        for n in 3..12 {
            let points = vee(n, 3.0);
            assert_eq!(points.len(), n);
            assert!(points.iter().all(|p| p.y >= 0.0));
            for p in &points {
                let mirrored = points
                    .iter()
                    .any(|q| (q.x + p.x).abs() < EPS && (q.y - p.y).abs() < EPS);
                assert!(mirrored, "no mirror for {:?} in n={}", p, n);
            }
        }
    }

    #[test]
    fn vee_arm_slope_is_sixty_degrees() {
        let points = vee(3, 2.0);
        assert!((points[0].x - -2.0).abs() < EPS);
        assert!((points[0].y - 2.0 * 3f64.sqrt()).abs() < EPS);
        assert_eq!(points[1], Point::ORIGIN);
    }

    #[test]
    fn ring_points_lie_on_radius() {
        for n in 3..12 {
            for radius in [1.0, 3.0, 20.0] {
                let points = ring(n, radius);
                assert_eq!(points.len(), n);
                assert_eq!(points[0], Point::ORIGIN);
                for p in &points[1..] {
                    assert!((p.distance_to(&Point::ORIGIN) - radius).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn assignable_slots_drop_origin() {
        assert_eq!(assignable_slots(FormationType::Line, 4, 3.0).len(), 3);
        assert_eq!(assignable_slots(FormationType::Ring, 4, 3.0).len(), 3);
        assert_eq!(assignable_slots(FormationType::Vee, 5, 3.0).len(), 4);
        for formation in [FormationType::Line, FormationType::Vee, FormationType::Ring] {
            assert!(!assignable_slots(formation, 5, 3.0).contains(&Point::ORIGIN));
        }
    }

    #[test]
    fn even_vee_keeps_leader_at_vertex() {
        let slots = assignable_slots(FormationType::Vee, 4, 3.0);
        let xs: Vec<f64> = slots.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-6.0, -3.0, 3.0, 6.0]);
        assert!(slots.iter().all(|p| p.y > 0.0));
        assert!((slots[1].y - slots[2].y).abs() < EPS);
    }

    #[test]
    fn distances_follow_slot_order() {
        let slots = vec![Point::new(3.0, 0.0), Point::new(0.0, 4.0)];
        let d = distances_from(&Point::ORIGIN, &slots);
        assert_eq!(d, vec![3.0, 4.0]);
    }
}
