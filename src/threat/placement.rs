//! Where a floor-level threat lands as a point hazard.
//!
//! Sensors report per floor, not per coordinate, so converting a threat into
//! a [`Hazard`](crate::model::Hazard) needs a position policy.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::config::LayoutConfig;
use super::ThreatKind;

/// Position policy for threat-derived hazards.
pub trait HazardPlacement {
    fn place(&mut self, floor: u32, kind: ThreatKind, layout: &LayoutConfig) -> (f64, f64);
}

/// Place on the floor's first elevator fixture, the building's central
/// hazard-prone point. Falls back to the footprint center.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixturePlacement;

impl HazardPlacement for FixturePlacement {
    fn place(&mut self, _floor: u32, _kind: ThreatKind, layout: &LayoutConfig) -> (f64, f64) {
        layout
            .elevators
            .first()
            .copied()
            .unwrap_or((layout.depth / 2.0, layout.width / 2.0))
    }
}

/// Always the same point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPoint {
    pub x: f64,
    pub y: f64,
}

impl FixedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl HazardPlacement for FixedPoint {
    fn place(&mut self, _floor: u32, _kind: ThreatKind, _layout: &LayoutConfig) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Uniform over the footprint, from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomPlacement {
    rng: ChaCha20Rng,
}

impl RandomPlacement {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha20Rng::seed_from_u64(seed) }
    }
}

impl HazardPlacement for RandomPlacement {
    fn place(&mut self, _floor: u32, _kind: ThreatKind, layout: &LayoutConfig) -> (f64, f64) {
        (self.rng.gen_range(0.0..=layout.depth), self.rng.gen_range(0.0..=layout.width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_is_first_elevator() {
        let layout = LayoutConfig::default();
        assert_eq!(FixturePlacement.place(2, ThreatKind::Fire, &layout), (8.0, 7.0));
        let bare = LayoutConfig { elevators: Vec::new(), ..LayoutConfig::default() };
        assert_eq!(FixturePlacement.place(2, ThreatKind::Fire, &bare), (8.5, 7.5));
    }

    #[test]
    fn test_random_stays_in_footprint_and_is_seeded() {
        let layout = LayoutConfig::default();
        let mut a = RandomPlacement::new(11);
        let mut b = RandomPlacement::new(11);
        for _ in 0..32 {
            let p = a.place(1, ThreatKind::GasLeak, &layout);
            assert_eq!(p, b.place(1, ThreatKind::GasLeak, &layout));
            assert!((0.0..=17.0).contains(&p.0) && (0.0..=15.0).contains(&p.1));
        }
    }
}
