//! Milestone badges: a pure recompute on every snapshot.
//!
//! A milestone is hit iff `percent >= threshold`, the one canonical rule,
//! applied here, in the confetti gate, and in the tests. The badge row keeps
//! no state of its own; monotonicity under non-decreasing percent falls out
//! of the pure function.

use crate::bus::{Bus, MILESTONE};
use crate::logging::log_milestone;
use crate::surface::Surface;

/// Surface id for the badge of a given threshold, e.g. `ms-25`.
pub fn badge_id(threshold: f64) -> String {
    if threshold.fract() == 0.0 {
        format!("ms-{}", threshold as u64)
    } else {
        format!("ms-{}", threshold)
    }
}

/// The hit subset of `thresholds` for `percent`; thresholds are ascending.
pub fn hit_set(percent: f64, thresholds: &[f64]) -> Vec<f64> {
    thresholds
        .iter()
        .copied()
        .filter(|m| percent >= *m)
        .collect()
}

pub struct MilestoneBadges {
    thresholds: Vec<f64>,
}

impl MilestoneBadges {
    /// Mounts when at least one badge node exists on the surface.
    pub fn mount(surface: &Surface, thresholds: &[f64]) -> Option<Self> {
        if !thresholds.iter().any(|m| surface.contains(&badge_id(*m))) {
            return None;
        }
        Some(Self {
            thresholds: thresholds.to_vec(),
        })
    }

    /// Toggles the `hit` class on every badge and emits `fc:milestone` for
    /// the hit ones. Stateless by design: emission dedup is the confetti
    /// trigger's job, not the badge row's.
    pub fn render(&self, surface: &mut Surface, bus: &Bus, percent: f64) {
        for m in &self.thresholds {
            let hit = percent >= *m;
            surface.toggle_class(&badge_id(*m), "hit", hit);
            surface.set_text(&badge_id(*m), &format!("{}%", m));
            if hit {
                bus.emit(MILESTONE, &serde_json::json!({ "milestone": m }));
                log_milestone(*m, percent);
            }
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: [f64; 4] = [25.0, 50.0, 75.0, 100.0];

    #[test]
    fn test_hit_set_boundary_is_inclusive() {
        assert_eq!(hit_set(24.999, &DEFAULTS), Vec::<f64>::new());
        assert_eq!(hit_set(25.0, &DEFAULTS), vec![25.0]);
        assert_eq!(hit_set(60.0, &DEFAULTS), vec![25.0, 50.0]);
        assert_eq!(hit_set(100.0, &DEFAULTS), DEFAULTS.to_vec());
    }

    #[test]
    fn test_hit_set_monotone_under_rising_percent() {
        let mut prev = 0;
        for pct in [0.0, 10.0, 25.0, 25.0, 49.9, 50.0, 80.0, 100.0] {
            let hits = hit_set(pct, &DEFAULTS).len();
            assert!(hits >= prev, "hit set shrank at {}%", pct);
            prev = hits;
        }
    }

    #[test]
    fn test_render_toggles_classes() {
        let mut s = Surface::new();
        for m in DEFAULTS {
            s.insert(&badge_id(m));
        }
        let bus = Bus::new();
        let badges = MilestoneBadges::mount(&s, &DEFAULTS).unwrap();
        badges.render(&mut s, &bus, 60.0);
        assert!(s.node("ms-25").unwrap().has_class("hit"));
        assert!(s.node("ms-50").unwrap().has_class("hit"));
        assert!(!s.node("ms-75").unwrap().has_class("hit"));
        assert_eq!(s.text("ms-75"), Some("75%"));
    }

    #[test]
    fn test_mount_requires_a_badge_node() {
        let s = Surface::new();
        assert!(MilestoneBadges::mount(&s, &DEFAULTS).is_none());
    }
}
