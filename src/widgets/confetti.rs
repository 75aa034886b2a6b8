//! Confetti trigger: at most one burst per milestone crossing.
//!
//! Tracks which thresholds have already fired so repeated snapshots at the
//! same percent, or a dip and re-cross, never re-trigger a burst. Suppressed
//! entirely under reduced motion; the particle budget and visibility gate
//! follow the hero's `dropConfetti`.

use rand::Rng;

use crate::bus::{Bus, CONFETTI};
use crate::config::Config;

pub const PARTICLES_MIN: u32 = 60;
pub const PARTICLES_MAX: u32 = 700;

pub struct ConfettiTrigger {
    thresholds: Vec<f64>,
    fired: Vec<bool>,
    enabled: bool,
    reduced_motion: bool,
}

impl ConfettiTrigger {
    pub fn new(cfg: &Config) -> Self {
        Self {
            thresholds: cfg.milestones.clone(),
            fired: vec![false; cfg.milestones.len()],
            enabled: cfg.confetti,
            reduced_motion: cfg.reduced_motion,
        }
    }

    /// Fires one `fc:confetti` event per newly crossed threshold; returns
    /// the thresholds that fired this call.
    pub fn on_percent(&mut self, bus: &Bus, percent: f64) -> Vec<f64> {
        if !self.enabled || self.reduced_motion {
            return Vec::new();
        }
        let mut fired_now = Vec::new();
        for (i, m) in self.thresholds.iter().enumerate() {
            if percent >= *m && !self.fired[i] {
                self.fired[i] = true;
                let particles = rand::thread_rng().gen_range(PARTICLES_MIN..=PARTICLES_MAX);
                bus.emit(
                    CONFETTI,
                    &serde_json::json!({ "milestone": m, "particles": particles }),
                );
                fired_now.push(*m);
            }
        }
        fired_now
    }

    pub fn fired_thresholds(&self) -> Vec<f64> {
        self.thresholds
            .iter()
            .zip(&self.fired)
            .filter(|(_, f)| **f)
            .map(|(m, _)| *m)
            .collect()
    }
}
