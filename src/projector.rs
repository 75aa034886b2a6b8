//! Metric State Projector: snapshot in, surface writes out.
//!
//! The write set mirrors the header meter in the original templates: fill
//! width, percent text, raised/goal currency text, and the aria value pair.
//! Re-applying an identical snapshot is a no-op end to end, which is what
//! makes stale or duplicated feed delivery a cosmetic non-issue.

use std::time::Duration;

use crate::config::Config;
use crate::format::{currency_symbol, format_currency, format_percent};
use crate::logging::log_meter_render;
use crate::snapshot::Snapshot;
use crate::surface::Surface;

/// Surface ids the projector writes; defaults match the header-meter markup.
#[derive(Debug, Clone)]
pub struct ProjectorIds {
    pub meter: String,
    pub fill: String,
    pub percent: String,
    pub raised: String,
    pub goal: String,
}

impl Default for ProjectorIds {
    fn default() -> Self {
        Self {
            meter: "hdr-meter".to_string(),
            fill: "hdr-fill".to_string(),
            percent: "hdr-pct".to_string(),
            raised: "hdr-raised".to_string(),
            goal: "hdr-goal".to_string(),
        }
    }
}

#[derive(Debug)]
struct Tween {
    from: f64,
    to: f64,
    elapsed: Duration,
    duration: Duration,
}

pub struct Projector {
    ids: ProjectorIds,
    symbol: String,
    locale: String,
    animate: Duration,
    reduced_motion: bool,
    applied: Option<(f64, f64)>,
    shown_percent: f64,
    tween: Option<Tween>,
}

impl Projector {
    pub fn new(cfg: &Config) -> Self {
        Self::with_ids(cfg, ProjectorIds::default())
    }

    pub fn with_ids(cfg: &Config, ids: ProjectorIds) -> Self {
        Self {
            ids,
            symbol: currency_symbol(&cfg.currency),
            locale: cfg.locale.clone(),
            animate: Duration::from_millis(cfg.animate_ms),
            reduced_motion: cfg.reduced_motion,
            applied: None,
            shown_percent: 0.0,
            tween: None,
        }
    }

    /// Applies a snapshot. Returns false (and writes nothing) when it equals
    /// the last applied `(raised, goal)` pair.
    pub fn apply(&mut self, surface: &mut Surface, snap: &Snapshot) -> bool {
        if self.applied == Some((snap.raised, snap.goal)) {
            return false;
        }
        self.applied = Some((snap.raised, snap.goal));

        let target = snap.percent();
        surface.set_text(
            &self.ids.raised,
            &format_currency(snap.raised, &self.symbol, &self.locale),
        );
        surface.set_text(
            &self.ids.goal,
            &format_currency(snap.goal, &self.symbol, &self.locale),
        );
        surface.set_attr(&self.ids.meter, "aria-valuemin", "0");
        surface.set_attr(&self.ids.meter, "aria-valuemax", "100");
        surface.set_attr(
            &self.ids.meter,
            "aria-label",
            &format!(
                "Raised {} of {} — {:.1} percent",
                format_currency(snap.raised, &self.symbol, &self.locale),
                format_currency(snap.goal, &self.symbol, &self.locale),
                target,
            ),
        );

        let animate = !self.reduced_motion && !self.animate.is_zero();
        if animate {
            self.tween = Some(Tween {
                from: self.shown_percent,
                to: target,
                elapsed: Duration::ZERO,
                duration: self.animate,
            });
        } else {
            self.tween = None;
            self.write_percent(surface, target);
        }
        log_meter_render(target, animate);
        true
    }

    /// Advances a live tween by `dt`, writing the interpolated percent.
    /// Returns true while more steps are pending. The last step lands
    /// exactly on the target value.
    pub fn step(&mut self, surface: &mut Surface, dt: Duration) -> bool {
        let Some(tween) = self.tween.as_mut() else {
            return false;
        };
        tween.elapsed += dt;
        if tween.elapsed >= tween.duration {
            let to = tween.to;
            self.tween = None;
            self.write_percent(surface, to);
            return false;
        }
        let t = tween.elapsed.as_secs_f64() / tween.duration.as_secs_f64();
        let value = tween.from + (tween.to - tween.from) * ease_out_cubic(t);
        let (from, to) = (tween.from, tween.to);
        // Interpolation stays inside [from, to] because the curve maps [0,1]
        // onto [0,1]; clamp anyway so a float hiccup can never leak past 100.
        let value = value.clamp(from.min(to), from.max(to));
        self.write_percent(surface, value);
        true
    }

    /// Runs any pending tween to completion in one step.
    pub fn finish(&mut self, surface: &mut Surface) {
        if let Some(tween) = self.tween.take() {
            let to = tween.to;
            self.write_percent(surface, to);
        }
    }

    pub fn animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn shown_percent(&self) -> f64 {
        self.shown_percent
    }

    fn write_percent(&mut self, surface: &mut Surface, percent: f64) {
        self.shown_percent = percent;
        surface.set_style(&self.ids.fill, "width", &format!("{:.1}%", percent));
        surface.set_text(&self.ids.percent, &format_percent(percent));
        surface.set_attr(&self.ids.meter, "aria-valuenow", &format!("{:.1}", percent));
    }
}

/// Ease-out cubic: fast start, soft landing.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
