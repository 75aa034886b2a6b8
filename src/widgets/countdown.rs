//! Deadline countdown: Idle → Active → Ended, and Ended is terminal.
//!
//! Mirrors the hero countdown: day/hour/minute/second slots recomputed each
//! tick from the wall clock, two-digit zero padding, and a terminal "ended"
//! label after the deadline. Once Ended, the tick reports `Stop` so the
//! engine clears the interval; any stray later tick is a no-op.

use chrono::{DateTime, Utc};

use crate::surface::Surface;

pub const LABEL_ID: &str = "count-label";
pub const SLOT_IDS: [&str; 4] = ["count-dd", "count-hh", "count-mm", "count-ss"];
pub const ENDED_TEXT: &str = "ended";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Ended,
}

/// What the engine should do with the countdown interval after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct Countdown {
    deadline: DateTime<Utc>,
    phase: Phase,
}

impl Countdown {
    /// Mounts against the surface; `None` when the label node is absent or
    /// the deadline is already unusable at mount time (stays Idle; an
    /// already-past deadline renders the terminal text immediately).
    pub fn mount(surface: &mut Surface, deadline: DateTime<Utc>) -> Option<Self> {
        if !surface.contains(LABEL_ID) {
            return None;
        }
        let mut cd = Self {
            deadline,
            phase: Phase::Idle,
        };
        if deadline > Utc::now() {
            cd.phase = Phase::Active;
        } else {
            cd.finish(surface);
        }
        Some(cd)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Recomputes the remaining time against `now` and writes the slots.
    pub fn tick(&mut self, surface: &mut Surface, now: DateTime<Utc>) -> Tick {
        match self.phase {
            Phase::Ended => Tick::Stop,
            Phase::Idle => Tick::Stop,
            Phase::Active => {
                let remaining = (self.deadline - now).num_seconds();
                if remaining <= 0 {
                    self.finish(surface);
                    return Tick::Stop;
                }
                let secs = remaining as u64;
                let (dd, hh, mm, ss) = (
                    secs / 86_400,
                    secs % 86_400 / 3_600,
                    secs % 3_600 / 60,
                    secs % 60,
                );
                surface.set_text("count-dd", &dd.to_string());
                surface.set_text("count-hh", &format!("{:02}", hh));
                surface.set_text("count-mm", &format!("{:02}", mm));
                surface.set_text("count-ss", &format!("{:02}", ss));
                surface.set_text(
                    LABEL_ID,
                    &format!("{}d : {:02}h : {:02}m : {:02}s", dd, hh, mm, ss),
                );
                Tick::Continue
            }
        }
    }

    fn finish(&mut self, surface: &mut Surface) {
        self.phase = Phase::Ended;
        surface.set_text(LABEL_ID, ENDED_TEXT);
        for slot in SLOT_IDS {
            surface.set_text(slot, "00");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn surface() -> Surface {
        let mut s = Surface::new();
        s.insert(LABEL_ID);
        for id in SLOT_IDS {
            s.insert(id);
        }
        s
    }

    #[test]
    fn test_mount_without_nodes_is_none() {
        let mut s = Surface::new();
        assert!(Countdown::mount(&mut s, Utc::now() + Duration::hours(1)).is_none());
    }

    #[test]
    fn test_active_tick_writes_slots() {
        let mut s = surface();
        let now = Utc::now();
        let mut cd = Countdown::mount(&mut s, now + Duration::days(2) + Duration::hours(3)).unwrap();
        assert_eq!(cd.phase(), Phase::Active);
        assert_eq!(cd.tick(&mut s, now), Tick::Continue);
        assert_eq!(s.text("count-dd"), Some("2"));
        assert_eq!(s.text("count-hh"), Some("03"));
    }

    #[test]
    fn test_deadline_pass_is_terminal() {
        let mut s = surface();
        let now = Utc::now();
        let mut cd = Countdown::mount(&mut s, now + Duration::seconds(5)).unwrap();
        assert_eq!(cd.tick(&mut s, now + Duration::seconds(10)), Tick::Stop);
        assert_eq!(cd.phase(), Phase::Ended);
        assert_eq!(s.text(LABEL_ID), Some(ENDED_TEXT));

        // A stray tick after the interval was cleared changes nothing.
        let writes = s.write_count();
        assert_eq!(cd.tick(&mut s, now + Duration::seconds(60)), Tick::Stop);
        assert_eq!(s.write_count(), writes);
        assert_eq!(s.text(LABEL_ID), Some(ENDED_TEXT));
    }

    #[test]
    fn test_past_deadline_at_mount_renders_ended() {
        let mut s = surface();
        let cd = Countdown::mount(&mut s, Utc::now() - Duration::hours(1)).unwrap();
        assert_eq!(cd.phase(), Phase::Ended);
        assert_eq!(s.text(LABEL_ID), Some(ENDED_TEXT));
    }
}
