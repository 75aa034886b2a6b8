//! Campaign state: the latest applied snapshot plus a read view.
//!
//! Updated only through bus events; bins and tests read it through
//! [`CampaignState::view`] instead of reaching into fields mid-update.

use crate::snapshot::Snapshot;

#[derive(Debug, Default)]
pub struct CampaignState {
    latest: Option<Snapshot>,
    sponsor: Option<String>,
    updates: u64,
}

/// Plain-data read view of the campaign at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignView {
    pub raised: f64,
    pub goal: f64,
    pub percent: f64,
    pub sponsor: Option<String>,
    pub updates: u64,
}

impl CampaignState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a snapshot; returns false when it matches the one already
    /// held (the idempotence check consumers rely on).
    pub fn apply(&mut self, snap: &Snapshot) -> bool {
        let changed = self
            .latest
            .as_ref()
            .map(|prev| prev.raised != snap.raised || prev.goal != snap.goal)
            .unwrap_or(true);
        if let Some(name) = &snap.sponsor_name {
            self.sponsor = Some(name.clone());
        }
        if changed {
            self.latest = Some(snap.clone());
            self.updates += 1;
        }
        changed
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn view(&self) -> CampaignView {
        let (raised, goal, percent) = match &self.latest {
            Some(s) => (s.raised, s.goal, s.percent()),
            None => (0.0, 0.0, 0.0),
        };
        CampaignView {
            raised,
            goal,
            percent,
            sponsor: self.sponsor.clone(),
            updates: self.updates,
        }
    }
}
