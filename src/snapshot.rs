//! The fundraising snapshot: the one entity everything else consumes.
//!
//! A snapshot is transient. It exists as the payload of a single bus event
//! and is discarded once the consuming widgets have re-rendered. The derived
//! percent is never stored; it is recomputed from `(raised, goal)` on every
//! read so the displayed value can never drift from the totals.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::format::clamp_percent;

/// Current fundraising progress at a point in time.
///
/// Production templates spell the wire fields two ways (`raised` vs
/// `funds_raised`, `goal` vs `fundraising_goal`); both deserialize here. A
/// `percent` field on the wire is advisory only and is always recomputed
/// locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSnapshot")]
pub struct Snapshot {
    pub raised: f64,
    pub goal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSnapshot {
    #[serde(default, alias = "funds_raised")]
    raised: f64,
    #[serde(default, alias = "fundraising_goal")]
    goal: f64,
    #[serde(default, rename = "sponsorName", alias = "sponsor_name")]
    sponsor_name: Option<String>,
}

impl From<WireSnapshot> for Snapshot {
    fn from(w: WireSnapshot) -> Self {
        Snapshot::new(w.raised, w.goal).with_sponsor(w.sponsor_name)
    }
}

impl Snapshot {
    /// Builds a snapshot, coercing bad numbers: negative, NaN, and infinite
    /// inputs become 0.
    pub fn new(raised: f64, goal: f64) -> Self {
        Self {
            raised: coerce(raised),
            goal: coerce(goal),
            sponsor_name: None,
        }
    }

    pub fn with_sponsor(mut self, name: Option<String>) -> Self {
        self.sponsor_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    /// Derived progress percent, clamped to `[0, 100]`. A zero or missing
    /// goal yields 0, never NaN or infinity.
    pub fn percent(&self) -> f64 {
        if self.goal <= 0.0 {
            return 0.0;
        }
        clamp_percent(self.raised / self.goal * 100.0)
    }

    /// The stable bus-event detail shape:
    /// `{ raised, goal, percent, sponsorName? }`.
    pub fn to_detail(&self) -> Value {
        let mut detail = json!({
            "raised": self.raised,
            "goal": self.goal,
            "percent": self.percent(),
        });
        if let Some(name) = &self.sponsor_name {
            detail["sponsorName"] = json!(name);
        }
        detail
    }

    /// Rebuilds a snapshot from a bus-event detail; `None` when the detail
    /// carries no usable numbers.
    pub fn from_detail(detail: &Value) -> Option<Self> {
        if !detail.is_object() {
            return None;
        }
        serde_json::from_value(detail.clone()).ok()
    }
}

fn coerce(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    v.max(0.0)
}
