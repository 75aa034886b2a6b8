//! Widget bindings: each owns a disjoint surface subtree and reacts to bus
//! events or engine ticks. Every `mount` returns `None` when its root nodes
//! are missing from the surface, so a page without that widget costs nothing.

pub mod confetti;
pub mod countdown;
pub mod milestones;
pub mod ticker;
