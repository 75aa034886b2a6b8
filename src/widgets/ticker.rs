//! Donor ticker: a rotation index over a refreshable item list.
//!
//! The one widget with an explicit pause/resume toggle (the hover/focus
//! analog): a boolean gates the tick effect, and flipping it emits
//! `fc:ticker:toggle` with the new state plus an `aria-pressed` write on the
//! pause control.

use serde::Deserialize;

use crate::bus::{Bus, TICKER_TOGGLE};
use crate::surface::Surface;

pub const ROOT_ID: &str = "fc-ticker";
pub const ITEM_ID: &str = "fc-ticker-item";
pub const COUNT_ID: &str = "fc-ticker-count";
pub const PAUSE_ID: &str = "fc-ticker-pause";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickerItem {
    pub text: String,
    #[serde(default)]
    pub pill: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

impl TickerItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pill: None,
            icon: None,
            href: None,
        }
    }
}

/// Feeds in the wild return either a bare array or `{"items": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Feed {
    Bare(Vec<TickerItem>),
    Wrapped { items: Vec<TickerItem> },
}

/// Parses a feed body; a malformed body is an empty list, never an error.
pub fn parse_feed(body: &str) -> Vec<TickerItem> {
    match serde_json::from_str::<Feed>(body) {
        Ok(Feed::Bare(items)) | Ok(Feed::Wrapped { items }) => items,
        Err(_) => Vec::new(),
    }
}

pub struct Ticker {
    items: Vec<TickerItem>,
    idx: usize,
    paused: bool,
}

impl Ticker {
    pub fn mount(surface: &mut Surface, items: Vec<TickerItem>) -> Option<Self> {
        if !surface.contains(ROOT_ID) {
            return None;
        }
        let mut t = Self {
            items,
            idx: 0,
            paused: false,
        };
        t.render(surface);
        Some(t)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current(&self) -> Option<&TickerItem> {
        self.items.get(self.idx)
    }

    /// The interval tick: advances one item unless paused or empty.
    pub fn advance(&mut self, surface: &mut Surface) {
        if self.paused || self.items.is_empty() {
            return;
        }
        self.idx = (self.idx + 1) % self.items.len();
        self.render(surface);
    }

    pub fn next(&mut self, surface: &mut Surface) {
        if self.items.is_empty() {
            return;
        }
        self.idx = (self.idx + 1) % self.items.len();
        self.render(surface);
    }

    pub fn prev(&mut self, surface: &mut Surface) {
        if self.items.is_empty() {
            return;
        }
        self.idx = (self.idx + self.items.len() - 1) % self.items.len();
        self.render(surface);
    }

    pub fn toggle_pause(&mut self, surface: &mut Surface, bus: &Bus) {
        self.set_paused(!self.paused, surface, bus);
    }

    pub fn set_paused(&mut self, paused: bool, surface: &mut Surface, bus: &Bus) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        surface.set_attr(PAUSE_ID, "aria-pressed", if paused { "true" } else { "false" });
        bus.emit(TICKER_TOGGLE, &serde_json::json!({ "paused": paused }));
    }

    /// Replaces the item list (server-refreshed feeds); the index clamps so
    /// the current position survives shrinkage.
    pub fn set_items(&mut self, surface: &mut Surface, items: Vec<TickerItem>) {
        self.items = items;
        if self.idx >= self.items.len() {
            self.idx = self.items.len().saturating_sub(1);
        }
        self.render(surface);
    }

    /// Appends one item; the sponsor-spotlight bridge uses this.
    pub fn push_item(&mut self, surface: &mut Surface, item: TickerItem) {
        self.items.push(item);
        self.render(surface);
    }

    fn render(&self, surface: &mut Surface) {
        let text = self.current().map(|i| i.text.as_str()).unwrap_or("");
        surface.set_text(ITEM_ID, text);
        surface.set_text(COUNT_ID, &self.items.len().to_string());
        surface.toggle_class(ROOT_ID, "show", !self.items.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        let mut s = Surface::new();
        for id in [ROOT_ID, ITEM_ID, COUNT_ID, PAUSE_ID] {
            s.insert(id);
        }
        s
    }

    fn items(n: usize) -> Vec<TickerItem> {
        (0..n).map(|i| TickerItem::text(format!("item-{}", i))).collect()
    }

    #[test]
    fn test_advance_wraps() {
        let mut s = surface();
        let mut t = Ticker::mount(&mut s, items(3)).unwrap();
        t.advance(&mut s);
        t.advance(&mut s);
        t.advance(&mut s);
        assert_eq!(s.text(ITEM_ID), Some("item-0"));
        assert_eq!(s.text(COUNT_ID), Some("3"));
    }

    #[test]
    fn test_pause_gates_advance_and_emits_toggle() {
        let mut s = surface();
        let bus = Bus::new();
        let toggles = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = toggles.clone();
        let _sub = bus.on(TICKER_TOGGLE, move |d| {
            seen.lock().unwrap().push(d["paused"].as_bool().unwrap());
        });
        let mut t = Ticker::mount(&mut s, items(2)).unwrap();
        t.toggle_pause(&mut s, &bus);
        assert!(t.is_paused());
        assert_eq!(s.node(PAUSE_ID).unwrap().attr("aria-pressed"), Some("true"));
        t.advance(&mut s);
        assert_eq!(s.text(ITEM_ID), Some("item-0"));
        t.toggle_pause(&mut s, &bus);
        t.advance(&mut s);
        assert_eq!(s.text(ITEM_ID), Some("item-1"));
        assert_eq!(*toggles.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_prev_wraps_backward() {
        let mut s = surface();
        let mut t = Ticker::mount(&mut s, items(3)).unwrap();
        t.prev(&mut s);
        assert_eq!(s.text(ITEM_ID), Some("item-2"));
    }

    #[test]
    fn test_set_items_clamps_index() {
        let mut s = surface();
        let mut t = Ticker::mount(&mut s, items(5)).unwrap();
        for _ in 0..4 {
            t.advance(&mut s);
        }
        // Shrinking the list pulls the index back to the last valid slot.
        t.set_items(&mut s, items(2));
        assert_eq!(s.text(ITEM_ID), Some("item-1"));
        assert_eq!(s.text(COUNT_ID), Some("2"));
        t.set_items(&mut s, Vec::new());
        assert_eq!(s.text(ITEM_ID), Some(""));
        t.set_items(&mut s, items(3));
        assert_eq!(s.text(ITEM_ID), Some("item-0"));
    }

    #[test]
    fn test_parse_feed_accepts_both_shapes() {
        let bare = r#"[{"text":"a"},{"text":"b","pill":"new"}]"#;
        let wrapped = r#"{"items":[{"text":"a"}]}"#;
        assert_eq!(parse_feed(bare).len(), 2);
        assert_eq!(parse_feed(wrapped).len(), 1);
        assert!(parse_feed("not json").is_empty());
    }

    #[test]
    fn test_empty_ticker_hides() {
        let mut s = surface();
        let mut t = Ticker::mount(&mut s, Vec::new()).unwrap();
        assert!(!s.node(ROOT_ID).unwrap().has_class("show"));
        t.push_item(&mut s, TickerItem::text("first"));
        assert!(s.node(ROOT_ID).unwrap().has_class("show"));
        assert_eq!(s.text(ITEM_ID), Some("first"));
    }
}
