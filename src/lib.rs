//! FundPulse: live fundraising-meter engine.
//!
//! One coherent rendition of the pattern the FundChamps front-end repeats
//! across its hero/header widgets:
//!
//! ```text
//! snapshot source (poll / push) → event bus → metric projector → widgets
//! ```
//!
//! The crate is headless. Instead of a browser DOM it renders into a
//! [`surface::Surface`], a retained node tree addressed by id, which a host
//! can inspect, print, or mirror to any real display.

pub mod bus;
pub mod config;
pub mod engine;
pub mod feed;
pub mod format;
pub mod logging;
pub mod projector;
pub mod referral;
pub mod snapshot;
pub mod state;
pub mod surface;
pub mod widgets;
