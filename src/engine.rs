//! Composition root: builds the surface, bus, projector, and widgets, wires
//! the subscriptions, and drives the timers.
//!
//! The run loop owns every interval (render ticks for the tween, countdown,
//! ticker rotation, ticker feed refresh) and a `watch` shutdown signal that
//! the spawned snapshot source also observes. On shutdown the loop stops all
//! intervals and waits for the source to close its connection; nothing is
//! left ticking after the page-unload analog.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use reqwest::Client;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::bus::{Bus, Subscription};
use crate::config::Config;
use crate::feed::SourceKind;
use crate::logging::{json_log, log_shutdown, obj, v_str};
use crate::projector::Projector;
use crate::snapshot::Snapshot;
use crate::state::{CampaignState, CampaignView};
use crate::surface::Surface;
use crate::widgets::confetti::ConfettiTrigger;
use crate::widgets::countdown::{self, Countdown, Tick};
use crate::widgets::milestones::{badge_id, MilestoneBadges};
use crate::widgets::ticker::{self, parse_feed, Ticker, TickerItem};

/// Builds the standard campaign page surface: header meter, milestone
/// badges, countdown, ticker. Hosts with a different layout can hand the
/// engine their own surface instead.
pub fn campaign_surface(cfg: &Config) -> Surface {
    let mut s = Surface::new();
    for id in ["hdr-meter", "hdr-fill", "hdr-pct", "hdr-raised", "hdr-goal"] {
        s.insert(id);
    }
    for m in &cfg.milestones {
        s.insert(&badge_id(*m));
    }
    s.insert(countdown::LABEL_ID);
    for id in countdown::SLOT_IDS {
        s.insert(id);
    }
    for id in [
        ticker::ROOT_ID,
        ticker::ITEM_ID,
        ticker::COUNT_ID,
        ticker::PAUSE_ID,
    ] {
        s.insert(id);
    }
    s
}

pub struct Engine {
    cfg: Config,
    bus: Bus,
    surface: Arc<Mutex<Surface>>,
    state: Arc<Mutex<CampaignState>>,
    projector: Arc<Mutex<Projector>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    countdown: Option<Countdown>,
    _subs: Vec<Subscription>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self::with_surface(cfg.clone(), campaign_surface(&cfg))
    }

    pub fn with_surface(cfg: Config, surface: Surface) -> Self {
        let bus = Bus::new();
        let surface = Arc::new(Mutex::new(surface));
        let state = Arc::new(Mutex::new(CampaignState::new()));
        let projector = Arc::new(Mutex::new(Projector::new(&cfg)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let countdown = cfg
            .deadline
            .and_then(|dl| Countdown::mount(&mut surface.lock().expect("surface lock"), dl));
        let ticker = Arc::new(Mutex::new(Ticker::mount(
            &mut surface.lock().expect("surface lock"),
            Vec::new(),
        )));

        let badges = {
            let s = surface.lock().expect("surface lock");
            MilestoneBadges::mount(&s, &cfg.milestones)
        };
        let confetti = Mutex::new(ConfettiTrigger::new(&cfg));

        let mut subs = Vec::new();
        {
            let surface = surface.clone();
            let state = state.clone();
            let projector = projector.clone();
            let ticker = ticker.clone();
            let bus_inner = bus.clone();
            let last_sponsor: Mutex<Option<String>> = Mutex::new(None);
            subs.extend(bus.on_snapshot(move |snap: &Snapshot| {
                let mut surface = surface.lock().expect("surface lock");
                let changed = state.lock().expect("state lock").apply(snap);
                if changed {
                    let percent = snap.percent();
                    projector
                        .lock()
                        .expect("projector lock")
                        .apply(&mut surface, snap);
                    if let Some(badges) = &badges {
                        badges.render(&mut surface, &bus_inner, percent);
                    }
                    confetti
                        .lock()
                        .expect("confetti lock")
                        .on_percent(&bus_inner, percent);
                }
                // Sponsor spotlight: a newly seen name becomes a ticker item.
                if let Some(name) = &snap.sponsor_name {
                    let mut last = last_sponsor.lock().expect("sponsor lock");
                    if last.as_deref() != Some(name.as_str()) {
                        *last = Some(name.clone());
                        if let Some(t) = ticker.lock().expect("ticker lock").as_mut() {
                            t.push_item(
                                &mut surface,
                                TickerItem::text(format!("New sponsor: {}", name)),
                            );
                        }
                    }
                }
            }));
        }

        Self {
            cfg,
            bus,
            surface,
            state,
            projector,
            ticker,
            countdown,
            _subs: subs,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    pub fn surface(&self) -> Arc<Mutex<Surface>> {
        self.surface.clone()
    }

    pub fn view(&self) -> CampaignView {
        self.state.lock().expect("state lock").view()
    }

    pub fn surface_summary(&self) -> String {
        self.surface.lock().expect("surface lock").render_summary()
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Flips the shutdown signal; sources and the run loop stop promptly.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Synchronous drive path: emits the snapshot and runs any tween to
    /// completion in one step. Replay and tests use this; no runtime needed.
    pub fn inject(&self, snap: &Snapshot) {
        self.bus.emit_snapshot(snap);
        let mut surface = self.surface.lock().expect("surface lock");
        self.projector
            .lock()
            .expect("projector lock")
            .finish(&mut surface);
    }

    /// Drives the engine until ctrl-c or a programmatic shutdown.
    pub async fn run(mut self) -> Result<()> {
        json_log(
            "engine",
            obj(&[
                ("source", v_str(&self.cfg.source)),
                ("config_hash", v_str(&self.cfg.config_hash())),
            ]),
        );

        let source = SourceKind::from_name(&self.cfg.source).build(&self.cfg);
        let source_task = tokio::spawn(source.run(self.bus.clone(), self.shutdown_rx.clone()));

        let render_dt = Duration::from_millis(self.cfg.render_ms);
        let mut render = interval(render_dt);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut countdown_iv = interval(Duration::from_secs(self.cfg.countdown_secs));
        let mut ticker_iv = interval(Duration::from_secs(self.cfg.ticker_secs));
        let mut feed_iv = interval(Duration::from_secs(self.cfg.poll_secs));
        feed_iv.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let client = Client::new();
        let mut countdown_done = self.countdown.is_none();
        let mut rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    log_shutdown("ctrl-c");
                    self.trigger_shutdown();
                }
                _ = rx.changed() => {
                    if *rx.borrow() {
                        break;
                    }
                }
                _ = render.tick() => {
                    let mut surface = self.surface.lock().expect("surface lock");
                    self.projector
                        .lock()
                        .expect("projector lock")
                        .step(&mut surface, render_dt);
                }
                _ = countdown_iv.tick(), if !countdown_done => {
                    let mut surface = self.surface.lock().expect("surface lock");
                    if let Some(cd) = self.countdown.as_mut() {
                        if cd.tick(&mut surface, chrono::Utc::now()) == Tick::Stop {
                            countdown_done = true;
                        }
                    }
                }
                _ = ticker_iv.tick() => {
                    let mut surface = self.surface.lock().expect("surface lock");
                    if let Some(t) = self.ticker.lock().expect("ticker lock").as_mut() {
                        t.advance(&mut surface);
                    }
                }
                _ = feed_iv.tick(), if self.cfg.ticker_feed_url.is_some() => {
                    if let Some(url) = &self.cfg.ticker_feed_url {
                        // Spawned so a slow feed fetch never stalls the
                        // render tween or the other intervals.
                        tokio::spawn(refresh_ticker_feed(
                            client.clone(),
                            url.clone(),
                            self.ticker.clone(),
                            self.surface.clone(),
                        ));
                    }
                }
            }
        }

        log_shutdown("engine loop stopped");
        let _ = source_task.await;
        Ok(())
    }
}

/// Best-effort ticker feed refresh: a failed fetch or empty body leaves the
/// current items in place.
async fn refresh_ticker_feed(
    client: Client,
    url: String,
    ticker: Arc<Mutex<Option<Ticker>>>,
    surface: Arc<Mutex<Surface>>,
) {
    let body = match client.get(url).send().await {
        Ok(resp) => match resp.text().await {
            Ok(body) => body,
            Err(_) => return,
        },
        Err(_) => return,
    };
    let items = parse_feed(&body);
    if items.is_empty() {
        return;
    }
    let mut surface = surface.lock().expect("surface lock");
    if let Some(t) = ticker.lock().expect("ticker lock").as_mut() {
        t.set_items(&mut surface, items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_feed_refresh_keeps_items() {
        let surface = Arc::new(Mutex::new(campaign_surface(&Config::default())));
        let rotation = {
            let mut s = surface.lock().unwrap();
            Arc::new(Mutex::new(Ticker::mount(
                &mut s,
                vec![TickerItem::text("keep me")],
            )))
        };
        refresh_ticker_feed(
            Client::new(),
            "http://127.0.0.1:1/ticker.json".into(),
            rotation,
            surface.clone(),
        )
        .await;
        assert_eq!(
            surface.lock().unwrap().text(ticker::ITEM_ID),
            Some("keep me")
        );
    }
}
