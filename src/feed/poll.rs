//! Polling source: GET the stats endpoint on a fixed interval.
//!
//! Failure contract: drop silently, retry on the next natural tick. No
//! backoff and no surfaced error: the meter is decorative, and a hammering
//! 15-second GET is not worth an escalation path.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::bus::Bus;
use crate::config::Config;
use crate::feed::SnapshotSource;
use crate::logging::{log_snapshot, log_source_error};
use crate::snapshot::Snapshot;

pub struct PollSource {
    client: Client,
    stats_url: String,
    every: Duration,
}

impl PollSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            stats_url: cfg.stats_url.clone(),
            every: Duration::from_secs(cfg.poll_secs),
        }
    }

    async fn fetch_once(&self, bus: &Bus) {
        match self.fetch(&self.stats_url).await {
            Ok(snap) => {
                log_snapshot("poll", snap.raised, snap.goal, snap.percent());
                bus.emit_snapshot(&snap);
            }
            Err(err) => log_source_error("poll", &err.to_string()),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Snapshot> {
        let snap = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Snapshot>()
            .await?;
        Ok(snap)
    }
}

#[async_trait]
impl SnapshotSource for PollSource {
    fn name(&self) -> &'static str {
        "poll"
    }

    async fn run(self: Box<Self>, bus: Bus, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
                _ = ticker.tick() => self.fetch_once(&bus).await,
            }
        }
    }
}
