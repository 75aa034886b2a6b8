//! WebSocket source: each text frame is one snapshot JSON document.
//!
//! Same drop semantics as the other sources: a malformed frame is logged
//! and skipped, never an error out of the read loop. The connection closes
//! explicitly on shutdown and reconnects after the poll interval otherwise.

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::bus::Bus;
use crate::config::Config;
use crate::feed::SnapshotSource;
use crate::logging::{log_snapshot, log_source_error};
use crate::snapshot::Snapshot;

pub struct WsSource {
    push_url: String,
    reconnect: Duration,
}

impl WsSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            push_url: cfg.push_url.clone(),
            reconnect: Duration::from_secs(cfg.poll_secs),
        }
    }

    async fn connect_once(&self, bus: &Bus, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let (ws, _) = connect_async(self.push_url.as_str()).await?;
        let (mut write, mut read) = ws.split();
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
                msg = read.next() => {
                    let Some(msg) = msg else {
                        return Ok(());
                    };
                    match msg? {
                        Message::Text(text) => emit_text(bus, &text),
                        Message::Ping(payload) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Message::Close(_) => return Ok(()),
                        _ => {}
                    }
                }
            }
        }
    }
}

fn emit_text(bus: &Bus, text: &str) {
    match serde_json::from_str::<Snapshot>(text) {
        Ok(snap) => {
            log_snapshot("ws", snap.raised, snap.goal, snap.percent());
            bus.emit_snapshot(&snap);
        }
        Err(err) => log_source_error("ws", &err.to_string()),
    }
}

#[async_trait]
impl SnapshotSource for WsSource {
    fn name(&self) -> &'static str {
        "ws"
    }

    async fn run(self: Box<Self>, bus: Bus, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }
            if let Err(err) = self.connect_once(&bus, &mut shutdown).await {
                log_source_error("ws", &err.to_string());
            }
            if *shutdown.borrow() {
                return Ok(());
            }
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
                _ = sleep(self.reconnect) => {}
            }
        }
    }
}
