//! Server-Sent Events source.
//!
//! Reads the `text/event-stream` body as a reqwest byte stream and frames it
//! with a small incremental parser: `event:`/`data:`/`id:` fields, `:`
//! comment lines, multi-line data joined with newlines, blank line ends a
//! frame. Frames whose event name is empty, `message`, or `meter` and whose
//! data parses as a snapshot become bus events; everything else is dropped.
//! On stream end or error the source reconnects after the poll interval.

use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::bus::Bus;
use crate::config::Config;
use crate::feed::SnapshotSource;
use crate::logging::{log_snapshot, log_source_error};
use crate::snapshot::Snapshot;

/// One parsed SSE frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    /// Snapshot frames: unnamed, the default `message`, or the named
    /// `meter` event the dev server emits.
    pub fn is_snapshot(&self) -> bool {
        matches!(self.event.as_str(), "" | "message" | "meter")
    }
}

/// Incremental `text/event-stream` parser; feed it chunks, take frames.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    event: String,
    data: Vec<String>,
    id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk of the body, returning every frame it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(frame) = self.flush() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                // comment line, typically a keepalive
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = value.to_string(),
                "data" => self.data.push(value.to_string()),
                "id" => self.id = Some(value.to_string()),
                _ => {} // unknown fields are ignored per the format
            }
        }
        frames
    }

    fn flush(&mut self) -> Option<SseFrame> {
        if self.event.is_empty() && self.data.is_empty() {
            return None;
        }
        let frame = SseFrame {
            event: std::mem::take(&mut self.event),
            data: self.data.join("\n"),
            id: self.id.clone(),
        };
        self.data.clear();
        Some(frame)
    }
}

pub struct SseSource {
    client: Client,
    push_url: String,
    reconnect: Duration,
}

impl SseSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            push_url: cfg.push_url.clone(),
            reconnect: Duration::from_secs(cfg.poll_secs),
        }
    }

    /// One connection lifetime; returns when the stream ends or errors.
    async fn stream_once(&self, bus: &Bus, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let resp = self
            .client
            .get(&self.push_url)
            .header("Accept", "text/event-stream")
            .send()
            .await?
            .error_for_status()?;
        let mut body = resp.bytes_stream();
        let mut parser = SseParser::new();
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        // Dropping the stream closes the connection.
                        return Ok(());
                    }
                }
                chunk = body.next() => {
                    let Some(chunk) = chunk else {
                        return Ok(());
                    };
                    let bytes = chunk?;
                    for frame in parser.push(&String::from_utf8_lossy(&bytes)) {
                        emit_frame(bus, &frame);
                    }
                }
            }
        }
    }
}

fn emit_frame(bus: &Bus, frame: &SseFrame) {
    if !frame.is_snapshot() {
        return;
    }
    match serde_json::from_str::<Snapshot>(&frame.data) {
        Ok(snap) => {
            log_snapshot("sse", snap.raised, snap.goal, snap.percent());
            bus.emit_snapshot(&snap);
        }
        Err(err) => log_source_error("sse", &err.to_string()),
    }
}

#[async_trait]
impl SnapshotSource for SseSource {
    fn name(&self) -> &'static str {
        "sse"
    }

    async fn run(self: Box<Self>, bus: Bus, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }
            if let Err(err) = self.stream_once(&bus, &mut shutdown).await {
                log_source_error("sse", &err.to_string());
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
