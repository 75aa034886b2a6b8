//! Snapshot sources: where `{raised, goal}` comes from.
//!
//! Three transports normalize into the same bus event, so widgets never
//! learn which one is active. Every source is best-effort: a bad fetch or a
//! malformed frame is dropped and the next tick or reconnect retries.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

use crate::bus::Bus;
use crate::config::Config;

pub mod poll;
pub mod sse;
pub mod ws;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Poll,
    Sse,
    Ws,
}

impl SourceKind {
    pub fn from_env() -> Self {
        Self::from_name(&std::env::var("SOURCE").unwrap_or_else(|_| "poll".to_string()))
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "sse" | "push" => SourceKind::Sse,
            "ws" | "websocket" => SourceKind::Ws,
            _ => SourceKind::Poll,
        }
    }

    pub fn build(self, cfg: &Config) -> Box<dyn SnapshotSource> {
        match self {
            SourceKind::Poll => Box::new(poll::PollSource::new(cfg)),
            SourceKind::Sse => Box::new(sse::SseSource::new(cfg)),
            SourceKind::Ws => Box::new(ws::WsSource::new(cfg)),
        }
    }
}

/// A running source loops until the shutdown signal flips, emitting bus
/// snapshot events as data arrives. Push connections close on the way out.
#[async_trait]
pub trait SnapshotSource: Send {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, bus: Bus, shutdown: watch::Receiver<bool>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_names() {
        assert_eq!(SourceKind::from_name("poll"), SourceKind::Poll);
        assert_eq!(SourceKind::from_name("SSE"), SourceKind::Sse);
        assert_eq!(SourceKind::from_name("push"), SourceKind::Sse);
        assert_eq!(SourceKind::from_name("websocket"), SourceKind::Ws);
        assert_eq!(SourceKind::from_name("mystery"), SourceKind::Poll);
    }
}
