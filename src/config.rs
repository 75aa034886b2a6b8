//! Environment-driven configuration.
//!
//! Every knob reads an env var with a parsed fallback, so a bare
//! `fundpulse` run works against the bundled dev stats server.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug)]
pub struct Config {
    /// Stats endpoint for the polling source.
    pub stats_url: String,
    /// SSE or WebSocket endpoint for the push sources.
    pub push_url: String,
    /// Which source feeds the bus: "poll", "sse", or "ws".
    pub source: String,
    /// Poll interval; also the push reconnect delay.
    pub poll_secs: u64,
    /// Ascending milestone thresholds in percent.
    pub milestones: Vec<f64>,
    /// Campaign deadline (RFC 3339); absent means no countdown.
    pub deadline: Option<DateTime<Utc>>,
    /// Countdown tick interval, clamped to 1–30 s.
    pub countdown_secs: u64,
    /// Ticker rotation interval.
    pub ticker_secs: u64,
    /// Optional donor-ticker feed endpoint.
    pub ticker_feed_url: Option<String>,
    pub currency: String,
    pub locale: String,
    /// Confetti on milestone crossings.
    pub confetti: bool,
    /// The prefers-reduced-motion analog: disables tweens and confetti.
    pub reduced_motion: bool,
    /// Percent tween duration in milliseconds; 0 disables animation.
    pub animate_ms: u64,
    /// Projector render-tick interval while a tween is live.
    pub render_ms: u64,
    pub ref_db_path: String,
    pub ref_ttl_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats_url: "http://127.0.0.1:8787/api/stats".to_string(),
            push_url: "http://127.0.0.1:8787/events".to_string(),
            source: "poll".to_string(),
            poll_secs: 15,
            milestones: vec![25.0, 50.0, 75.0, 100.0],
            deadline: None,
            countdown_secs: 1,
            ticker_secs: 6,
            ticker_feed_url: None,
            currency: "USD".to_string(),
            locale: "en-US".to_string(),
            confetti: true,
            reduced_motion: false,
            animate_ms: 900,
            render_ms: 50,
            ref_db_path: "./fundpulse.sqlite".to_string(),
            ref_ttl_days: 7,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            stats_url: std::env::var("STATS_URL").unwrap_or(d.stats_url),
            push_url: std::env::var("PUSH_URL").unwrap_or(d.push_url),
            source: std::env::var("SOURCE").unwrap_or(d.source),
            poll_secs: env_parse("POLL_SECS", d.poll_secs).max(1),
            milestones: std::env::var("MILESTONES")
                .ok()
                .map(|v| parse_milestones(&v))
                .filter(|m| !m.is_empty())
                .unwrap_or(d.milestones),
            deadline: std::env::var("DEADLINE")
                .ok()
                .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            countdown_secs: env_parse("COUNTDOWN_SECS", d.countdown_secs).clamp(1, 30),
            ticker_secs: env_parse("TICKER_SECS", d.ticker_secs).max(1),
            ticker_feed_url: std::env::var("TICKER_FEED_URL").ok(),
            currency: std::env::var("CURRENCY").unwrap_or(d.currency),
            locale: std::env::var("LOCALE").unwrap_or(d.locale),
            confetti: env_flag("CONFETTI", d.confetti),
            reduced_motion: env_flag("REDUCED_MOTION", d.reduced_motion),
            animate_ms: env_parse("ANIMATE_MS", d.animate_ms),
            render_ms: env_parse("RENDER_MS", d.render_ms).max(10),
            ref_db_path: std::env::var("REF_DB_PATH").unwrap_or(d.ref_db_path),
            ref_ttl_days: env_parse("REF_TTL_DAYS", d.ref_ttl_days).max(0),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "stats_url": self.stats_url,
            "push_url": self.push_url,
            "source": self.source,
            "poll_secs": self.poll_secs,
            "milestones": self.milestones,
            "deadline": self.deadline.map(|d| d.to_rfc3339()),
            "countdown_secs": self.countdown_secs,
            "ticker_secs": self.ticker_secs,
            "ticker_feed_url": self.ticker_feed_url,
            "currency": self.currency,
            "locale": self.locale,
            "confetti": self.confetti,
            "reduced_motion": self.reduced_motion,
            "animate_ms": self.animate_ms,
            "render_ms": self.render_ms,
            "ref_db_path": self.ref_db_path,
            "ref_ttl_days": self.ref_ttl_days,
        })
    }

    /// SHA-256 over the canonical JSON form; lets run manifests prove two
    /// runs saw the same configuration.
    pub fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json().to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn env_flag(key: &str, fallback: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(fallback)
}

/// Parses `"25,50,75,100"` into a sorted, deduplicated threshold list;
/// non-numeric and out-of-range entries are dropped.
pub fn parse_milestones(raw: &str) -> Vec<f64> {
    let mut out: Vec<f64> = raw
        .split(',')
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .filter(|m| m.is_finite() && *m > 0.0 && *m <= 100.0)
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_milestones_sorts_and_filters() {
        assert_eq!(parse_milestones("50, 25,100,75"), vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(parse_milestones("10,junk,-5,150,10"), vec![10.0]);
        assert!(parse_milestones("nope").is_empty());
    }

    #[test]
    fn test_config_hash_deterministic() {
        let cfg1 = Config::default();
        let cfg2 = Config::default();
        assert_eq!(cfg1.config_hash(), cfg2.config_hash());
        assert_eq!(cfg1.config_hash().len(), 64);
    }

    #[test]
    fn test_config_hash_changes_with_fields() {
        let cfg1 = Config::default();
        let cfg2 = Config {
            poll_secs: cfg1.poll_secs + 1,
            ..Config::default()
        };
        assert_ne!(cfg1.config_hash(), cfg2.config_hash());
    }

    #[test]
    fn test_to_json_round_trips() {
        let cfg = Config::default();
        let json = cfg.to_json();
        assert_eq!(json["source"], "poll");
        assert_eq!(json["milestones"][0], 25.0);
    }
}
