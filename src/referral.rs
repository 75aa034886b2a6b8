//! Referral attribution: who sent this visitor, kept for seven days.
//!
//! The browser original stashes a `fc_ref_ctx` blob in localStorage and
//! re-decorates outbound share links with it. Here the blob lives in a
//! single-row SQLite table. Values parsed from an incoming URL override the
//! stored ones key by key (last write wins); any merge refreshes the TTL.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::logging::log_referral;

pub const TTL_DAYS_DEFAULT: i64 = 7;

/// The attribution keys tracked, in wire spelling.
pub const REFERRAL_KEYS: [&str; 6] = [
    "ref",
    "team",
    "campaign",
    "utm_source",
    "utm_medium",
    "utm_campaign",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferralContext {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
}

impl ReferralContext {
    /// Extracts attribution keys from a URL's query string; unknown
    /// parameters are ignored.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;
        let mut ctx = Self::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());
            match key.as_ref() {
                "ref" => ctx.ref_code = value,
                "team" => ctx.team = value,
                "campaign" => ctx.campaign = value,
                "utm_source" => ctx.utm_source = value,
                "utm_medium" => ctx.utm_medium = value,
                "utm_campaign" => ctx.utm_campaign = value,
                _ => {}
            }
        }
        Ok(ctx)
    }

    /// Overlays `incoming` on self: present keys win, absent keys survive.
    pub fn merge(&mut self, incoming: &ReferralContext) {
        fn take(slot: &mut Option<String>, new: &Option<String>) {
            if new.is_some() {
                *slot = new.clone();
            }
        }
        take(&mut self.ref_code, &incoming.ref_code);
        take(&mut self.team, &incoming.team);
        take(&mut self.campaign, &incoming.campaign);
        take(&mut self.utm_source, &incoming.utm_source);
        take(&mut self.utm_medium, &incoming.utm_medium);
        take(&mut self.utm_campaign, &incoming.utm_campaign);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }

    /// Present keys as `(wire_name, value)` pairs, in REFERRAL_KEYS order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let slots = [
            ("ref", &self.ref_code),
            ("team", &self.team),
            ("campaign", &self.campaign),
            ("utm_source", &self.utm_source),
            ("utm_medium", &self.utm_medium),
            ("utm_campaign", &self.utm_campaign),
        ];
        slots
            .into_iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k, v.clone())))
            .collect()
    }

    /// Applies the stored keys to an outbound URL. Unrelated query
    /// parameters are left untouched; same-named ones are replaced.
    pub fn decorate_url(&self, raw: &str) -> Result<String> {
        let mut url = Url::parse(raw)?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !REFERRAL_KEYS.contains(&k.as_ref()))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        {
            let mut qp = url.query_pairs_mut();
            qp.clear();
            for (k, v) in &kept {
                qp.append_pair(k, v);
            }
            for (k, v) in self.pairs() {
                qp.append_pair(k, &v);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url.to_string())
    }
}

/// SQLite-backed single-row store with a TTL on the whole row.
pub struct ReferralStore {
    conn: Connection,
    ttl_days: i64,
}

impl ReferralStore {
    pub fn new(path: &str, ttl_days: i64) -> Result<Self> {
        let store = Self {
            conn: Connection::open(path)?,
            ttl_days,
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS referral (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                ctx TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    /// Loads the stored context; rows older than the TTL are discarded.
    pub fn load(&self) -> Result<Option<ReferralContext>> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row("SELECT ctx, saved_at FROM referral WHERE id = 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .optional()?;
        let Some((ctx_json, saved_at)) = row else {
            return Ok(None);
        };
        let age_secs = Utc::now().timestamp() - saved_at;
        if age_secs > self.ttl_days * 86_400 {
            log_referral("expired", &[]);
            return Ok(None);
        }
        Ok(serde_json::from_str(&ctx_json).ok())
    }

    pub fn save(&self, ctx: &ReferralContext) -> Result<()> {
        self.save_at(ctx, Utc::now().timestamp())
    }

    fn save_at(&self, ctx: &ReferralContext, saved_at: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO referral (id, ctx, saved_at) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET ctx = ?1, saved_at = ?2",
            params![serde_json::to_string(ctx)?, saved_at],
        )?;
        Ok(())
    }

    /// Merges a landing URL's attribution keys over the stored context and
    /// persists the result with a fresh TTL.
    pub fn absorb_url(&self, raw: &str) -> Result<ReferralContext> {
        let incoming = ReferralContext::from_url(raw)?;
        let mut ctx = self.load()?.unwrap_or_default();
        ctx.merge(&incoming);
        self.save(&ctx)?;
        let keys: Vec<&str> = ctx.pairs().iter().map(|(k, _)| *k).collect();
        log_referral("absorbed", &keys);
        Ok(ctx)
    }

    /// Backdates the stored row; test hook for TTL behavior.
    #[doc(hidden)]
    pub fn backdate(&self, days: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE referral SET saved_at = saved_at - ?1 WHERE id = 1",
            params![days * 86_400],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_picks_known_keys() {
        let ctx =
            ReferralContext::from_url("https://fundchamps.example/?ref=abc&utm_source=mail&x=1")
                .unwrap();
        assert_eq!(ctx.ref_code.as_deref(), Some("abc"));
        assert_eq!(ctx.utm_source.as_deref(), Some("mail"));
        assert!(ctx.team.is_none());
    }

    #[test]
    fn test_merge_last_write_wins_per_key() {
        let mut stored = ReferralContext {
            ref_code: Some("old".to_string()),
            team: Some("tigers".to_string()),
            ..Default::default()
        };
        let incoming = ReferralContext {
            ref_code: Some("new".to_string()),
            ..Default::default()
        };
        stored.merge(&incoming);
        assert_eq!(stored.ref_code.as_deref(), Some("new"));
        assert_eq!(stored.team.as_deref(), Some("tigers"));
    }

    #[test]
    fn test_decorate_preserves_unrelated_params() {
        let ctx = ReferralContext {
            ref_code: Some("abc".to_string()),
            utm_source: Some("mail".to_string()),
            ..Default::default()
        };
        let out = ctx
            .decorate_url("https://donate.example/checkout?amount=25&ref=stale")
            .unwrap();
        let url = Url::parse(&out).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("amount".to_string(), "25".to_string())));
        assert!(pairs.contains(&("ref".to_string(), "abc".to_string())));
        assert!(pairs.contains(&("utm_source".to_string(), "mail".to_string())));
        assert!(!pairs.contains(&("ref".to_string(), "stale".to_string())));
    }

    #[test]
    fn test_decorate_empty_context_is_identity_shaped() {
        let ctx = ReferralContext::default();
        let out = ctx.decorate_url("https://donate.example/checkout").unwrap();
        assert_eq!(out, "https://donate.example/checkout");
    }
}
