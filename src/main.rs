use anyhow::Result;

use fundpulse::config::Config;
use fundpulse::engine::Engine;
use fundpulse::logging::{json_log, obj, v_str};
use fundpulse::referral::ReferralStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    json_log(
        "startup",
        obj(&[
            ("source", v_str(&cfg.source)),
            ("stats_url", v_str(&cfg.stats_url)),
            ("config_hash", v_str(&cfg.config_hash())),
        ]),
    );

    // Landing-page attribution: absorb the URL this visit arrived on and
    // show what a decorated donate link would carry.
    if let Ok(landing) = std::env::var("LANDING_URL") {
        let store = ReferralStore::new(&cfg.ref_db_path, cfg.ref_ttl_days)?;
        let ctx = store.absorb_url(&landing)?;
        if let Ok(donate) = std::env::var("DONATE_URL") {
            json_log(
                "referral",
                obj(&[("decorated", v_str(&ctx.decorate_url(&donate)?))]),
            );
        }
    }

    Engine::new(cfg).run().await
}
