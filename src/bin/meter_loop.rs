//! Live meter loop against a real stats endpoint, with a periodic stdout
//! render of the surface. Point it at the dev server:
//!
//!     cargo run --bin stats_server
//!     STATS_URL=http://127.0.0.1:8787/api/stats cargo run --bin meter_loop

use anyhow::Result;
use tokio::time::{sleep, Duration};

use fundpulse::config::Config;
use fundpulse::engine::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    eprintln!(
        "[meter_loop] source={} stats_url={} poll={}s",
        cfg.source, cfg.stats_url, cfg.poll_secs
    );

    let engine = Engine::new(cfg);
    let surface = engine.surface();
    let mut shutdown = engine.shutdown_rx();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = sleep(Duration::from_secs(2)) => {
                    let summary = surface.lock().expect("surface lock").render_summary();
                    println!("--- surface ---\n{}", summary);
                }
            }
        }
    });

    engine.run().await
}
