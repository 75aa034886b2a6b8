//! Replay: drive a scripted snapshot sequence through a full engine,
//! synchronously, printing the surface and fired events after each step.
//!
//! Input is JSONL on stdin, one snapshot per line, e.g.
//!   {"raised": 2500, "goal": 10000}
//!   {"raised": 5000, "goal": 10000, "sponsorName": "Acme"}
//!
//! `--demo` runs a built-in sequence instead.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fundpulse::bus::{CONFETTI, MILESTONE};
use fundpulse::config::Config;
use fundpulse::engine::Engine;
use fundpulse::snapshot::Snapshot;

fn demo_script() -> Vec<String> {
    [
        r#"{"raised": 1000, "goal": 10000}"#,
        r#"{"raised": 2500, "goal": 10000}"#,
        r#"{"raised": 2500, "goal": 10000}"#,
        r#"{"raised": 5200, "goal": 10000, "sponsorName": "Acme Corp"}"#,
        r#"{"raised": 10000, "goal": 10000}"#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn main() {
    let demo = std::env::args().any(|a| a == "--demo");
    let cfg = Config {
        // Tweens collapse to a single step when driven synchronously.
        animate_ms: 0,
        ..Config::from_env()
    };

    let engine = Engine::new(cfg);
    let bus = engine.bus();

    let confetti_fired = Arc::new(AtomicUsize::new(0));
    let milestones_seen = Arc::new(AtomicUsize::new(0));
    let (c, m) = (confetti_fired.clone(), milestones_seen.clone());
    let _confetti_sub = bus.on(CONFETTI, move |d| {
        println!(
            "  >> confetti: milestone {} ({} particles)",
            d["milestone"], d["particles"]
        );
        c.fetch_add(1, Ordering::SeqCst);
    });
    let _milestone_sub = bus.on(MILESTONE, move |_| {
        m.fetch_add(1, Ordering::SeqCst);
    });

    let lines: Vec<String> = if demo {
        demo_script()
    } else {
        io::stdin().lock().lines().map_while(Result::ok).collect()
    };

    for (step, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let snap: Snapshot = match serde_json::from_str(line) {
            Ok(s) => s,
            Err(err) => {
                eprintln!("bad snapshot json: {}", err);
                continue;
            }
        };
        engine.inject(&snap);
        let view = engine.view();
        println!(
            "step {} raised={} goal={} percent={:.1} updates={}",
            step, view.raised, view.goal, view.percent, view.updates
        );
        print!("{}", engine.surface_summary());
    }

    println!(
        "done: {} confetti bursts, {} milestone events",
        confetti_fired.load(Ordering::SeqCst),
        milestones_seen.load(Ordering::SeqCst)
    );
}
