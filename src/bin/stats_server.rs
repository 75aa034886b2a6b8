//! Dev stats server: the external collaborator for local runs.
//!
//! Serves the endpoints the engine's sources expect, with simulated
//! donations so the meter moves. Run with: cargo run --bin stats_server
//!
//! Endpoints:
//!   GET /api/stats  - current totals as JSON
//!   GET /api/health - health check
//!   GET /events     - SSE stream, one "meter" event per simulated donation

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

#[derive(Clone, Copy)]
struct Totals {
    raised: f64,
    goal: f64,
}

fn main() {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8787);
    let goal: f64 = std::env::var("GOAL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10_000.0);
    let totals = Arc::new(Mutex::new(Totals { raised: 0.0, goal }));

    let listener = TcpListener::bind(("127.0.0.1", port)).expect("failed to bind");
    println!("Stats server running at http://localhost:{}", port);
    println!();
    println!("Endpoints:");
    println!("  GET /api/stats  - current totals as JSON");
    println!("  GET /api/health - health check");
    println!("  GET /events     - SSE stream of simulated donations");
    println!();

    // Background donor: the raised total creeps toward the goal.
    {
        let totals = totals.clone();
        thread::spawn(move || loop {
            thread::sleep(Duration::from_secs(3));
            let mut t = totals.lock().expect("totals lock");
            if t.raised < t.goal {
                t.raised = (t.raised + rand::thread_rng().gen_range(5.0..250.0)).min(t.goal);
            }
        });
    }

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };
        let totals = totals.clone();
        thread::spawn(move || handle(stream, totals));
    }
}

fn stats_json(t: Totals) -> String {
    serde_json::json!({ "raised": (t.raised * 100.0).round() / 100.0, "goal": t.goal }).to_string()
}

fn handle(mut stream: TcpStream, totals: Arc<Mutex<Totals>>) {
    let buf_reader = BufReader::new(&stream);
    let request = match buf_reader.lines().next() {
        Some(Ok(line)) => line,
        _ => return,
    };

    if request.starts_with("GET /events") {
        serve_sse(stream, totals);
        return;
    }

    let (status, content_type, body) = if request.starts_with("GET /api/stats") {
        let t = *totals.lock().expect("totals lock");
        ("200 OK", "application/json", stats_json(t))
    } else if request.starts_with("GET /api/health") {
        ("200 OK", "application/json", r#"{"status":"ok"}"#.to_string())
    } else {
        ("404 NOT FOUND", "text/plain", "Not Found".to_string())
    };

    let response = format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Content-Length: {}\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn serve_sse(mut stream: TcpStream, totals: Arc<Mutex<Totals>>) {
    let header = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/event-stream\r\n\
        Cache-Control: no-cache\r\n\
        Access-Control-Allow-Origin: *\r\n\
        Connection: keep-alive\r\n\r\n";
    if stream.write_all(header.as_bytes()).is_err() {
        return;
    }
    loop {
        let frame = {
            let t = *totals.lock().expect("totals lock");
            format!("event: meter\ndata: {}\n\n", stats_json(t))
        };
        // A write error means the client navigated away; close the stream.
        if stream.write_all(frame.as_bytes()).is_err() {
            return;
        }
        let _ = stream.flush();
        thread::sleep(Duration::from_secs(3));
    }
}
