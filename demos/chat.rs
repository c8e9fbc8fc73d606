//! Host-side demo of the MAC running against the in-memory mock radio.
//!
//! Not part of the crate's public contract — it exists to show
//! `MacCore` driving a line-reading chat REPL, in the spirit of the
//! original badge firmware's `simple_chat.py`, but with no real radio
//! behind it: every "peer" message here is injected by this same process,
//! since there is no over-the-air transport on a host machine. Run with
//! `cargo run --bin chat_demo --features std,mock`.

use std::io::{self, BufRead, Write};

use lora_chat_mac::mock::{MockRadio, TestClock};
use lora_chat_mac::{FixedAirTimeModel, MacConfig, MacCore, Priority, SendResult, Xorshift32};
use std::cell::Cell;

fn main() {
    println!("============================================================");
    println!("  lora_chat_mac demo — mock-radio chat REPL");
    println!("============================================================");

    print!("Node name: ");
    io::stdout().flush().ok();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let node_id = lines
        .next()
        .and_then(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "anon".to_string());

    let node_count: u32 = 200;
    let config = MacConfig::for_dense(node_count);
    println!("[config] {config:?}");

    let now = Cell::new(0u32);
    let mut seed_bytes = [0u8; 4];
    for (i, b) in node_id.bytes().enumerate().take(4) {
        seed_bytes[i] = b;
    }
    let seed = u32::from_le_bytes(seed_bytes).max(1);

    let mut mac = MacCore::new(
        MockRadio::new(&now),
        TestClock::new(&now),
        Xorshift32::new(seed),
        FixedAirTimeModel::default(),
        config,
    )
    .expect("demo config is always valid");

    mac.start_listening();

    println!("[ready] type a message, 'stats' to print counters, 'quit' to exit\n");

    for line in lines {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "quit" | "exit" | "q" => break,
            "stats" => {
                mac.print_stats(io::stdout()).ok();
                continue;
            }
            _ => {}
        }

        let payload = format!("{node_id}: {line}");
        match mac.send(payload.as_bytes(), Priority::Normal) {
            Ok(SendResult::Sent) => println!("[mac] sent ({} bytes)", payload.len()),
            Ok(SendResult::Deferred) => println!("[mac] deferred (channel busy)"),
            Err(e) => println!("[mac] rejected: {e}"),
        }
    }

    println!("\n============================================================");
    mac.print_stats(io::stdout()).ok();
    println!("============================================================");
}
