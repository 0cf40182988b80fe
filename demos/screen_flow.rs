//! Screen Flow
//!
//! This example demonstrates serializing a queue of visual transitions
//! behind a coordination machine.
//!
//! Key concepts:
//! - Declaring states with enter/exit callbacks
//! - Gating work on `can` queries
//! - Ping-pong reverts between the last two states
//! - Observing the machine's debug-level transition events
//!
//! Run with: cargo run --example screen_flow

use stagehand::{StateMachine, StateOptions};
use tracing::Level;

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    println!("=== Screen Flow Example ===\n");

    let mut machine = StateMachine::named("transitions");

    machine.add_state(
        "ready",
        Some(
            StateOptions::new()
                .with_rules(["waiting_for_input"])
                .on_enter(|| println!("  [ready] accepting input")),
        ),
    );
    machine.add_state(
        "playing",
        Some(
            StateOptions::new()
                .on_enter(|| println!("  [playing] transition started"))
                .on_exit(|| println!("  [playing] transition finished")),
        ),
    );
    machine.add_state(
        "playing_all",
        Some(StateOptions::new().on_enter(|| println!("  [playing_all] draining the queue"))),
    );

    println!("Entering the ready state:");
    machine.update_state("ready", None);

    println!("\nInput allowed? {}", machine.can("waiting_for_input"));

    println!("\nPlaying a single transition:");
    machine.update_state("playing", None);
    println!("Input allowed? {}", machine.can("waiting_for_input"));

    println!("\nDraining the whole queue:");
    machine.update_state("playing_all", None);

    println!("\nReverting to the last state:");
    machine.revert_state();
    println!(
        "current = {:?}, previous = {:?}",
        machine.current_state(),
        machine.previous_state()
    );

    println!("\nPath so far: {:?}", machine.history().path());

    println!("\n=== Example Complete ===");
}
