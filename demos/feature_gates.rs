//! Feature Gates
//!
//! This example demonstrates machine-wide global conditions: named rule
//! lists evaluated against the current state's name, so unrelated
//! subsystems can ask one question ("can the player interact?") without
//! knowing which states allow it.
//!
//! Run with: cargo run --example feature_gates

use stagehand::MachineDef;

fn main() {
    println!("=== Feature Gates Example ===\n");

    let def = MachineDef::from_json(
        r#"{
            "name": "session",
            "initial": "ready",
            "states": [
                { "name": "ready" },
                { "name": "running" },
                { "name": "busy" },
                { "name": "transition_to_shop" }
            ],
            "global_conditions": {
                "can_interact": ["ready", "running"],
                "can_open_menu": ["ready", "running", "busy"]
            }
        }"#,
    )
    .expect("definition is well-formed");

    let mut machine = def.build().expect("definition builds");

    for state in ["ready", "running", "busy", "transition_to_shop"] {
        machine.update_state(state, None);
        println!(
            "state = {:<20} can_interact = {:<5} can_open_menu = {}",
            machine.current_state(),
            machine.can("can_interact"),
            machine.can("can_open_menu"),
        );
    }

    println!("\n=== Example Complete ===");
}
