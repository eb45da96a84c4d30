//! Scripted walk through the engine: builds a small world, plays a few
//! inputs through each system, then saves and restores it.
//!
//! ```text
//! automaton-demo [seed] [save_path]
//! ```
//!
//! `AUTOMATON_CONFIG` may point at a TOML engine config.

use std::env;
use std::path::{Path, PathBuf};

use automaton_core::systems::{BountyOfficeNode, WeatherNode, BOUNTY_ACTION, WEATHER_ACTION};
use automaton_core::{
    guard, logging, Controller, EngineConfig, Input, Outcome, Result, StateNode, TransitionTag,
};
use game_context::{Item, GOLD};
use tracing::{error, info, warn};

const DEFAULT_SEED: u64 = 1337;

fn parse_seed(value: Option<&String>) -> std::result::Result<u64, String> {
    match value {
        None => Ok(DEFAULT_SEED),
        Some(raw) => raw.parse::<u64>().map_err(|_| format!("invalid seed: {raw}")),
    }
}

fn load_config() -> Result<EngineConfig> {
    match env::var("AUTOMATON_CONFIG") {
        Ok(path) if !path.trim().is_empty() => EngineConfig::from_file(Path::new(&path)),
        _ => Ok(EngineConfig::default()),
    }
}

fn build_world(config: &EngineConfig, seed: u64) -> Result<Controller> {
    let mut controller = Controller::with_limits(config.persistence);

    let ctx = controller.context_mut();
    ctx.set_current_region("Riverwood");
    ctx.inventory.add_item(Item::new(GOLD, "Gold", "currency", 1, 60));

    // Weather
    let weather = controller.create_node(WeatherNode::new("Weather", seed)?);
    controller.set_system_root("WeatherSystem", weather)?;

    // Crime
    let square = controller.create_node(StateNode::new("Town Square"));
    let office =
        controller.create_node(BountyOfficeNode::new("Bounty Office").with_bounty("Riverwood", 80));
    let cleared = controller.create_node(StateNode::new("Record Cleared").accepting());
    let jail = controller.create_node(StateNode::new("Jail"));
    controller.add_child(square, office)?;

    controller.add_transition(
        square,
        guard::on_action("crime_action", "visit_bounty_office"),
        office,
        "Visit the bounty office",
    )?;
    controller.add_tagged_transition(
        office,
        TransitionTag::Success,
        guard::never(),
        cleared,
        "Bounty paid",
    )?;
    controller.add_tagged_transition(
        office,
        TransitionTag::Failure,
        guard::never(),
        jail,
        "Hauled off to jail",
    )?;
    controller.add_tagged_transition(
        office,
        TransitionTag::Exit,
        guard::never(),
        square,
        "Back to the square",
    )?;
    controller.add_transition(jail, guard::on_kind("serve_time"), square, "Serve your sentence")?;
    controller.add_transition(cleared, guard::always(), square, "Return to the square")?;
    controller.set_system_root("CrimeSystem", square)?;

    for issue in controller.validate() {
        warn!(%issue, "demo world has a wiring issue");
    }
    Ok(controller)
}

fn show(controller: &mut Controller, system: &str, outcome: Outcome) {
    let here = controller
        .current_node(system)
        .and_then(|id| controller.node(id))
        .map(|node| node.name().to_string())
        .unwrap_or_default();
    println!("[{system}] {outcome:?} -> {here}");
    for line in controller.context_mut().drain_narration() {
        println!("  {line}");
    }
}

fn play(controller: &mut Controller) {
    let script = [
        ("WeatherSystem", Input::action(WEATHER_ACTION, "check")),
        (
            "WeatherSystem",
            Input::action(WEATHER_ACTION, "advance").with_param("hours", 12),
        ),
        ("WeatherSystem", Input::action(WEATHER_ACTION, "forecast")),
        ("CrimeSystem", Input::action("crime_action", "visit_bounty_office")),
        ("CrimeSystem", Input::action(BOUNTY_ACTION, "negotiate")),
        ("CrimeSystem", Input::action(BOUNTY_ACTION, "pay_full")),
        ("CrimeSystem", Input::new("continue")),
        ("Nowhere", Input::new("look")),
    ];

    for (system, input) in script {
        let outcome = controller.process_input(system, &input);
        show(controller, system, outcome);
    }

    for action in controller.available_actions("CrimeSystem") {
        println!("  option: {} ({})", action.label, action.id);
    }
}

fn save_and_restore(controller: &mut Controller, path: &Path) -> Result<()> {
    let save_id = controller.save_state(path)?;
    println!("Saved {save_id} to {}", path.display());

    // Wander off, then load back to the saved point.
    controller.process_input("CrimeSystem", &Input::action("crime_action", "visit_bounty_office"));
    controller.context_mut().drain_narration();

    controller.load_state(path)?;
    for system in controller.systems().map(str::to_string).collect::<Vec<_>>() {
        let name = controller
            .current_node(&system)
            .and_then(|id| controller.node(id))
            .map(|node| node.name().to_string())
            .unwrap_or_default();
        println!("Restored {system} at {name}");
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("failed to initialise logging: {err}");
    }

    let seed = match parse_seed(args.get(1)) {
        Ok(seed) => seed,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("usage: automaton-demo [seed] [save_path]");
            std::process::exit(2);
        }
    };
    let save_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("automaton_demo.sav"));

    let mut controller = match build_world(&config, seed) {
        Ok(controller) => controller,
        Err(err) => {
            error!(error = %err, "failed to build world");
            std::process::exit(1);
        }
    };
    info!(seed, nodes = controller.node_count(), "world built");

    play(&mut controller);

    if let Err(err) = save_and_restore(&mut controller, &save_path) {
        error!(error = %err, path = %save_path.display(), "save/restore failed");
    }
}
