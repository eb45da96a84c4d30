//! End-to-end controller scenarios: hooks, save/restore and rejected loads.

use std::cell::RefCell;
use std::rc::Rc;

use automaton_core::persistence::SaveFile;
use automaton_core::systems::{BountyOfficeNode, WeatherNode, BOUNTY_ACTION};
use automaton_core::{
    guard, Controller, EngineError, Input, Node, NodeCore, NodeId, Outcome, StateNode,
    TransitionTag,
};
use game_context::{GameContext, Item, WeatherCondition, WeatherIntensity, WeatherType, GOLD};

type HookLog = Rc<RefCell<Vec<String>>>;

/// Records every hook call into a shared log.
struct RecordingNode {
    core: NodeCore,
    log: HookLog,
}

impl RecordingNode {
    fn new(name: &str, log: &HookLog) -> Self {
        Self {
            core: NodeCore::new(name),
            log: Rc::clone(log),
        }
    }
}

impl Node for RecordingNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "recording"
    }

    fn on_enter(&mut self, _ctx: &mut GameContext) {
        self.log.borrow_mut().push(format!("enter {}", self.core.name));
    }

    fn on_exit(&mut self, _ctx: &mut GameContext) {
        self.log.borrow_mut().push(format!("exit {}", self.core.name));
    }
}

struct World {
    controller: Controller,
    weather: NodeId,
    office: NodeId,
}

fn build_world(jail_name: &str) -> World {
    let mut controller = Controller::new();
    controller.context_mut().set_current_region("Riverwood");

    let weather = controller.create_node(WeatherNode::new("Weather", 11).unwrap());
    controller.set_system_root("WeatherSystem", weather).unwrap();

    let square = controller.create_node(StateNode::new("Town Square"));
    let office = controller
        .create_node(BountyOfficeNode::new("Bounty Office").with_bounty("Riverwood", 100));
    let jail = controller.create_node(StateNode::new(jail_name));
    controller.add_child(square, office).unwrap();
    controller
        .add_transition(square, guard::on_kind("visit"), office, "visit office")
        .unwrap();
    controller
        .add_tagged_transition(office, TransitionTag::Failure, guard::never(), jail, "jailed")
        .unwrap();
    controller
        .add_tagged_transition(office, TransitionTag::Exit, guard::never(), square, "leave")
        .unwrap();
    controller
        .add_transition(jail, guard::on_kind("release"), square, "released")
        .unwrap();
    controller.set_system_root("CrimeSystem", square).unwrap();

    World {
        controller,
        weather,
        office,
    }
}

fn weather(controller: &Controller, id: NodeId) -> &WeatherNode {
    controller.node_as::<WeatherNode>(id).unwrap()
}

fn current_name(controller: &Controller, system: &str) -> String {
    let id = controller.current_node(system).unwrap();
    controller.node(id).unwrap().name().to_string()
}

#[test]
fn test_transition_fires_exit_then_enter_once() {
    let log = HookLog::default();
    let mut c = Controller::new();
    let a = c.create_node(RecordingNode::new("A", &log));
    let b = c.create_node(RecordingNode::new("B", &log));
    c.add_transition(a, guard::on_kind("go"), b, "go").unwrap();
    c.set_system_root("Demo", a).unwrap();

    let outcome = c.process_input("Demo", &Input::new("go"));

    assert_eq!(outcome, Outcome::Transitioned { from: a, to: b });
    assert_eq!(c.current_node("Demo"), Some(b));
    assert_eq!(*log.borrow(), ["exit A", "enter B"]);
    assert_eq!(c.node(b).unwrap().core().visits(), 1);

    assert_eq!(c.process_input("Demo", &Input::new("stay")), Outcome::NoMatch);
    assert_eq!(c.current_node("Demo"), Some(b));
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_unmatched_input_changes_nothing() {
    let log = HookLog::default();
    let mut c = Controller::new();
    let a = c.create_node(RecordingNode::new("A", &log));
    let b = c.create_node(RecordingNode::new("B", &log));
    c.add_transition(a, guard::on_kind("go"), b, "go").unwrap();
    c.set_system_root("Demo", a).unwrap();

    assert_eq!(c.process_input("Demo", &Input::new("wait")), Outcome::NoMatch);
    assert_eq!(c.current_node("Demo"), Some(a));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_systems_keep_independent_cursors() {
    let mut c = Controller::new();
    let a = c.create_node(StateNode::new("A"));
    let b = c.create_node(StateNode::new("B"));
    c.add_transition(a, guard::on_kind("go"), b, "go").unwrap();
    c.set_system_root("First", a).unwrap();
    c.set_system_root("Second", a).unwrap();

    c.process_input("First", &Input::new("go"));

    assert_eq!(c.current_node("First"), Some(b));
    assert_eq!(c.current_node("Second"), Some(a));
}

#[test]
fn test_save_and_restore_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.sav");

    let mut world = build_world("Jail");
    {
        let node = world
            .controller
            .node_as_mut::<WeatherNode>(world.weather)
            .unwrap();
        node.set_global_weather(WeatherCondition::new(
            WeatherType::Stormy,
            WeatherIntensity::Heavy,
        ));
        node.set_regional_weather(
            "Forest",
            WeatherCondition::new(WeatherType::Foggy, WeatherIntensity::Light),
        );
    }
    world
        .controller
        .process_input("CrimeSystem", &Input::new("visit"));
    world
        .controller
        .process_input("CrimeSystem", &Input::action(BOUNTY_ACTION, "negotiate"));
    world.controller.context_mut().drain_narration();
    let save_id = world.controller.save_state(&path).unwrap();

    let mut fresh = build_world("Jail");
    let loaded_id = fresh.controller.load_state(&path).unwrap();

    assert_eq!(loaded_id, save_id);
    assert_eq!(fresh.controller.last_save_id(), Some(save_id));

    let restored = weather(&fresh.controller, fresh.weather);
    assert_eq!(restored.global().weather_type, WeatherType::Stormy);
    assert_eq!(restored.global().intensity, WeatherIntensity::Heavy);
    assert_eq!(
        restored.regional_weather("Forest").map(|w| w.weather_type),
        Some(WeatherType::Foggy)
    );
    assert_eq!(
        restored.forecast(),
        weather(&world.controller, world.weather).forecast()
    );

    assert_eq!(current_name(&fresh.controller, "CrimeSystem"), "Bounty Office");
    let office = fresh
        .controller
        .node_as::<BountyOfficeNode>(fresh.office)
        .unwrap();
    assert!(office.has_negotiated("Riverwood"));
    assert_eq!(fresh.controller.node(fresh.office).unwrap().core().visits(), 1);
    assert_eq!(fresh.controller.context().current_region(), "Riverwood");

    // Loading restores state without replaying hooks.
    assert!(fresh.controller.context().pending_narration().is_empty());
}

#[test]
fn test_restored_weather_continues_same_sequence() {
    let mut world = build_world("Jail");
    let snapshot = world.controller.snapshot().unwrap();

    let mut fresh = build_world("Jail");
    fresh.controller.apply(snapshot).unwrap();

    let advance = Input::action("weather_action", "advance").with_param("hours", 24);
    for _ in 0..5 {
        world.controller.process_input("WeatherSystem", &advance);
        fresh.controller.process_input("WeatherSystem", &advance);
    }
    assert_eq!(
        weather(&world.controller, world.weather).global(),
        weather(&fresh.controller, fresh.weather).global()
    );
}

#[test]
fn test_oversized_count_rejected_without_changes() {
    let mut world = build_world("Jail");
    world.controller.process_input("CrimeSystem", &Input::new("visit"));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"TASV");
    bytes.push(1);
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(&u64::MAX.to_le_bytes());

    let err = world.controller.load_from_reader(bytes.as_slice()).unwrap_err();

    assert!(matches!(err, EngineError::LengthExceeded { .. }));
    assert_eq!(current_name(&world.controller, "CrimeSystem"), "Bounty Office");
    assert_eq!(world.controller.last_save_id(), None);
}

#[test]
fn test_failed_record_rolls_back_earlier_records() {
    let mut world = build_world("Jail");
    world
        .controller
        .node_as_mut::<WeatherNode>(world.weather)
        .unwrap()
        .set_global_weather(WeatherCondition::new(
            WeatherType::Stormy,
            WeatherIntensity::Heavy,
        ));
    let mut save = world.controller.snapshot().unwrap();

    // The weather record precedes the office record and applies first.
    let office_record = save
        .records
        .iter_mut()
        .find(|r| r.persistent_id == "Town Square/Bounty Office")
        .unwrap();
    let keep = office_record.data.len() - 2;
    office_record.data.truncate(keep);
    let bytes = save.encode(*world.controller.limits()).unwrap();

    world
        .controller
        .node_as_mut::<WeatherNode>(world.weather)
        .unwrap()
        .set_global_weather(WeatherCondition::new(
            WeatherType::Clear,
            WeatherIntensity::None,
        ));
    world.controller.process_input("CrimeSystem", &Input::new("visit"));

    let err = world.controller.load_from_reader(bytes.as_slice()).unwrap_err();

    assert!(matches!(err, EngineError::Truncated(_)));
    assert_eq!(
        weather(&world.controller, world.weather).global().weather_type,
        WeatherType::Clear
    );
    assert_eq!(current_name(&world.controller, "CrimeSystem"), "Bounty Office");
}

#[test]
fn test_kind_mismatch_rejected() {
    let mut world = build_world("Jail");
    let mut save = world.controller.snapshot().unwrap();
    save.records[0].kind = "state".into();

    let err = world.controller.apply(save).unwrap_err();
    assert!(matches!(err, EngineError::KindMismatch { .. }));
}

#[test]
fn test_trailing_record_bytes_are_corrupt() {
    let mut world = build_world("Jail");
    let mut save = world.controller.snapshot().unwrap();
    save.records[1].data.push(0);

    assert!(matches!(
        world.controller.apply(save),
        Err(EngineError::Corrupt(_))
    ));
}

#[test]
fn test_missing_cursor_falls_back_to_root() {
    let mut old = build_world("Jail");
    old.controller.context_mut().inventory.add_item(Item::new(GOLD, "Gold", "currency", 1, 10));
    old.controller.process_input("CrimeSystem", &Input::new("visit"));
    old.controller
        .process_input("CrimeSystem", &Input::action(BOUNTY_ACTION, "pay_full"));
    assert_eq!(current_name(&old.controller, "CrimeSystem"), "Jail");
    let save = old.controller.snapshot().unwrap();

    // A later build renamed the jail, so neither its path nor its name match.
    let mut new = build_world("Stockade");
    new.controller.process_input("CrimeSystem", &Input::new("visit"));
    new.controller.apply(save).unwrap();

    assert_eq!(current_name(&new.controller, "CrimeSystem"), "Town Square");
    assert_eq!(new.controller.context().gold(), 10);
}

#[test]
fn test_unknown_records_and_systems_skipped() {
    let mut bigger = build_world("Jail");
    let extra = bigger.controller.create_node(StateNode::new("Extra"));
    bigger.controller.set_system_root("ExtraSystem", extra).unwrap();
    let save: SaveFile = bigger.controller.snapshot().unwrap();

    let mut world = build_world("Jail");
    world.controller.apply(save).unwrap();

    assert_eq!(world.controller.systems().count(), 2);
    assert!(world.controller.find_by_name("Extra").is_none());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = build_world("Jail");
    let err = world
        .controller
        .load_state(dir.path().join("nope.sav"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}

#[test]
fn test_cursor_matched_by_name_containing_separators() {
    let mut old = build_world("Cell #2/East");
    old.controller.context_mut().inventory.add_item(Item::new(GOLD, "Gold", "currency", 1, 10));
    old.controller.process_input("CrimeSystem", &Input::new("visit"));
    old.controller
        .process_input("CrimeSystem", &Input::action(BOUNTY_ACTION, "pay_full"));
    assert_eq!(current_name(&old.controller, "CrimeSystem"), "Cell #2/East");
    let save = old.controller.snapshot().unwrap();

    // Same node, but nested under the square so its path no longer matches.
    let mut new = build_world("Cell #2/East");
    let square = new.controller.find_by_name("Town Square").unwrap();
    let cell = new.controller.find_by_name("Cell #2/East").unwrap();
    new.controller.add_child(square, cell).unwrap();
    new.controller.apply(save).unwrap();

    assert_eq!(new.controller.current_node("CrimeSystem"), Some(cell));
}

#[test]
fn test_non_finite_context_value_fails_save_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.sav");
    let mut world = build_world("Jail");
    let lantern = Item::new("lantern", "Lantern", "tool", 5, 1).with_property("charge", f64::NAN);
    world.controller.context_mut().inventory.add_item(lantern);

    assert!(world.controller.save_state(&path).is_err());
    assert!(!path.exists());

    let mut buf = Vec::new();
    assert!(world.controller.save_to_writer(&mut buf).is_err());
    assert!(buf.is_empty());
    assert_eq!(world.controller.last_save_id(), None);
}

#[test]
fn test_trailing_file_bytes_rejected_without_changes() {
    let mut world = build_world("Jail");
    let mut bytes = Vec::new();
    world.controller.save_to_writer(&mut bytes).unwrap();
    bytes.extend_from_slice(b"extra");

    world.controller.process_input("CrimeSystem", &Input::new("visit"));
    let err = world.controller.load_from_reader(bytes.as_slice()).unwrap_err();

    assert!(matches!(err, EngineError::Corrupt(_)));
    assert_eq!(current_name(&world.controller, "CrimeSystem"), "Bounty Office");
}
