//! End-to-end bridge scenarios over a real shared directory.
//!
//! Each test drives the [`Bridge`] facade exactly the way a host frame
//! loop would: drop a command file, call `update` with elapsed time, and
//! inspect the files the controller would read.

use std::fs;
use std::path::Path;

use serde_json::Value;

use cardbridge::channel::{ACTIONS_FILE, RESULTS_FILE, STATE_FILE};
use cardbridge::prelude::*;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct TableHost {
    allowed: bool,
    snapshot: Option<TableSnapshot>,
    jokers: Vec<JokerSlot>,
}

impl TableHost {
    fn new() -> Self {
        Self {
            allowed: true,
            snapshot: Some(TableSnapshot::default()),
            jokers: Vec::new(),
        }
    }
}

impl HostView for TableHost {
    fn update_allowed(&self) -> bool {
        self.allowed
    }
    fn snapshot(&self) -> Option<TableSnapshot> {
        self.snapshot.clone()
    }
    fn handles(&self) -> HandleReport {
        HandleReport::healthy()
    }
    fn collection_names(&self) -> &'static [&'static str] {
        &["jokers"]
    }
    fn collection_len(&self, name: &str) -> Option<usize> {
        (name == "jokers").then_some(self.jokers.len())
    }
    fn collection_item(&self, name: &str, index: usize) -> Result<Value, BridgeError> {
        if name != "jokers" {
            return Err(BridgeError::Transient(format!("no collection {name}")));
        }
        self.jokers
            .get(index)
            .map(|j| serde_json::to_value(j).unwrap())
            .ok_or_else(|| BridgeError::Transient(format!("jokers[{index}] out of range")))
    }
}

impl Host for TableHost {
    fn jokers_mut(&mut self) -> &mut Vec<JokerSlot> {
        &mut self.jokers
    }
}

#[derive(Default)]
struct CountingExecutor {
    calls: u32,
    fail_with: Option<String>,
}

impl ActionExecutor for CountingExecutor {
    fn execute(&mut self, _action: &Action) -> Result<(), String> {
        self.calls += 1;
        match &self.fail_with {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn drop_command(dir: &Path, sequence: u64, data: Value) {
    let envelope = serde_json::json!({
        "timestamp": 0,
        "sequence_id": sequence,
        "message_type": MSG_ACTION_COMMAND,
        "data": data,
    });
    fs::write(
        dir.join(ACTIONS_FILE),
        serde_json::to_string(&envelope).unwrap(),
    )
    .unwrap();
}

fn read_result(dir: &Path) -> ResultMessage {
    let raw = fs::read_to_string(dir.join(RESULTS_FILE)).expect("result file should exist");
    serde_json::from_str(&raw).unwrap()
}

fn read_state(dir: &Path) -> StateMessage {
    let raw = fs::read_to_string(dir.join(STATE_FILE)).expect("state file should exist");
    serde_json::from_str(&raw).unwrap()
}

fn started_bridge(dir: &Path, interval: f64) -> Bridge {
    // Logs show up with --nocapture; repeated init attempts are fine.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut bridge = Bridge::new(dir, SchedulerConfig { interval }).unwrap();
    bridge.start();
    bridge
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

// -- Test 1: command result spans two ticks ---------------------------------

#[test]
fn command_executes_on_one_tick_and_resolves_on_the_next() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    drop_command(
        dir.path(),
        1,
        serde_json::json!({"action_type": "play_hand", "card_indices": [0, 1]}),
    );

    // Tick 1: the command runs but its result is deferred.
    assert!(bridge.update(0.6, &mut host, &mut executor));
    assert_eq!(executor.calls, 1);
    assert!(
        !dir.path().join(RESULTS_FILE).exists(),
        "result must not be written on the dispatch tick"
    );
    assert!(
        !dir.path().join(ACTIONS_FILE).exists(),
        "command file must be consumed"
    );

    // Tick 2: the deferred capture completes and the result lands.
    assert!(bridge.update(0.6, &mut host, &mut executor));
    let result = read_result(dir.path());
    assert_eq!(result.sequence_id, 1);
    assert_eq!(result.message_type, MSG_ACTION_RESULT);
    assert!(result.data.success);
    assert!(
        result.data.new_state.is_some(),
        "result must carry the post-command snapshot"
    );
    assert_eq!(executor.calls, 1, "the command runs exactly once");
}

// -- Test 2: change detection gates publishing ------------------------------

#[test]
fn unchanged_state_is_published_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    bridge.update(0.6, &mut host, &mut executor);
    let first = read_state(dir.path());

    // Several more ticks with an identical projection.
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);
    let after = read_state(dir.path());
    assert_eq!(
        after.sequence_id, first.sequence_id,
        "no republish without a fingerprint change"
    );

    // A tracked field moves: publish again with a higher sequence.
    host.snapshot.as_mut().unwrap().money = 42;
    bridge.update(0.6, &mut host, &mut executor);
    let changed = read_state(dir.path());
    assert!(changed.sequence_id > first.sequence_id);
    assert_eq!(changed.message_type, MSG_GAME_STATE);
}

// -- Test 3: idempotent delivery --------------------------------------------

#[test]
fn redelivered_command_is_dropped_without_reexecution() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    drop_command(dir.path(), 3, serde_json::json!({"action_type": "go_to_shop"}));
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);
    assert_eq!(executor.calls, 1);
    assert!(read_result(dir.path()).data.success);

    // The controller retries the same sequence id.
    drop_command(dir.path(), 3, serde_json::json!({"action_type": "go_to_shop"}));
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);
    assert_eq!(executor.calls, 1, "duplicate must never re-execute");

    // A lower id is just as stale.
    drop_command(dir.path(), 2, serde_json::json!({"action_type": "go_to_shop"}));
    bridge.update(0.6, &mut host, &mut executor);
    assert_eq!(executor.calls, 1);
}

// -- Test 4: malformed and unknown inputs -----------------------------------

#[test]
fn malformed_command_file_is_consumed_silently() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    fs::write(dir.path().join(ACTIONS_FILE), "{definitely not json").unwrap();
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);

    assert_eq!(executor.calls, 0);
    assert!(!dir.path().join(ACTIONS_FILE).exists());
    assert!(
        !dir.path().join(RESULTS_FILE).exists(),
        "an unparseable envelope has no sequence to answer"
    );
}

#[test]
fn unknown_action_type_yields_a_failed_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    drop_command(dir.path(), 1, serde_json::json!({"action_type": "summon_dragon"}));
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);

    assert_eq!(executor.calls, 0);
    let result = read_result(dir.path());
    assert_eq!(result.sequence_id, 1);
    assert!(!result.data.success);
    assert!(result.data.new_state.is_some(), "failed results still carry state");
}

#[test]
fn executor_rejection_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor {
        fail_with: Some("not enough money".to_owned()),
        ..Default::default()
    };

    drop_command(
        dir.path(),
        1,
        serde_json::json!({"action_type": "buy_item", "shop_index": 0}),
    );
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);

    let result = read_result(dir.path());
    assert!(!result.data.success);
    assert_eq!(
        result.data.error_message.as_deref(),
        Some("not enough money")
    );
}

// -- Test 5: deferred capture waits for the snapshot ------------------------

#[test]
fn result_waits_until_a_snapshot_is_available() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    drop_command(dir.path(), 1, serde_json::json!({"action_type": "reroll_shop"}));
    bridge.update(0.6, &mut host, &mut executor);

    // The snapshot provider goes dark: the capture stays armed.
    host.snapshot = None;
    bridge.update(0.6, &mut host, &mut executor);
    bridge.update(0.6, &mut host, &mut executor);
    assert!(!dir.path().join(RESULTS_FILE).exists());

    host.snapshot = Some(TableSnapshot::default());
    bridge.update(0.6, &mut host, &mut executor);
    assert!(read_result(dir.path()).data.success);
}

// -- Test 6: disallowed host pauses everything ------------------------------

#[test]
fn paused_host_delays_the_whole_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = started_bridge(dir.path(), 0.5);
    let mut host = TableHost::new();
    let mut executor = CountingExecutor::default();

    host.allowed = false;
    drop_command(dir.path(), 1, serde_json::json!({"action_type": "go_to_shop"}));
    bridge.update(5.0, &mut host, &mut executor);

    assert_eq!(executor.calls, 0);
    assert!(dir.path().join(ACTIONS_FILE).exists(), "nothing consumed while paused");

    host.allowed = true;
    bridge.update(0.0, &mut host, &mut executor);
    assert_eq!(executor.calls, 1, "accumulated time ticks once the host allows");
}

// -- Test 7: reorder rides the hook pipeline --------------------------------

#[test]
fn reorder_scheduled_via_facade_applies_on_evaluation_complete() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = Bridge::new(dir.path(), SchedulerConfig::default()).unwrap();
    let mut host = TableHost::new();
    host.jokers = vec![
        JokerSlot {
            id: "j0".to_owned(),
            name: "blueprint".to_owned(),
            position: 0,
            properties: Default::default(),
        },
        JokerSlot {
            id: "j1".to_owned(),
            name: "mime".to_owned(),
            position: 1,
            properties: Default::default(),
        },
    ];

    bridge.install_hook(
        HOOK_EVALUATION_COMPLETE,
        Box::new(|_host, _args| Ok(Value::Bool(true))),
    );
    bridge.schedule_reorder(vec![1, 0]);
    assert!(bridge.reorder_pending());
    assert_eq!(host.jokers[0].name, "blueprint");

    let value = bridge.invoke_hook(HOOK_EVALUATION_COMPLETE, &mut host, &Value::Null);
    assert_eq!(value, Value::Bool(true), "observer must not eat the return value");
    assert_eq!(host.jokers[0].name, "mime");
    assert_eq!(host.jokers[0].position, 0);
    assert!(!bridge.reorder_pending());
}

// -- Test 8: emergency dump --------------------------------------------------

#[test]
fn emergency_dump_reports_every_collection() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = Bridge::new(dir.path(), SchedulerConfig::default()).unwrap();
    let mut host = TableHost::new();
    host.jokers.push(JokerSlot {
        id: "j0".to_owned(),
        name: "blueprint".to_owned(),
        position: 0,
        properties: Default::default(),
    });

    let dump = bridge.emergency_dump(&host);
    let jokers = &dump["jokers"];
    assert_eq!(jokers["len"], 1);
    assert_eq!(jokers["items"][0]["name"], "blueprint");
}
