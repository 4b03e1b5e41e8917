//! Property tests for the dispatch sequencing and reorder invariants.

use proptest::prelude::*;
use serde_json::Value;

use cardbridge::prelude::*;
use cardbridge::reorder::apply_reorder;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct TableHost {
    jokers: Vec<JokerSlot>,
}

impl TableHost {
    fn with_rack(len: usize) -> Self {
        Self {
            jokers: (0..len)
                .map(|position| JokerSlot {
                    id: format!("j{position}"),
                    name: format!("joker-{position}"),
                    position,
                    properties: Default::default(),
                })
                .collect(),
        }
    }
}

impl HostView for TableHost {
    fn update_allowed(&self) -> bool {
        true
    }
    fn snapshot(&self) -> Option<TableSnapshot> {
        Some(TableSnapshot::default())
    }
    fn handles(&self) -> HandleReport {
        HandleReport::healthy()
    }
    fn collection_names(&self) -> &'static [&'static str] {
        &[]
    }
    fn collection_len(&self, _name: &str) -> Option<usize> {
        None
    }
    fn collection_item(&self, name: &str, _index: usize) -> Result<Value, BridgeError> {
        Err(BridgeError::Transient(format!("no collection {name}")))
    }
}

impl Host for TableHost {
    fn jokers_mut(&mut self) -> &mut Vec<JokerSlot> {
        &mut self.jokers
    }
}

#[derive(Default)]
struct CountingExecutor {
    executed: Vec<u64>,
    current: u64,
}

impl ActionExecutor for CountingExecutor {
    fn execute(&mut self, _action: &Action) -> Result<(), String> {
        self.executed.push(self.current);
        Ok(())
    }
}

fn command(sequence: u64) -> CommandEnvelope {
    CommandEnvelope {
        timestamp: 0,
        sequence_id: sequence,
        message_type: MSG_ACTION_COMMAND.to_owned(),
        data: serde_json::json!({"action_type": "go_to_shop"}),
    }
}

// ---------------------------------------------------------------------------
// Dispatch sequencing
// ---------------------------------------------------------------------------

proptest! {
    /// Under any delivery order with any amount of duplication, each
    /// sequence id executes at most once and the high-water mark only
    /// ever rises.
    #[test]
    fn each_sequence_executes_at_most_once(
        deliveries in proptest::collection::vec(1u64..20, 0..60),
    ) {
        let mut pending = PendingAction::new();
        let mut executor = CountingExecutor::default();
        let host = TableHost::with_rack(0);

        let mut previous_mark = 0;
        for sequence in deliveries {
            // Finish any armed capture first, as a logical tick would.
            pending.service(&host);

            executor.current = sequence;
            pending.dispatch(command(sequence), &mut executor);

            let mark = pending.last_processed_sequence();
            prop_assert!(mark >= previous_mark, "high-water mark must never regress");
            previous_mark = mark;
        }

        let mut seen = std::collections::HashSet::new();
        for sequence in &executor.executed {
            prop_assert!(seen.insert(*sequence), "sequence {sequence} executed twice");
        }
    }

    /// Accepted sequences are strictly increasing in execution order.
    #[test]
    fn executed_sequences_are_strictly_increasing(
        deliveries in proptest::collection::vec(1u64..50, 0..80),
    ) {
        let mut pending = PendingAction::new();
        let mut executor = CountingExecutor::default();
        let host = TableHost::with_rack(0);

        for sequence in deliveries {
            pending.service(&host);
            executor.current = sequence;
            pending.dispatch(command(sequence), &mut executor);
        }

        for pair in executor.executed.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}

// ---------------------------------------------------------------------------
// Reorder permutations
// ---------------------------------------------------------------------------

fn permutation(len: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..len).collect::<Vec<_>>()).prop_shuffle()
}

proptest! {
    /// A valid permutation is always accepted, preserves the rack as a
    /// set, and leaves position bookkeeping dense.
    #[test]
    fn valid_permutations_apply_cleanly(
        (len, order) in (0usize..8).prop_flat_map(|len| (Just(len), permutation(len))),
    ) {
        let mut host = TableHost::with_rack(len);
        apply_reorder(&mut host, &order).unwrap();

        prop_assert_eq!(host.jokers.len(), len);
        for (index, joker) in host.jokers.iter().enumerate() {
            prop_assert_eq!(joker.position, index);
            // Position index now holds the joker that was at order[index].
            let expected_id = format!("j{}", order[index]);
            prop_assert_eq!(joker.id.as_str(), expected_id.as_str());
        }
    }

    /// Anything that is not a permutation of 0..len is rejected with the
    /// rack untouched.
    #[test]
    fn non_permutations_are_rejected_without_mutation(
        len in 1usize..6,
        order in proptest::collection::vec(0usize..10, 0..10),
    ) {
        let is_permutation = order.len() == len && {
            let mut seen = vec![false; len];
            order.iter().all(|&i| i < len && !std::mem::replace(&mut seen[i], true))
        };
        prop_assume!(!is_permutation);

        let mut host = TableHost::with_rack(len);
        let before: Vec<String> = host.jokers.iter().map(|j| j.id.clone()).collect();

        let err = apply_reorder(&mut host, &order).unwrap_err();
        prop_assert!(matches!(err, BridgeError::Validation(_)));

        let after: Vec<String> = host.jokers.iter().map(|j| j.id.clone()).collect();
        prop_assert_eq!(before, after, "rejected permutation must not mutate");
    }
}
