//! Property test: the directory never holds two live entries whose ids match
//! case-insensitively, no matter what sequence of operations runs against it.

use proptest::prelude::*;

use peercall_presence_core::{Peer, PeerId, PresenceDirectory};

#[derive(Debug, Clone)]
enum Op {
    Register(String),
    Deregister,
    Announce(String),
    Withdraw(String),
    Clear,
}

/// Small name pool with deliberate case collisions.
fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("alice".to_string()),
        Just("Alice".to_string()),
        Just("ALICE".to_string()),
        Just("bob".to_string()),
        Just("BoB".to_string()),
        Just("carol".to_string()),
        Just("dave".to_string()),
        Just("al".to_string()),  // too short, always rejected
        Just("  eve  ".to_string()),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        name_strategy().prop_map(Op::Register),
        Just(Op::Deregister),
        name_strategy().prop_map(Op::Announce),
        name_strategy().prop_map(Op::Withdraw),
        Just(Op::Clear),
    ]
}

fn assert_namespace_unique(directory: &PresenceDirectory) {
    let mut keys: Vec<String> = directory
        .list()
        .iter()
        .map(|p| p.id.normalized())
        .collect();
    if let Some(local) = directory.local_id() {
        keys.push(local.normalized());
    }
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total, "duplicate case-insensitive ids live");
}

proptest! {
    #[test]
    fn no_two_live_entries_share_a_case_insensitive_id(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let directory = PresenceDirectory::new();
        for op in ops {
            match op {
                Op::Register(name) => {
                    // Outcome does not matter; the invariant must hold either way.
                    let _ = directory.register(&name);
                }
                Op::Deregister => {
                    directory.deregister();
                }
                Op::Announce(name) => {
                    let _ = directory.announce(Peer::new(name.trim()));
                }
                Op::Withdraw(name) => {
                    directory.withdraw(&PeerId::from(name.as_str()));
                }
                Op::Clear => directory.clear(),
            }
            assert_namespace_unique(&directory);
        }
    }
}
