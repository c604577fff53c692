//! Concurrent selection and replacement

use super::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_choose_during_replace_stays_in_bounds() {
    let registry = Arc::new(registry(&["a:1", "b:1", "c:1", "d:1", "e:1"]));
    let short = nodes(&["x:1"]);
    let long = nodes(&["p:1", "q:1", "r:1", "s:1", "t:1", "u:1"]);

    let valid: HashSet<NodeAddress> = nodes(&["a:1", "b:1", "c:1", "d:1", "e:1"])
        .into_iter()
        .chain(short.iter().cloned())
        .chain(long.iter().cloned())
        .collect();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..2_000 {
                let next = if i % 2 == 0 { short.clone() } else { long.clone() };
                assert!(registry.replace(next));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..5_000)
                    .map(|_| registry.choose_node().expect("registry never empties"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        for node in reader.join().unwrap() {
            assert!(valid.contains(&node), "unexpected node {node}");
        }
    }

    assert_eq!(registry.selections(), 20_000);
}

#[test]
fn test_concurrent_snapshots_never_tear() {
    let registry = Arc::new(registry(&["a:1", "b:1"]));
    let first = nodes(&["a:1", "b:1"]);
    let second = nodes(&["x:1", "y:1", "z:1"]);

    let writer = {
        let registry = Arc::clone(&registry);
        let (first, second) = (first.clone(), second.clone());
        thread::spawn(move || {
            for i in 0..2_000 {
                registry.replace(if i % 2 == 0 { second.clone() } else { first.clone() });
            }
        })
    };

    let reader = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for _ in 0..5_000 {
                let snapshot = registry.snapshot();
                assert!(snapshot == first || snapshot == second);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

#[test]
fn test_concurrent_choose_is_fair_on_static_set() {
    let registry = Arc::new(registry(&["a:1", "b:1", "c:1", "d:1"]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..1_000)
                    .map(|_| registry.choose_node().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut counts = std::collections::HashMap::new();
    for handle in handles {
        for node in handle.join().unwrap() {
            *counts.entry(node).or_insert(0usize) += 1;
        }
    }

    // 8000 picks over 4 nodes under one lock: exactly 2000 each
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|&c| c == 2_000));
}
