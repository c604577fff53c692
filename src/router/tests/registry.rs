//! Registry construction, snapshot and replacement

use super::*;

#[test]
fn test_empty_bootstrap_rejected() {
    assert_eq!(
        NodeRegistry::new(Vec::new()).unwrap_err(),
        RegistryError::EmptyBootstrap
    );
}

#[test]
fn test_snapshot_preserves_order() {
    let registry = registry(&["c:1", "a:1", "b:1"]);
    assert_eq!(registry.snapshot(), nodes(&["c:1", "a:1", "b:1"]));
    assert_eq!(registry.count(), 3);
}

#[test]
fn test_snapshot_is_a_copy() {
    let registry = registry(&["a:1"]);
    let before = registry.snapshot();

    registry.replace(nodes(&["b:1", "c:1"]));

    assert_eq!(before, nodes(&["a:1"]));
    assert_eq!(registry.snapshot(), nodes(&["b:1", "c:1"]));
}

#[test]
fn test_replace_with_empty_is_noop() {
    let registry = registry(&["a:1", "b:1"]);

    assert!(!registry.replace(Vec::new()));

    assert_eq!(registry.snapshot(), nodes(&["a:1", "b:1"]));
    assert_eq!(registry.count(), 2);
}

#[test]
fn test_replace_with_nodes_swaps_set() {
    let registry = registry(&["a:1"]);

    assert!(registry.replace(nodes(&["x:1", "y:1", "z:1"])));

    assert_eq!(registry.snapshot(), nodes(&["x:1", "y:1", "z:1"]));
    assert_eq!(registry.count(), 3);
}

#[test]
fn test_replace_does_not_reset_cursor() {
    let registry = registry(&["a:1", "b:1"]);
    let _ = registry.choose_node();

    registry.replace(nodes(&["x:1", "y:1"]));

    assert_eq!(registry.selections(), 1);
    assert_eq!(registry.choose_node().unwrap().as_str(), "y:1");
}

#[test]
fn test_empty_replacement_keeps_sole_bootstrap_node() {
    let registry = registry(&["A:1"]);

    registry.replace(Vec::new());

    assert_eq!(registry.snapshot(), nodes(&["A:1"]));
    assert_eq!(registry.choose_node().unwrap().as_str(), "A:1");
}
