//! Enforcer tests over long and frame-shaped sequences

use std::collections::HashSet;
use tessera_fractional_index::{
    key_between, repair_all, repair_moved, validate, OrderKey, OrderedItem, ValidateOptions,
};

#[derive(Debug, Clone)]
struct Node {
    id: String,
    key: Option<OrderKey>,
    frame_id: Option<String>,
}

impl Node {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: None,
            frame_id: None,
        }
    }

    fn keyed(id: impl Into<String>, key: &str) -> Self {
        Self {
            key: Some(OrderKey::parse(key).unwrap()),
            ..Self::new(id)
        }
    }

    fn in_frame(mut self, frame_id: &str) -> Self {
        self.frame_id = Some(frame_id.to_string());
        self
    }
}

impl OrderedItem for Node {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> Option<&OrderKey> {
        self.key.as_ref()
    }

    fn set_order_key(&mut self, key: OrderKey) {
        self.key = Some(key);
    }
}

fn assert_strictly_increasing(nodes: &[Node]) {
    let violations = validate(nodes, ValidateOptions { require_keys: true });
    assert!(violations.is_empty(), "violations: {:?}", violations);
}

#[test]
fn test_repair_large_unkeyed_sequence() {
    let mut nodes: Vec<Node> = (0..20_000).map(|i| Node::new(format!("n{i}"))).collect();
    let report = repair_all(&mut nodes);
    assert_eq!(report.rewritten.len(), 20_000);
    assert_strictly_increasing(&nodes);
}

#[test]
fn test_repair_large_growing_sequence_keeps_last_key() {
    let mut nodes: Vec<Node> = (0..20_000).map(|i| Node::new(format!("n{i}"))).collect();
    let last = nodes.len() - 1;
    nodes[last].key = Some(OrderKey::parse("c4BZ").unwrap());

    let report = repair_all(&mut nodes);
    assert_eq!(report.rewritten.len(), 19_999);
    assert_eq!(nodes[last].key.as_ref().map(OrderKey::as_str), Some("c4BZ"));
    assert_strictly_increasing(&nodes);
}

#[test]
fn test_repair_large_declining_sequence_keeps_first_key() {
    let mut keys = vec![key_between(None, None)];
    for _ in 1..20_000 {
        let next = key_between(None, keys.last());
        keys.push(next);
    }
    let mut nodes: Vec<Node> = keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| Node {
            key: Some(key),
            ..Node::new(format!("n{i}"))
        })
        .collect();

    let report = repair_all(&mut nodes);
    assert_eq!(report.rewritten.len(), 19_999);
    assert_eq!(nodes[0].key.as_ref().map(OrderKey::as_str), Some("a0"));
    assert_strictly_increasing(&nodes);
}

#[test]
fn test_children_stay_below_their_frame() {
    // Children brought into a frame right before the frame itself
    let mut nodes = vec![
        Node::keyed("R1", "a0"),
        Node::keyed("C2", "a3").in_frame("F1"),
        Node::keyed("C1", "a4").in_frame("F1"),
        Node::keyed("F1", "a2"),
        Node::keyed("R2", "a5"),
    ];
    let moved: HashSet<String> = ["C2", "C1"].iter().map(|s| s.to_string()).collect();

    let report = repair_moved(&mut nodes, &moved);
    assert!(!report.fell_back);
    assert_eq!(report.rewritten, ["C2", "C1"]);
    assert_strictly_increasing(&nodes);

    let frame_key = nodes[3].key.clone();
    for child in nodes.iter().filter(|n| n.frame_id.as_deref() == Some("F1")) {
        assert!(child.key < frame_key, "{} keyed at or after its frame", child.id);
    }
}

#[test]
fn test_repair_is_deterministic_across_replicas() {
    let build = || {
        vec![
            Node::keyed("A", "a1"),
            Node::new("B"),
            Node::keyed("C", "a0"),
            Node::keyed("D", "a3"),
            Node::new("E"),
        ]
    };
    let mut first = build();
    let mut second = build();
    repair_all(&mut first);
    repair_all(&mut second);

    let keys = |nodes: &[Node]| -> Vec<Option<OrderKey>> {
        nodes.iter().map(|n| n.key.clone()).collect()
    };
    assert_eq!(keys(&first), keys(&second));
}
