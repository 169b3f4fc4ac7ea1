//! Property-based invariant tests for z-order operations.
//!
//! Scenes are generated from root elements, groups, labelled containers and
//! frames whose children (plain or grouped) sit directly below the frame.
//! Some plain elements are deleted. Every operation is applied repeatedly to
//! a random selection and the following must hold after each step:
//!
//! 1. The result is a permutation of the input and the selection is unchanged
//! 2. Every element has a key and keys strictly increase
//! 3. A frame's live children occupy the slots directly below the frame
//! 4. A group's live members stay contiguous and keep their relative order
//! 5. Bound text stays directly above its container
//! 6. A frame child sent to the front or back without its frame stays
//!    inside the frame, at that end of the frame's children

use proptest::prelude::*;
use proptest::sample::Index;
use proptest::test_runner::TestCaseError;
use std::collections::{HashMap, HashSet};
use tessera_editor::{apply_z_order, Element, ElementId, ZOrderOp};
use tessera_fractional_index::{repair_all, validate, ValidateOptions};

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Child {
    Plain { deleted: bool },
    Group { size: usize },
}

#[derive(Debug, Clone)]
enum Block {
    Plain { deleted: bool },
    Group { size: usize },
    Labelled,
    Frame { children: Vec<Child> },
}

fn arb_child() -> impl Strategy<Value = Child> {
    prop_oneof![
        3 => prop::bool::weighted(0.2).prop_map(|deleted| Child::Plain { deleted }),
        1 => (2usize..=3).prop_map(|size| Child::Group { size }),
    ]
}

fn arb_block() -> impl Strategy<Value = Block> {
    prop_oneof![
        4 => prop::bool::weighted(0.2).prop_map(|deleted| Block::Plain { deleted }),
        2 => (2usize..=3).prop_map(|size| Block::Group { size }),
        1 => Just(Block::Labelled),
        2 => prop::collection::vec(arb_child(), 0..4).prop_map(|children| Block::Frame { children }),
    ]
}

fn arb_op() -> impl Strategy<Value = ZOrderOp> {
    prop_oneof![
        Just(ZOrderOp::BringForward),
        Just(ZOrderOp::SendBackward),
        Just(ZOrderOp::BringToFront),
        Just(ZOrderOp::SendToBack),
    ]
}

fn arb_end_op() -> impl Strategy<Value = ZOrderOp> {
    prop_oneof![Just(ZOrderOp::BringToFront), Just(ZOrderOp::SendToBack)]
}

fn plain(id: String, deleted: bool) -> Element {
    let element = Element::rectangle(id);
    if deleted {
        element.deleted()
    } else {
        element
    }
}

/// Lay the blocks out in order and seed keys
fn build_scene(blocks: &[Block]) -> Vec<Element> {
    let mut counter = 0;
    let mut fresh = |prefix: &str| {
        counter += 1;
        format!("{prefix}{counter}")
    };

    let mut elements = Vec::new();
    for block in blocks {
        match block {
            Block::Plain { deleted } => elements.push(plain(fresh("E"), *deleted)),
            Block::Group { size } => {
                let group = fresh("g");
                for _ in 0..*size {
                    elements.push(Element::rectangle(fresh("E")).with_group_ids([group.clone()]));
                }
            }
            Block::Labelled => {
                let container = fresh("E");
                let text = fresh("T");
                elements.push(Element::rectangle(container.clone()).with_bound_text(text.clone()));
                elements.push(Element::text(text).bound_to(container));
            }
            Block::Frame { children } => {
                let frame = fresh("F");
                for child in children {
                    match child {
                        Child::Plain { deleted } => {
                            elements.push(plain(fresh("E"), *deleted).in_frame(frame.clone()));
                        }
                        Child::Group { size } => {
                            let group = fresh("g");
                            for _ in 0..*size {
                                elements.push(
                                    Element::rectangle(fresh("E"))
                                        .with_group_ids([group.clone()])
                                        .in_frame(frame.clone()),
                                );
                            }
                        }
                    }
                }
                elements.push(Element::frame(frame));
            }
        }
    }

    repair_all(&mut elements);
    elements
}

fn select(elements: &[Element], picks: &[Index]) -> HashSet<ElementId> {
    picks.iter().map(|pick| pick.get(elements).id.clone()).collect()
}

/// Apply each op in turn, returning every intermediate sequence
fn replay(
    original: &[Element],
    selected: &HashSet<ElementId>,
    ops: &[ZOrderOp],
) -> Result<Vec<Vec<Element>>, TestCaseError> {
    let mut history = Vec::with_capacity(ops.len());
    let mut elements = original.to_vec();
    for &op in ops {
        let result = apply_z_order(op, &elements, selected, None);
        prop_assert_eq!(&result.selected_ids, selected);
        if !result.changed {
            prop_assert_eq!(&result.elements, &elements);
        }
        elements = result.elements;
        history.push(elements.clone());
    }
    Ok(history)
}

/// Live elements in sequence order
fn live(elements: &[Element]) -> Vec<&Element> {
    elements.iter().filter(|e| !e.is_deleted).collect()
}

fn position_in(projection: &[&Element], id: &str) -> Option<usize> {
    projection.iter().position(|e| e.id == id)
}

fn check_frames(elements: &[Element]) -> Result<(), TestCaseError> {
    let projection = live(elements);
    for (position, frame) in projection.iter().enumerate().filter(|(_, e)| e.is_frame_like()) {
        let children = projection
            .iter()
            .filter(|e| e.frame_id.as_deref() == Some(frame.id.as_str()))
            .count();
        prop_assert!(children <= position, "frame {} has children above it", frame.id);
        for element in &projection[position - children..position] {
            prop_assert_eq!(
                element.frame_id.as_deref(),
                Some(frame.id.as_str()),
                "{} sits inside the children of {}",
                element.id,
                frame.id
            );
        }
    }
    Ok(())
}

fn check_groups(original: &[Element], elements: &[Element]) -> Result<(), TestCaseError> {
    let mut groups: HashMap<&str, Vec<&str>> = HashMap::new();
    for element in live(original) {
        for group_id in &element.group_ids {
            groups.entry(group_id.as_str()).or_default().push(element.id.as_str());
        }
    }

    let projection = live(elements);
    for (group_id, members) in groups {
        let positions: Vec<usize> = members
            .iter()
            .filter_map(|id| position_in(&projection, id))
            .collect();
        prop_assert_eq!(positions.len(), members.len());
        prop_assert!(
            positions.windows(2).all(|pair| pair[0] + 1 == pair[1]),
            "group {} split or reordered: {:?}",
            group_id,
            positions
        );
    }
    Ok(())
}

fn check_bound_text(elements: &[Element]) -> Result<(), TestCaseError> {
    let projection = live(elements);
    for (position, text) in projection.iter().enumerate() {
        let Some(container_id) = text.container_id.as_deref() else {
            continue;
        };
        prop_assert_eq!(
            position_in(&projection, container_id).map(|container| container + 1),
            Some(position),
            "text {} detached from {}",
            text.id,
            container_id
        );
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Permutation and selection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reorder_is_a_permutation(
        blocks in prop::collection::vec(arb_block(), 1..8),
        picks in prop::collection::vec(any::<Index>(), 1..4),
        ops in prop::collection::vec(arb_op(), 1..4),
    ) {
        let original = build_scene(&blocks);
        let selected = select(&original, &picks);
        let mut expected: Vec<&str> = original.iter().map(|e| e.id.as_str()).collect();
        expected.sort_unstable();

        for elements in replay(&original, &selected, &ops)? {
            let mut ids: Vec<&str> = elements.iter().map(|e| e.id.as_str()).collect();
            ids.sort_unstable();
            prop_assert_eq!(ids, expected.clone());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Keys strictly increase
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reorder_keeps_keys_increasing(
        blocks in prop::collection::vec(arb_block(), 1..8),
        picks in prop::collection::vec(any::<Index>(), 1..4),
        ops in prop::collection::vec(arb_op(), 1..4),
    ) {
        let original = build_scene(&blocks);
        let selected = select(&original, &picks);
        let strict = ValidateOptions { require_keys: true };

        for elements in replay(&original, &selected, &ops)? {
            let violations = validate(&elements, strict);
            prop_assert!(violations.is_empty(), "key violations: {:?}", violations);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Frame children stay directly below their frame
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reorder_keeps_frames_contiguous(
        blocks in prop::collection::vec(arb_block(), 1..8),
        picks in prop::collection::vec(any::<Index>(), 1..4),
        ops in prop::collection::vec(arb_op(), 1..4),
    ) {
        let original = build_scene(&blocks);
        let selected = select(&original, &picks);

        for elements in replay(&original, &selected, &ops)? {
            check_frames(&elements)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Groups stay contiguous and ordered
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reorder_keeps_groups_contiguous(
        blocks in prop::collection::vec(arb_block(), 1..8),
        picks in prop::collection::vec(any::<Index>(), 1..4),
        ops in prop::collection::vec(arb_op(), 1..4),
    ) {
        let original = build_scene(&blocks);
        let selected = select(&original, &picks);

        for elements in replay(&original, &selected, &ops)? {
            check_groups(&original, &elements)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Bound text stays with its container
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reorder_keeps_bound_text_attached(
        blocks in prop::collection::vec(arb_block(), 1..8),
        picks in prop::collection::vec(any::<Index>(), 1..4),
        ops in prop::collection::vec(arb_op(), 1..4),
    ) {
        let original = build_scene(&blocks);
        let selected = select(&original, &picks);

        for elements in replay(&original, &selected, &ops)? {
            check_bound_text(&elements)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. A lone frame child goes to its end of the frame, never past it
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lone_frame_child_stays_in_frame(
        before in prop::collection::vec(arb_block(), 0..4),
        extra_children in prop::collection::vec(arb_child(), 0..3),
        after in prop::collection::vec(arb_block(), 0..4),
        pick in any::<Index>(),
        op in arb_end_op(),
    ) {
        let frames_before = before.iter().filter(|b| matches!(b, Block::Frame { .. })).count();
        let mut children = vec![Child::Plain { deleted: false }];
        children.extend(extra_children);
        let mut blocks = before;
        blocks.push(Block::Frame { children });
        blocks.extend(after);

        let original = build_scene(&blocks);
        let frame_id = original
            .iter()
            .filter(|e| e.is_frame_like())
            .nth(frames_before)
            .map(|frame| frame.id.clone())
            .unwrap();
        let live_children: Vec<&Element> = live(&original)
            .into_iter()
            .filter(|e| e.frame_id.as_deref() == Some(frame_id.as_str()))
            .collect();
        let child = *pick.get(&live_children);
        let selected = HashSet::from([child.id.clone()]);

        let result = apply_z_order(op, &original, &selected, None);
        check_frames(&result.elements)?;
        check_groups(&original, &result.elements)?;

        let projection = live(&result.elements);
        let frame_at = position_in(&projection, &frame_id).unwrap();
        let block_start = frame_at - live_children.len();
        let child_at = position_in(&projection, &child.id).unwrap();
        prop_assert!(block_start <= child_at && child_at < frame_at);

        // Only members of the child's own group may sit between it and the edge
        let unit = |e: &&Element| e.id == child.id || (!child.group_ids.is_empty() && e.group_ids == child.group_ids);
        let beyond = match op {
            ZOrderOp::SendToBack => &projection[block_start..child_at],
            _ => &projection[child_at + 1..frame_at],
        };
        prop_assert!(
            beyond.iter().all(unit),
            "{} not at the {:?} end of {}",
            child.id,
            op,
            frame_id
        );
    }
}
