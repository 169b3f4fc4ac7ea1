//! # Z-Order Operations
//!
//! Reorders the canonical sequence for bring-forward, send-backward,
//! bring-to-front and send-to-back.
//!
//! ## Model
//!
//! ```text
//! sequence:   A  B  (c)  (d)  E*  F  G*        * selected, () deleted
//! blocks:                     [E]    [G]
//! backward:   A  E  B  (c)  (d)  G  F
//! ```
//!
//! - Selected elements expand to whole units first (groups, bound text,
//!   frame children).
//! - Deleted elements directly after a moving element travel with it.
//! - A block steps over its nearest non-deleted neighbour, widened to the
//!   neighbour's whole group, frame range or container/text pair.
//! - Inside an edited group only its members are candidates, and moving
//!   out of the group is a no-op.
//! - A frame child moving without its frame stays among the frame's
//!   children. Stepping past the edge of that block moves the frame and
//!   all of its children instead; front and back stop at the edge.
//!
//! Every operation is a pure function of the sequence, the selection and
//! the editing group. Moved elements are rekeyed through
//! [`repair_moved`]; an operation that changes nothing returns the input
//! unchanged.

use crate::element::{Element, ElementId};
use crate::frame::{contiguous_frame_range, frame_ids, resolve_frame_id};
use crate::selection::elements_to_reorder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tessera_fractional_index::repair_moved;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZOrderOp {
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
}

/// Outcome of a z-order operation
#[derive(Debug, Clone, PartialEq)]
pub struct ZOrderResult {
    /// New canonical sequence, keys repaired
    pub elements: Vec<Element>,

    /// Always the selection the operation was given
    pub selected_ids: HashSet<ElementId>,

    pub changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

struct Reorder<'a> {
    frames: HashSet<&'a str>,
    editing_group_id: Option<&'a str>,
}

/// Apply `op` to the selection
pub fn apply(
    op: ZOrderOp,
    elements: &[Element],
    selected_ids: &HashSet<ElementId>,
    editing_group_id: Option<&str>,
) -> ZOrderResult {
    let targets = elements_to_reorder(elements, selected_ids, editing_group_id);
    let targets: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let ctx = Reorder {
        frames: frame_ids(elements),
        editing_group_id,
    };

    let working: Vec<&Element> = elements.iter().collect();
    let (order, moved) = match op {
        ZOrderOp::BringForward => shift_by_one(&ctx, working, &targets, Direction::Right),
        ZOrderOp::SendBackward => shift_by_one(&ctx, working, &targets, Direction::Left),
        ZOrderOp::BringToFront => shift_to_end_by_frames(&ctx, working, &targets, Direction::Right),
        ZOrderOp::SendToBack => shift_to_end_by_frames(&ctx, working, &targets, Direction::Left),
    };

    let changed = order
        .iter()
        .zip(elements)
        .any(|(next, previous)| !std::ptr::eq(*next, previous));
    if !changed {
        return ZOrderResult {
            elements: elements.to_vec(),
            selected_ids: selected_ids.clone(),
            changed: false,
        };
    }

    let mut next: Vec<Element> = order.into_iter().cloned().collect();
    let report = repair_moved(&mut next, &moved);
    debug!(
        op = ?op,
        moved = moved.len(),
        rewritten = report.rewritten.len(),
        fell_back = report.fell_back,
        "Applied z-order operation"
    );

    ZOrderResult {
        elements: next,
        selected_ids: selected_ids.clone(),
        changed: true,
    }
}

/// Positions of target elements plus deleted elements trailing them
fn indices_to_move(elements: &[&Element], targets: &HashSet<&str>) -> Vec<usize> {
    let mut selected = Vec::new();
    let mut deleted = Vec::new();
    let mut include_deleted_at = None;

    for (index, element) in elements.iter().enumerate() {
        if targets.contains(element.id.as_str()) {
            selected.append(&mut deleted);
            selected.push(index);
            include_deleted_at = Some(index + 1);
        } else if element.is_deleted && include_deleted_at == Some(index) {
            include_deleted_at = Some(index + 1);
            deleted.push(index);
        } else {
            deleted.clear();
        }
    }

    selected
}

/// Split moving positions into adjacent runs that share the frame they are
/// confined to. Frames and children of moving frames are not confined.
fn confined_blocks<'a>(
    ctx: &Reorder<'_>,
    elements: &[&'a Element],
    indices: &[usize],
    moving_frames: &HashSet<&str>,
) -> Vec<(Option<&'a str>, Vec<usize>)> {
    let mut blocks: Vec<(Option<&'a str>, Vec<usize>)> = Vec::new();
    for &index in indices {
        let element = elements[index];
        let confined_to = resolve_frame_id(element, &ctx.frames)
            .filter(|frame_id| !element.is_frame_like() && !moving_frames.contains(frame_id));

        // Absorbed deleted elements without a frame follow the run they trail
        let extends = blocks.last().map_or(false, |(frame, block)| {
            let adjacent = block.last().map_or(false, |&last| last + 1 == index);
            adjacent && (confined_to == *frame || (element.is_deleted && element.frame_id.is_none()))
        });
        match blocks.last_mut() {
            Some((_, block)) if extends => block.push(index),
            _ => blocks.push((confined_to, vec![index])),
        }
    }
    blocks
}

fn position_of(elements: &[&Element], id: &str) -> Option<usize> {
    elements.iter().position(|element| element.id == id)
}

/// Widen a target to cover the container/bound-text pair it belongs to
fn target_accounting_for_binding(
    elements: &[&Element],
    next: &Element,
    direction: Direction,
) -> Option<usize> {
    let partner = match next.container_id.as_deref() {
        Some(container_id) => container_id,
        None => next.bound_text_id()?,
    };
    let partner = position_of(elements, partner)?;
    let own = position_of(elements, &next.id)?;
    Some(match direction {
        Direction::Left => partner.min(own),
        Direction::Right => partner.max(own),
    })
}

/// Where the block at `boundary` should land, if anywhere
fn target_index(
    ctx: &Reorder<'_>,
    elements: &[&Element],
    boundary: usize,
    direction: Direction,
    containing_frame: Option<&str>,
) -> Option<usize> {
    let source = elements[boundary];
    let is_candidate = |element: &Element| {
        if element.is_deleted {
            false
        } else if let Some(frame_id) = containing_frame {
            element.frame_id.as_deref() == Some(frame_id)
        } else if let Some(group_id) = ctx.editing_group_id {
            element.in_group(group_id)
        } else {
            true
        }
    };

    let candidate = match direction {
        Direction::Left => (0..=boundary.saturating_sub(1))
            .rev()
            .find(|&index| is_candidate(elements[index]))?,
        Direction::Right => (boundary + 1..elements.len()).find(|&index| is_candidate(elements[index]))?,
    };
    let next = elements[candidate];

    if let Some(group_id) = ctx.editing_group_id {
        if source.group_ids == next.group_ids {
            return Some(target_accounting_for_binding(elements, next, direction).unwrap_or(candidate));
        }
        if !next.in_group(group_id) {
            return None;
        }
    }

    if containing_frame.is_none() {
        let next_frame = resolve_frame_id(next, &ctx.frames)
            .or_else(|| next.is_frame_like().then_some(next.id.as_str()));
        if let Some(frame_id) = next_frame {
            let (first, last) = contiguous_frame_range(elements, frame_id)?;
            return Some(match direction {
                Direction::Left => first,
                Direction::Right => last,
            });
        }
    }

    if next.group_ids.is_empty() {
        return Some(target_accounting_for_binding(elements, next, direction).unwrap_or(candidate));
    }

    let sibling_group = match ctx.editing_group_id {
        Some(group_id) => next
            .group_ids
            .iter()
            .position(|id| id == group_id)
            .filter(|&position| position > 0)
            .map(|position| next.group_ids[position - 1].as_str()),
        None => next.outermost_group_id(),
    };
    let Some(sibling_group) = sibling_group else {
        return Some(candidate);
    };

    let in_sibling_group = |element: &&Element| element.in_group(sibling_group);
    let range = match direction {
        Direction::Left => elements.iter().position(in_sibling_group),
        Direction::Right => elements.iter().rposition(in_sibling_group),
    };
    Some(range.unwrap_or(candidate))
}

/// Move each block one step past its neighbouring unit. A frame child
/// with nowhere left to go inside its frame takes the whole frame along.
fn shift_by_one<'a>(
    ctx: &Reorder<'_>,
    mut elements: Vec<&'a Element>,
    targets: &HashSet<&str>,
    direction: Direction,
) -> (Vec<&'a Element>, HashSet<ElementId>) {
    let indices = indices_to_move(&elements, targets);
    let mut moved: HashSet<ElementId> = indices.iter().map(|&i| elements[i].id.clone()).collect();
    let moving_frames: HashSet<&str> = indices
        .iter()
        .map(|&i| elements[i])
        .filter(|element| element.is_frame_like())
        .map(|element| element.id.as_str())
        .collect();

    let mut blocks = confined_blocks(ctx, &elements, &indices, &moving_frames);
    if direction == Direction::Right {
        blocks.reverse();
    }

    // Blocks reaching this position were carried by a frame move
    let mut settled: Option<usize> = None;

    for (frame, block) in blocks {
        let (leading, trailing) = (block[0], block[block.len() - 1]);
        let carried = settled.map_or(false, |bound| match direction {
            Direction::Left => leading <= bound,
            Direction::Right => trailing >= bound,
        });
        if carried {
            continue;
        }

        let boundary = match direction {
            Direction::Left => leading,
            Direction::Right => trailing,
        };

        let (leading, trailing, target, whole_frame) =
            match target_index(ctx, &elements, boundary, direction, frame) {
                Some(target) => (leading, trailing, target, false),
                None => {
                    let Some(frame_id) = frame else {
                        continue;
                    };
                    let Some((first, last)) = contiguous_frame_range(&elements, frame_id) else {
                        continue;
                    };
                    let edge = match direction {
                        Direction::Left => first,
                        Direction::Right => last,
                    };
                    let Some(target) = target_index(ctx, &elements, edge, direction, None) else {
                        continue;
                    };
                    (first, last, target, true)
                }
            };

        if whole_frame {
            moved.extend(elements[leading..=trailing].iter().map(|element| element.id.clone()));
        }

        elements = match direction {
            Direction::Left if target < leading => [
                &elements[..target],
                &elements[leading..=trailing],
                &elements[target..leading],
                &elements[trailing + 1..],
            ]
            .concat(),
            Direction::Right if target > trailing => [
                &elements[..leading],
                &elements[trailing + 1..=target],
                &elements[leading..=trailing],
                &elements[target + 1..],
            ]
            .concat(),
            _ => continue,
        };

        if whole_frame {
            settled = Some(match direction {
                Direction::Left => trailing,
                Direction::Right => leading,
            });
        }
    }

    (elements, moved)
}

/// Move the targets to one end of the sequence, of their frame, or of the
/// edited group
fn shift_to_end<'a>(
    ctx: &Reorder<'_>,
    elements: Vec<&'a Element>,
    targets: &HashSet<&str>,
    direction: Direction,
    containing_frame: Option<&str>,
    moved: &mut HashSet<ElementId>,
) -> Vec<&'a Element> {
    let indices = indices_to_move(&elements, targets);
    let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
        return elements;
    };

    let bounds = match direction {
        Direction::Left => {
            let leading = if let Some(frame_id) = containing_frame {
                elements.iter().position(|element| element.frame_id.as_deref() == Some(frame_id))
            } else if let Some(group_id) = ctx.editing_group_id {
                elements.iter().position(|element| element.in_group(group_id))
            } else {
                Some(0)
            };
            leading.map(|leading| (leading, last))
        }
        Direction::Right => {
            let trailing = if let Some(frame_id) = containing_frame {
                elements.iter().rposition(|element| element.frame_id.as_deref() == Some(frame_id))
            } else if let Some(group_id) = ctx.editing_group_id {
                elements.iter().rposition(|element| element.in_group(group_id))
            } else {
                Some(elements.len() - 1)
            };
            trailing.map(|trailing| (first, trailing))
        }
    };
    let Some((leading, trailing)) = bounds.filter(|(leading, trailing)| leading <= trailing) else {
        return elements;
    };

    let moving: HashSet<usize> = indices.iter().copied().collect();
    moved.extend(indices.iter().map(|&i| elements[i].id.clone()));

    let mut head = Vec::new();
    let mut displaced = Vec::new();
    let mut tail = Vec::new();
    for (index, &element) in elements.iter().enumerate() {
        if moving.contains(&index) {
            continue;
        }
        if index < leading {
            head.push(element);
        } else if index <= trailing {
            displaced.push(element);
        } else {
            tail.push(element);
        }
    }
    let moving_elements = indices.iter().map(|&i| elements[i]);

    let mut next = Vec::with_capacity(elements.len());
    next.extend(head);
    match direction {
        Direction::Left => {
            next.extend(moving_elements);
            next.extend(displaced);
        }
        Direction::Right => {
            next.extend(displaced);
            next.extend(moving_elements);
        }
    }
    next.extend(tail);
    next
}

/// Send to an end, keeping frame children that move without their frame
/// inside that frame's block of children
fn shift_to_end_by_frames<'a>(
    ctx: &Reorder<'_>,
    elements: Vec<&'a Element>,
    targets: &HashSet<&str>,
    direction: Direction,
) -> (Vec<&'a Element>, HashSet<ElementId>) {
    let fully_selected_frames: HashSet<&str> = elements
        .iter()
        .filter(|element| element.is_frame_like() && targets.contains(element.id.as_str()))
        .map(|element| element.id.as_str())
        .collect();

    let mut regular: HashSet<&str> = HashSet::new();
    let mut frame_children: Vec<(&str, HashSet<&str>)> = Vec::new();
    for &element in elements.iter().filter(|element| targets.contains(element.id.as_str())) {
        match resolve_frame_id(element, &ctx.frames) {
            Some(frame_id) if !element.is_frame_like() && !fully_selected_frames.contains(frame_id) => {
                match frame_children.iter_mut().find(|(id, _)| *id == frame_id) {
                    Some((_, children)) => {
                        children.insert(element.id.as_str());
                    }
                    None => frame_children.push((frame_id, HashSet::from([element.id.as_str()]))),
                }
            }
            _ => {
                regular.insert(element.id.as_str());
            }
        }
    }

    let mut moved = HashSet::new();
    let mut next = elements;
    for (frame_id, children) in &frame_children {
        next = shift_to_end(ctx, next, children, direction, Some(*frame_id), &mut moved);
    }
    next = shift_to_end(ctx, next, &regular, direction, None, &mut moved);

    (next, moved)
}
