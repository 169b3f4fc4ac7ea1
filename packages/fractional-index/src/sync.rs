//! # Invariant Enforcement
//!
//! Keeps key order equal to array order: for every pair of adjacent keyed
//! items, `key(items[i]) < key(items[i + 1])`.
//!
//! ## Strategies
//!
//! - [`repair_all`]: full scan. Keeps the greedy longest prefix-consistent
//!   chain of valid keys and rekeys only the gaps.
//! - [`repair_moved`]: only items that were just moved or inserted are
//!   rekeyed, between their untouched neighbours. Falls back to
//!   [`repair_all`] when the neighbours themselves are out of order.
//!
//! Items whose keys already satisfy the invariant are never rewritten, so a
//! no-op reorder produces no writes to propagate.

use crate::error::{OrderKeyError, OrderKeyResult};
use crate::generate::{n_keys_between, try_n_keys_between};
use crate::key::OrderKey;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Anything that lives in an ordered sequence and carries an order key
pub trait OrderedItem {
    fn item_id(&self) -> &str;

    fn order_key(&self) -> Option<&OrderKey>;

    fn set_order_key(&mut self, key: OrderKey);
}

/// Outcome of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Ids of items whose keys were rewritten, in sequence order
    pub rewritten: Vec<String>,

    /// Moved-only repair could not satisfy the invariant and a full
    /// repair ran instead
    pub fell_back: bool,
}

impl RepairReport {
    pub fn is_noop(&self) -> bool {
        self.rewritten.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    Malformed,
    Duplicate,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub id: String,
    pub key: Option<OrderKey>,
    pub previous: Option<OrderKey>,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key.as_ref().map(OrderKey::as_str).unwrap_or("<none>");
        match self.kind {
            ViolationKind::Missing => write!(f, "item {} at {} has no key", self.id, self.index),
            ViolationKind::Malformed => {
                write!(f, "item {} at {} has malformed key {}", self.id, self.index, key)
            }
            ViolationKind::Duplicate | ViolationKind::Decreasing => {
                let previous = self.previous.as_ref().map(OrderKey::as_str).unwrap_or("<none>");
                write!(
                    f,
                    "item {} at {} has key {} not above previous key {}",
                    self.id, self.index, key, previous
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Report unkeyed items. Off by default: items pending their first
    /// key are not violations.
    pub require_keys: bool,
}

/// Rekey every item that breaks the invariant.
///
/// Scanning left to right, an item is kept when its key is well formed and
/// above the last kept key. Each run of rejected items gets fresh keys
/// between the kept keys around it.
pub fn repair_all<T: OrderedItem>(items: &mut [T]) -> RepairReport {
    let kept = kept_positions(items);
    let mut report = RepairReport::default();

    let mut lower: Option<OrderKey> = None;
    let mut index = 0;
    while index < items.len() {
        if kept[index] {
            lower = items[index].order_key().cloned();
            index += 1;
            continue;
        }

        let start = index;
        while index < items.len() && !kept[index] {
            index += 1;
        }
        let upper = items.get(index).and_then(|item| item.order_key()).cloned();

        // Kept keys are well formed and strictly increasing
        let keys = n_keys_between(lower.as_ref(), upper.as_ref(), index - start);
        for (item, key) in items[start..index].iter_mut().zip(keys) {
            report.rewritten.push(item.item_id().to_string());
            item.set_order_key(key);
        }
    }

    if !report.is_noop() {
        debug!(rewritten = report.rewritten.len(), total = items.len(), "Repaired order keys");
    }
    report
}

/// Rekey only the items in `moved`.
///
/// Each contiguous run of moved items is bounded by its non-moved
/// neighbours. Runs whose keys already fit are left untouched. When the
/// result would still break the invariant, every item is repaired instead.
pub fn repair_moved<T: OrderedItem>(items: &mut [T], moved: &HashSet<String>) -> RepairReport {
    if moved.is_empty() {
        return RepairReport::default();
    }

    match plan_moved_keys(items, moved) {
        Ok(plan) => {
            let mut report = RepairReport::default();
            for (index, key) in plan {
                report.rewritten.push(items[index].item_id().to_string());
                items[index].set_order_key(key);
            }
            if !report.is_noop() {
                debug!(rewritten = report.rewritten.len(), moved = moved.len(), "Repaired moved order keys");
            }
            report
        }
        Err(err) => {
            warn!(error = %err, moved = moved.len(), "Moved key repair failed, repairing all keys");
            let mut report = repair_all(items);
            report.fell_back = true;
            report
        }
    }
}

/// Report every item breaking the invariant. Never mutates.
pub fn validate<T: OrderedItem>(items: &[T], options: ValidateOptions) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut previous: Option<&OrderKey> = None;

    for (index, item) in items.iter().enumerate() {
        let violation = |kind, key: Option<&OrderKey>, previous: Option<&OrderKey>| Violation {
            index,
            id: item.item_id().to_string(),
            key: key.cloned(),
            previous: previous.cloned(),
            kind,
        };

        let Some(key) = item.order_key() else {
            if options.require_keys {
                violations.push(violation(ViolationKind::Missing, None, previous));
            }
            continue;
        };

        if !key.is_well_formed() {
            violations.push(violation(ViolationKind::Malformed, Some(key), previous));
            continue;
        }

        if let Some(prev) = previous {
            if key == prev {
                violations.push(violation(ViolationKind::Duplicate, Some(key), previous));
            } else if key < prev {
                violations.push(violation(ViolationKind::Decreasing, Some(key), previous));
            }
        }
        previous = Some(key);
    }

    violations
}

/// Sort by key, ties broken by id. Unkeyed items keep their positions.
pub fn order_by_key<T: OrderedItem>(items: Vec<T>) -> Vec<T> {
    let mut slots: Vec<Option<T>> = Vec::with_capacity(items.len());
    let mut keyed = Vec::new();
    for item in items {
        if item.order_key().is_some() {
            keyed.push(item);
            slots.push(None);
        } else {
            slots.push(Some(item));
        }
    }

    keyed.sort_by(|a, b| {
        a.order_key()
            .cmp(&b.order_key())
            .then_with(|| a.item_id().cmp(b.item_id()))
    });

    let mut keyed = keyed.into_iter();
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| keyed.next()))
        .collect()
}

fn kept_positions<T: OrderedItem>(items: &[T]) -> Vec<bool> {
    let mut last: Option<&OrderKey> = None;
    items
        .iter()
        .map(|item| match item.order_key() {
            Some(key) if key.is_well_formed() && last.map_or(true, |last| key > last) => {
                last = Some(key);
                true
            }
            _ => false,
        })
        .collect()
}

fn plan_moved_keys<T: OrderedItem>(
    items: &[T],
    moved: &HashSet<String>,
) -> OrderKeyResult<Vec<(usize, OrderKey)>> {
    let mut plan = Vec::new();

    let mut index = 0;
    while index < items.len() {
        if !moved.contains(items[index].item_id()) {
            index += 1;
            continue;
        }

        let start = index;
        while index < items.len() && moved.contains(items[index].item_id()) {
            index += 1;
        }
        let lower = start.checked_sub(1).and_then(|i| items[i].order_key());
        let upper = items.get(index).and_then(|item| item.order_key());

        if run_fits(&items[start..index], lower, upper) {
            continue;
        }
        let keys = try_n_keys_between(lower, upper, index - start)?;
        plan.extend((start..index).zip(keys));
    }

    check_planned(items, &plan)?;
    Ok(plan)
}

fn run_fits<T: OrderedItem>(run: &[T], lower: Option<&OrderKey>, upper: Option<&OrderKey>) -> bool {
    let mut previous = lower;
    for item in run {
        match item.order_key() {
            Some(key) if key.is_well_formed() && previous.map_or(true, |prev| key > prev) => {
                previous = Some(key);
            }
            _ => return false,
        }
    }
    match (previous, upper) {
        (Some(last), Some(upper)) => last < upper,
        _ => true,
    }
}

/// Every item keyed, well formed and strictly increasing once `plan` applies
fn check_planned<T: OrderedItem>(items: &[T], plan: &[(usize, OrderKey)]) -> OrderKeyResult<()> {
    let mut planned = plan.iter().peekable();
    let mut previous: Option<&OrderKey> = None;

    for (index, item) in items.iter().enumerate() {
        let key = match planned.peek() {
            Some((planned_index, key)) if *planned_index == index => {
                planned.next();
                Some(key)
            }
            _ => item.order_key(),
        };
        match key {
            Some(key) if key.is_well_formed() && previous.map_or(true, |prev| key > prev) => {
                previous = Some(key);
            }
            _ => return Err(OrderKeyError::Unordered(index)),
        }
    }
    Ok(())
}
