//! # Groups and Atomic Units
//!
//! Resolves which elements must move together when a selection is
//! reordered.
//!
//! ## Rules
//!
//! 1. An element's *effective group* is its outermost group that is not the
//!    editing group or one of its ancestors. Inside an edited group, the
//!    direct-child subgroups are the units.
//! 2. Every non-deleted member of the effective group belongs to the unit.
//!    A group with fewer than two non-deleted members is not a group.
//! 3. Bound text never forms its own unit: it follows its container.
//! 4. Unknown or deleted containers are ignored; the text is then a plain
//!    element.

use crate::element::{Element, ElementId, GroupId};
use std::collections::{HashMap, HashSet};

/// What identifies an atomic unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitKey {
    Group(GroupId),
    Element(ElementId),
}

/// Elements that always move together, in sequence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicUnit {
    pub key: UnitKey,
    pub members: Vec<ElementId>,
}

/// Result of expanding a selection to whole groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSelection {
    pub selected_group_ids: HashSet<GroupId>,
    pub selected_element_ids: HashSet<ElementId>,
}

/// The group an element moves with under the given editing context
pub fn effective_group_id<'a>(element: &'a Element, editing_group_id: Option<&str>) -> Option<&'a str> {
    let group_ids = &element.group_ids;
    let visible = match editing_group_id.and_then(|editing| group_ids.iter().position(|id| id == editing)) {
        Some(position) => &group_ids[..position],
        None => &group_ids[..],
    };
    visible.last().map(String::as_str)
}

/// All elements carrying `group_id`, deleted ones included
pub fn elements_in_group<'a>(
    elements: &'a [Element],
    group_id: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    elements.iter().filter(move |element| element.in_group(group_id))
}

/// Expand selected elements to the groups they belong to.
///
/// Deleted or unknown ids in `selected_ids` are dropped.
pub fn select_groups_for_selected_elements(
    elements: &[Element],
    selected_ids: &HashSet<ElementId>,
    editing_group_id: Option<&str>,
) -> GroupSelection {
    let mut selected_group_ids: HashSet<GroupId> = elements
        .iter()
        .filter(|element| !element.is_deleted && selected_ids.contains(&element.id))
        .filter_map(|element| effective_group_id(element, editing_group_id))
        .map(str::to_string)
        .collect();

    let mut selected_element_ids = HashSet::new();
    let mut group_members: HashMap<&str, usize> = HashMap::new();
    for element in elements.iter().filter(|element| !element.is_deleted) {
        if selected_ids.contains(&element.id) {
            selected_element_ids.insert(element.id.clone());
        }
        let group = element
            .group_ids
            .iter()
            .find(|group_id| selected_group_ids.contains(*group_id));
        if let Some(group_id) = group {
            selected_element_ids.insert(element.id.clone());
            *group_members.entry(group_id.as_str()).or_default() += 1;
        }
    }

    // A single member is not a group
    let lonely: Vec<String> = group_members
        .iter()
        .filter(|(_, count)| **count < 2)
        .map(|(group_id, _)| group_id.to_string())
        .collect();
    for group_id in lonely {
        selected_group_ids.remove(&group_id);
    }

    GroupSelection {
        selected_group_ids,
        selected_element_ids,
    }
}

/// Resolve each selected element to the unit it moves with
pub fn resolve_atomic_units(
    elements: &[Element],
    selected_ids: &HashSet<ElementId>,
    editing_group_id: Option<&str>,
) -> Vec<AtomicUnit> {
    let by_id: HashMap<&str, &Element> = elements.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut group_sizes: HashMap<&str, usize> = HashMap::new();
    for element in elements.iter().filter(|element| !element.is_deleted) {
        for group_id in &element.group_ids {
            *group_sizes.entry(group_id.as_str()).or_default() += 1;
        }
    }

    let mut seen = HashSet::new();
    let mut units = Vec::new();
    for element in elements {
        if element.is_deleted || !selected_ids.contains(&element.id) {
            continue;
        }

        let anchor = element
            .container_id
            .as_deref()
            .and_then(|container_id| by_id.get(container_id).copied())
            .filter(|container| !container.is_deleted)
            .unwrap_or(element);

        let key = match effective_group_id(anchor, editing_group_id) {
            Some(group_id) if group_sizes.get(group_id).copied().unwrap_or(0) >= 2 => {
                UnitKey::Group(group_id.to_string())
            }
            _ => UnitKey::Element(anchor.id.clone()),
        };
        if !seen.insert(key.clone()) {
            continue;
        }

        let core: HashSet<&str> = match &key {
            UnitKey::Group(group_id) => elements
                .iter()
                .filter(|e| !e.is_deleted && e.in_group(group_id))
                .map(|e| e.id.as_str())
                .collect(),
            UnitKey::Element(id) => HashSet::from([id.as_str()]),
        };
        let members = elements
            .iter()
            .filter(|e| {
                core.contains(e.id.as_str())
                    || e.container_id.as_deref().map_or(false, |c| core.contains(c))
            })
            .map(|e| e.id.clone())
            .collect();

        units.push(AtomicUnit { key, members });
    }

    units
}

/// Every element grouped by its outermost group, bound text alongside its
/// container
pub fn maximum_groups(elements: &[Element]) -> Vec<Vec<&Element>> {
    let by_id: HashMap<&str, &Element> = elements.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Element>> = HashMap::new();

    for element in elements {
        if element.container_id.is_some() {
            continue;
        }
        let key = element.outermost_group_id().unwrap_or(element.id.as_str());
        let members = groups.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if let Some(text) = element.bound_text_id().and_then(|id| by_id.get(id).copied()) {
            members.push(text);
        }
        members.push(element);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(key))
        .collect()
}

/// Whether one group contains every given element
pub fn elements_are_in_same_group(elements: &[&Element]) -> bool {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut max = 0;
    for group_id in elements.iter().flat_map(|element| element.group_ids.iter()) {
        let count = counts.entry(group_id.as_str()).or_default();
        *count += 1;
        max = max.max(*count);
    }
    max == elements.len()
}
