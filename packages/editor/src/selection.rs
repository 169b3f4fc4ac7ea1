//! Selected element lookup

use crate::element::{Element, ElementId};
use crate::groups::resolve_atomic_units;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SelectionOptions {
    /// Include text bound to a selected container
    pub include_bound_text: bool,

    /// Include the children of selected frames, placed before the frame
    pub include_elements_in_frames: bool,
}

/// Selected elements in sequence order
pub fn selected_elements<'a>(
    elements: &'a [Element],
    selected_ids: &HashSet<ElementId>,
    options: SelectionOptions,
) -> Vec<&'a Element> {
    selected_positions(elements, selected_ids, options)
        .into_iter()
        .map(|index| &elements[index])
        .collect()
}

pub(crate) fn selected_positions(
    elements: &[Element],
    selected_ids: &HashSet<ElementId>,
    options: SelectionOptions,
) -> Vec<usize> {
    let mut added = HashSet::new();
    let mut selected = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        let bound_to_selected = options.include_bound_text
            && element
                .container_id
                .as_ref()
                .map_or(false, |container_id| selected_ids.contains(container_id));
        if selected_ids.contains(&element.id) || bound_to_selected {
            selected.push(index);
            added.insert(index);
        }
    }

    if !options.include_elements_in_frames {
        return selected;
    }

    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, element) in elements.iter().enumerate() {
        if let Some(frame_id) = element.frame_id.as_deref() {
            children.entry(frame_id).or_default().push(index);
        }
    }

    let mut with_children = Vec::with_capacity(selected.len());
    for index in selected {
        let element = &elements[index];
        if element.is_frame_like() {
            let frame_children = children.get(element.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            with_children.extend(frame_children.iter().filter(|child| !added.contains(*child)));
        }
        with_children.push(index);
    }
    with_children
}

/// Ids that a reorder of `selected_ids` has to move.
///
/// Selected bound text pulls in its container, selected elements pull in
/// their effective group, containers pull in their bound text and frames
/// pull in their children.
pub fn elements_to_reorder(
    elements: &[Element],
    selected_ids: &HashSet<ElementId>,
    editing_group_id: Option<&str>,
) -> HashSet<ElementId> {
    let members: HashSet<ElementId> = resolve_atomic_units(elements, selected_ids, editing_group_id)
        .into_iter()
        .flat_map(|unit| unit.members)
        .collect();

    let options = SelectionOptions {
        include_bound_text: true,
        include_elements_in_frames: true,
    };
    selected_positions(elements, &members, options)
        .into_iter()
        .map(|index| elements[index].id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> HashSet<ElementId> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn names(elements: &[&Element]) -> Vec<String> {
        elements.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_selected_elements_plain() {
        let elements = vec![
            Element::rectangle("A"),
            Element::rectangle("B").with_bound_text("T"),
            Element::text("T").bound_to("B"),
        ];
        let selected = selected_elements(&elements, &ids(&["B"]), SelectionOptions::default());
        assert_eq!(names(&selected), ["B"]);

        let options = SelectionOptions {
            include_bound_text: true,
            ..Default::default()
        };
        let selected = selected_elements(&elements, &ids(&["B"]), options);
        assert_eq!(names(&selected), ["B", "T"]);
    }

    #[test]
    fn test_frame_children_come_before_frame() {
        let elements = vec![
            Element::frame("F"),
            Element::rectangle("C1").in_frame("F"),
            Element::rectangle("C2").in_frame("F").deleted(),
        ];
        let options = SelectionOptions {
            include_elements_in_frames: true,
            ..Default::default()
        };
        let selected = selected_elements(&elements, &ids(&["F"]), options);
        assert_eq!(names(&selected), ["C1", "C2", "F"]);
    }

    #[test]
    fn test_elements_to_reorder_expands_everything() {
        let elements = vec![
            Element::rectangle("A").with_group_ids(["g1"]),
            Element::rectangle("B").with_group_ids(["g1"]).with_bound_text("T"),
            Element::text("T").bound_to("B").with_group_ids(["g1"]),
            Element::rectangle("C1").in_frame("F"),
            Element::frame("F"),
            Element::rectangle("X"),
        ];

        assert_eq!(elements_to_reorder(&elements, &ids(&["A"]), None), ids(&["A", "B", "T"]));
        assert_eq!(elements_to_reorder(&elements, &ids(&["F"]), None), ids(&["C1", "F"]));
        assert_eq!(elements_to_reorder(&elements, &ids(&["X", "gone"]), None), ids(&["X"]));
    }

    #[test]
    fn test_selected_bound_text_pulls_in_container() {
        let elements = vec![
            Element::rectangle("B").with_bound_text("T"),
            Element::text("T").bound_to("B"),
        ];
        assert_eq!(elements_to_reorder(&elements, &ids(&["T"]), None), ids(&["B", "T"]));
    }

    #[test]
    fn test_elements_to_reorder_uses_units_of_edited_group() {
        let elements = vec![
            Element::rectangle("A").with_group_ids(["g2", "g1"]),
            Element::rectangle("B").with_group_ids(["g2", "g1"]),
            Element::rectangle("C").with_group_ids(["g1"]),
            Element::rectangle("D").with_bound_text("T").deleted(),
            Element::text("T").bound_to("D"),
        ];

        assert_eq!(elements_to_reorder(&elements, &ids(&["A"]), Some("g1")), ids(&["A", "B"]));
        assert_eq!(elements_to_reorder(&elements, &ids(&["A"]), None), ids(&["A", "B", "C"]));
        assert_eq!(elements_to_reorder(&elements, &ids(&["T"]), None), ids(&["T"]));
    }
}
