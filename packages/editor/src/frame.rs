//! # Frames
//!
//! Frame membership helpers. In a normalized sequence a frame's children
//! form a contiguous block right before the frame:
//!
//! ```text
//! [ ..., child, child, child, FRAME, ... ]
//! ```
//!
//! A `frame_id` that does not point at a frame-like element is treated as
//! absent.

use crate::element::Element;
use std::borrow::Borrow;
use std::collections::HashSet;

fn as_element<E: Borrow<Element>>(element: &E) -> &Element {
    element.borrow()
}

/// Ids of every frame-like element, deleted or not
pub fn frame_ids<E: Borrow<Element>>(elements: &[E]) -> HashSet<&str> {
    elements
        .iter()
        .map(as_element)
        .filter(|element| element.is_frame_like())
        .map(|element| element.id.as_str())
        .collect()
}

/// The element's frame, if it resolves to a known frame
pub fn resolve_frame_id<'a>(element: &'a Element, frames: &HashSet<&str>) -> Option<&'a str> {
    element
        .frame_id
        .as_deref()
        .filter(|frame_id| frames.contains(frame_id))
}

/// Whether the element is the frame itself or one of its children
pub fn is_of_frame(element: &Element, frame_id: &str) -> bool {
    element.id == frame_id || element.frame_id.as_deref() == Some(frame_id)
}

/// Children of `frame_id` in sequence order, deleted ones included
pub fn frame_children<'a, E: Borrow<Element>>(
    elements: &'a [E],
    frame_id: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    elements
        .iter()
        .map(as_element)
        .filter(move |element| element.frame_id.as_deref() == Some(frame_id))
}

/// First and last position of the frame or any of its children
pub fn contiguous_frame_range<E: Borrow<Element>>(
    elements: &[E],
    frame_id: &str,
) -> Option<(usize, usize)> {
    let first = elements
        .iter()
        .position(|element| is_of_frame(element.borrow(), frame_id))?;
    let last = elements
        .iter()
        .rposition(|element| is_of_frame(element.borrow(), frame_id))?;
    Some((first, last))
}
