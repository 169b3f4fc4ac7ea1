//! # Edit Session
//!
//! One client's view of a scene: the scene itself, the current selection
//! and the group being edited, if any.
//!
//! Z-order commands act on the selection and never change it.

use crate::element::{Element, ElementId, GroupId};
use crate::errors::EditorResult;
use crate::scene::Scene;
use crate::selection::SelectionOptions;
use crate::zindex::ZOrderOp;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug)]
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    pub scene: Scene,

    /// Current selection, element ids
    pub selected_ids: HashSet<ElementId>,

    /// Group entered for editing
    pub editing_group_id: Option<GroupId>,
}

impl EditSession {
    pub fn new(id: impl Into<String>, scene: Scene) -> Self {
        Self {
            id: id.into(),
            scene,
            selected_ids: HashSet::new(),
            editing_group_id: None,
        }
    }

    /// Replace the selection
    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ElementId>,
    {
        self.selected_ids = ids.into_iter().map(Into::into).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected_ids.clear();
    }

    /// Enter a group for editing
    pub fn enter_group(&mut self, group_id: impl Into<GroupId>) {
        self.editing_group_id = Some(group_id.into());
    }

    pub fn exit_group(&mut self) {
        self.editing_group_id = None;
    }

    /// Selected elements with their bound text
    pub fn selected_elements(&self) -> Vec<&Element> {
        let options = SelectionOptions {
            include_bound_text: true,
            include_elements_in_frames: false,
        };
        self.scene.selected_elements(&self.selected_ids, options)
    }

    pub fn bring_forward(&mut self) -> EditorResult<bool> {
        self.reorder(ZOrderOp::BringForward)
    }

    pub fn send_backward(&mut self) -> EditorResult<bool> {
        self.reorder(ZOrderOp::SendBackward)
    }

    pub fn bring_to_front(&mut self) -> EditorResult<bool> {
        self.reorder(ZOrderOp::BringToFront)
    }

    pub fn send_to_back(&mut self) -> EditorResult<bool> {
        self.reorder(ZOrderOp::SendToBack)
    }

    /// Apply `op` to the current selection. Returns whether the scene
    /// changed.
    pub fn reorder(&mut self, op: ZOrderOp) -> EditorResult<bool> {
        let changed = self
            .scene
            .apply_z_order(op, &self.selected_ids, self.editing_group_id.as_deref())?;
        debug!(session = %self.id, op = ?op, changed, "Reordered selection");
        Ok(changed)
    }
}
