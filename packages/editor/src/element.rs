//! # Canvas Elements
//!
//! The subset of a drawable element the ordering subsystem reads: identity,
//! order key, group membership, frame membership, container/bound-text
//! links and the soft-delete flag. Geometry and styling live elsewhere.
//!
//! `group_ids` are ordered innermost first, outermost last:
//!
//! ```text
//! group_ids = ["inner", "middle", "outer"]
//! ```

use serde::{Deserialize, Serialize};
use tessera_fractional_index::{OrderKey, OrderedItem};

pub type ElementId = String;
pub type GroupId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Diamond,
    Line,
    Arrow,
    Text,
    Image,
    Frame,
    MagicFrame,
}

impl ElementKind {
    pub fn is_frame_like(self) -> bool {
        matches!(self, ElementKind::Frame | ElementKind::MagicFrame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundElementKind {
    Text,
    Arrow,
}

/// Back-reference from a container to something bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: ElementId,

    #[serde(rename = "type")]
    pub kind: BoundElementKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,

    #[serde(rename = "type")]
    pub kind: ElementKind,

    /// Written only by the enforcer or when restoring persisted data
    #[serde(rename = "index", default)]
    order_key: Option<OrderKey>,

    /// Innermost group first
    #[serde(default)]
    pub group_ids: Vec<GroupId>,

    #[serde(default)]
    pub frame_id: Option<ElementId>,

    /// Set on text bound to a container
    #[serde(default)]
    pub container_id: Option<ElementId>,

    #[serde(default)]
    pub bound_elements: Vec<BoundElement>,

    #[serde(default)]
    pub is_deleted: bool,

    /// Bumped on every change, including key rewrites
    #[serde(default)]
    pub version: u64,
}

impl Element {
    /// New unkeyed element. It receives a key on first insertion.
    pub fn new(id: impl Into<ElementId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            order_key: None,
            group_ids: Vec::new(),
            frame_id: None,
            container_id: None,
            bound_elements: Vec::new(),
            is_deleted: false,
            version: 1,
        }
    }

    pub fn rectangle(id: impl Into<ElementId>) -> Self {
        Self::new(id, ElementKind::Rectangle)
    }

    pub fn text(id: impl Into<ElementId>) -> Self {
        Self::new(id, ElementKind::Text)
    }

    pub fn frame(id: impl Into<ElementId>) -> Self {
        Self::new(id, ElementKind::Frame)
    }

    /// Restore a persisted key (import, collaboration)
    pub fn with_order_key(mut self, key: OrderKey) -> Self {
        self.order_key = Some(key);
        self
    }

    /// Groups, innermost first
    pub fn with_group_ids<I, S>(mut self, group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<GroupId>,
    {
        self.group_ids = group_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_frame(mut self, frame_id: impl Into<ElementId>) -> Self {
        self.frame_id = Some(frame_id.into());
        self
    }

    /// Mark as text bound to `container_id`
    pub fn bound_to(mut self, container_id: impl Into<ElementId>) -> Self {
        self.container_id = Some(container_id.into());
        self
    }

    pub fn with_bound_text(mut self, text_id: impl Into<ElementId>) -> Self {
        self.bound_elements.push(BoundElement {
            id: text_id.into(),
            kind: BoundElementKind::Text,
        });
        self
    }

    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    pub fn order_key(&self) -> Option<&OrderKey> {
        self.order_key.as_ref()
    }

    pub fn is_frame_like(&self) -> bool {
        self.kind.is_frame_like()
    }

    pub fn in_group(&self, group_id: &str) -> bool {
        self.group_ids.iter().any(|id| id == group_id)
    }

    /// Outermost group, if any
    pub fn outermost_group_id(&self) -> Option<&str> {
        self.group_ids.last().map(String::as_str)
    }

    /// Id of the text bound to this container
    pub fn bound_text_id(&self) -> Option<&str> {
        self.bound_elements
            .iter()
            .find(|bound| bound.kind == BoundElementKind::Text)
            .map(|bound| bound.id.as_str())
    }

    pub(crate) fn restore_order_key(&mut self, key: Option<OrderKey>) {
        self.order_key = key;
    }
}

impl OrderedItem for Element {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> Option<&OrderKey> {
        self.order_key.as_ref()
    }

    fn set_order_key(&mut self, key: OrderKey) {
        self.order_key = Some(key);
        self.version += 1;
    }
}
