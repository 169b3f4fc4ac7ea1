//! # Scene
//!
//! Owns the canonical element sequence and the views derived from it.
//!
//! ```text
//! replace_all(next)
//!     │
//!     ├─ validate (policy)   strict → Err, scene untouched
//!     ├─ repair_all          keys strictly increasing
//!     ├─ rebuild views       id index, non-deleted, frames, frame children
//!     ├─ revision += 1       nonce regenerated, selection cache dropped
//!     └─ notify subscribers  once
//! ```
//!
//! Every mutation funnels through [`Scene::replace_all`]. The installed
//! sequence is an immutable snapshot shared through [`Arc`].

use crate::config::SceneConfig;
use crate::element::{Element, ElementId};
use crate::errors::{EditorError, EditorResult};
use crate::frame::frame_ids;
use crate::selection::{selected_positions, SelectionOptions};
use crate::validation::{validate_sequence, ValidationPolicy};
use crate::zindex::{self, ZOrderOp};
use std::cell::RefCell;
use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use tessera_fractional_index::{repair_all, repair_moved};
use tracing::{debug, instrument, warn};

pub type SubscriptionId = u64;

type Callback = Box<dyn FnMut()>;

struct SelectionCache {
    revision: u64,
    selected_ids: HashSet<ElementId>,
    options: SelectionOptions,
    positions: Arc<[usize]>,
}

pub struct Scene {
    elements: Arc<[Element]>,

    /// Positions of non-deleted elements
    non_deleted: Vec<usize>,
    index_by_id: HashMap<ElementId, usize>,

    /// Positions of frame-like elements, deleted included
    frames: Vec<usize>,
    frame_children: HashMap<ElementId, Vec<usize>>,

    revision: u64,
    nonce: u64,
    nonce_state: RandomState,

    policy: Box<dyn ValidationPolicy>,
    include_bound_text_validation: bool,

    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription: SubscriptionId,

    selection_cache: RefCell<Option<SelectionCache>>,
}

impl Scene {
    /// Empty scene with the default config
    pub fn new() -> Self {
        Self::with_config(&SceneConfig::default())
    }

    pub fn with_config(config: &SceneConfig) -> Self {
        let mut scene = Self::with_policy(config.policy());
        scene.include_bound_text_validation = config.include_bound_text_validation;
        scene
    }

    pub fn with_policy(policy: Box<dyn ValidationPolicy>) -> Self {
        let nonce_state = RandomState::new();
        Self {
            elements: Arc::from(Vec::new()),
            non_deleted: Vec::new(),
            index_by_id: HashMap::new(),
            frames: Vec::new(),
            frame_children: HashMap::new(),
            revision: 0,
            nonce: nonce_state.hash_one(0u64),
            nonce_state,
            policy,
            include_bound_text_validation: true,
            subscribers: Vec::new(),
            next_subscription: 0,
            selection_cache: RefCell::new(None),
        }
    }

    /// Install `elements` as the new canonical sequence.
    ///
    /// Missing or out-of-order keys are repaired before install. With a
    /// strict policy, a sampled sequence with violations is rejected and
    /// the scene is left as it was.
    #[instrument(skip_all, fields(elements = elements.len()))]
    pub fn replace_all(&mut self, mut elements: Vec<Element>) -> EditorResult<()> {
        if self.policy.should_validate() {
            let violations = validate_sequence(&elements, self.include_bound_text_validation);
            if let Some(first) = violations.first() {
                if self.policy.is_strict() {
                    warn!(violations = violations.len(), first = %first, "Rejecting sequence");
                    return Err(EditorError::InvalidOrderKeys { violations });
                }
                warn!(violations = violations.len(), first = %first, "Installing sequence with invalid order keys");
            }
        }

        let report = repair_all(&mut elements);
        if !report.is_noop() {
            debug!(rewritten = report.rewritten.len(), "Repaired order keys");
        }

        self.install(elements);
        Ok(())
    }

    /// Insert one element at `index`
    pub fn insert_at_index(&mut self, element: Element, index: usize) -> EditorResult<()> {
        self.insert_many_at_index(vec![element], index)
    }

    /// Insert a batch at `index`, keying only the inserted elements
    pub fn insert_many_at_index(&mut self, elements: Vec<Element>, index: usize) -> EditorResult<()> {
        if elements.is_empty() {
            return Ok(());
        }
        let len = self.elements.len();
        if index > len {
            return Err(EditorError::IndexOutOfBounds { index, len });
        }

        let moved: HashSet<ElementId> = elements.iter().map(|e| e.id.clone()).collect();
        let mut next = Vec::with_capacity(len + elements.len());
        next.extend_from_slice(&self.elements[..index]);
        next.extend(elements);
        next.extend_from_slice(&self.elements[index..]);

        repair_moved(&mut next, &moved);
        self.replace_all(next)
    }

    /// Insert below the element's frame, or on top when it has none
    pub fn insert_element(&mut self, element: Element) -> EditorResult<()> {
        let index = self.insertion_index(&element);
        self.insert_at_index(element, index)
    }

    /// Insert a batch below the first element's frame, or on top
    pub fn insert_elements(&mut self, elements: Vec<Element>) -> EditorResult<()> {
        let Some(first) = elements.first() else {
            return Ok(());
        };
        let index = self.insertion_index(first);
        self.insert_many_at_index(elements, index)
    }

    fn insertion_index(&self, element: &Element) -> usize {
        element
            .frame_id
            .as_deref()
            .and_then(|frame_id| self.element_index(frame_id))
            .unwrap_or(self.elements.len())
    }

    /// Replace every element `f` returns a new value for. Returns whether
    /// anything changed.
    pub fn map_elements<F>(&mut self, mut f: F) -> EditorResult<bool>
    where
        F: FnMut(&Element) -> Option<Element>,
    {
        let mut changed = false;
        let next: Vec<Element> = self
            .elements
            .iter()
            .map(|element| match f(element) {
                Some(replacement) => {
                    changed = true;
                    replacement
                }
                None => element.clone(),
            })
            .collect();

        if changed {
            self.replace_all(next)?;
        }
        Ok(changed)
    }

    /// Edit one element in place. Its order key is kept.
    pub fn mutate_element<F>(&mut self, id: &str, f: F) -> EditorResult<()>
    where
        F: FnOnce(&mut Element),
    {
        let index = self
            .element_index(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;

        let mut next = self.elements.to_vec();
        let key = next[index].order_key().cloned();
        f(&mut next[index]);
        let element = &mut next[index];
        element.restore_order_key(key);
        element.version += 1;

        self.replace_all(next)
    }

    /// Apply a z-order operation. Returns whether the sequence changed.
    pub fn apply_z_order(
        &mut self,
        op: ZOrderOp,
        selected_ids: &HashSet<ElementId>,
        editing_group_id: Option<&str>,
    ) -> EditorResult<bool> {
        let result = zindex::apply(op, &self.elements, selected_ids, editing_group_id);
        if result.changed {
            self.replace_all(result.elements)?;
        }
        Ok(result.changed)
    }

    /// Drop all elements, views and subscribers
    pub fn destroy(&mut self) {
        self.elements = Arc::from(Vec::new());
        self.non_deleted.clear();
        self.index_by_id.clear();
        self.frames.clear();
        self.frame_children.clear();
        self.subscribers.clear();
        self.selection_cache.replace(None);
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut() + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscription, _)| *subscription != id);
        self.subscribers.len() != before
    }

    /// Full sequence, deleted elements included
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn snapshot(&self) -> Arc<[Element]> {
        Arc::clone(&self.elements)
    }

    pub fn non_deleted_elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.non_deleted.iter().map(|&index| &self.elements[index])
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.element_index(id).map(|index| &self.elements[index])
    }

    pub fn non_deleted_element(&self, id: &str) -> Option<&Element> {
        self.element(id).filter(|element| !element.is_deleted)
    }

    pub fn element_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Container of a bound text element
    pub fn container_element(&self, element: &Element) -> Option<&Element> {
        element
            .container_id
            .as_deref()
            .and_then(|container_id| self.element(container_id))
    }

    /// The non-deleted element with this id, or else the non-deleted
    /// members of the group with this id
    pub fn elements_from_id(&self, id: &str) -> Vec<&Element> {
        if let Some(element) = self.non_deleted_element(id) {
            return vec![element];
        }
        self.non_deleted_elements()
            .filter(|element| element.in_group(id))
            .collect()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Element> + '_ {
        self.frames.iter().map(|&index| &self.elements[index])
    }

    pub fn non_deleted_frames(&self) -> impl Iterator<Item = &Element> + '_ {
        self.frames().filter(|frame| !frame.is_deleted)
    }

    /// Elements whose frame id is `frame_id`, in sequence order
    pub fn frame_children(&self, frame_id: &str) -> impl Iterator<Item = &Element> + '_ {
        self.frame_children
            .get(frame_id)
            .into_iter()
            .flatten()
            .map(|&index| &self.elements[index])
    }

    /// Selected elements in sequence order. Repeated calls with the same
    /// arguments on the same revision reuse the previous result.
    pub fn selected_elements(
        &self,
        selected_ids: &HashSet<ElementId>,
        options: SelectionOptions,
    ) -> Vec<&Element> {
        self.cached_selection(selected_ids, options)
            .iter()
            .map(|&index| &self.elements[index])
            .collect()
    }

    fn cached_selection(&self, selected_ids: &HashSet<ElementId>, options: SelectionOptions) -> Arc<[usize]> {
        if let Some(cache) = self.selection_cache.borrow().as_ref() {
            if cache.revision == self.revision && cache.options == options && &cache.selected_ids == selected_ids {
                return Arc::clone(&cache.positions);
            }
        }

        let positions: Arc<[usize]> = selected_positions(&self.elements, selected_ids, options).into();
        self.selection_cache.replace(Some(SelectionCache {
            revision: self.revision,
            selected_ids: selected_ids.clone(),
            options,
            positions: Arc::clone(&positions),
        }));
        positions
    }

    /// Changes on every install
    pub fn scene_nonce(&self) -> u64 {
        self.nonce
    }

    /// Number of installs so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn install(&mut self, elements: Vec<Element>) {
        let frames = frame_ids(&elements);

        self.non_deleted.clear();
        self.index_by_id.clear();
        self.frames.clear();
        self.frame_children.clear();
        for (index, element) in elements.iter().enumerate() {
            self.index_by_id.insert(element.id.clone(), index);
            if !element.is_deleted {
                self.non_deleted.push(index);
            }
            if element.is_frame_like() {
                self.frames.push(index);
            }
            if let Some(frame_id) = element.frame_id.as_deref().filter(|id| frames.contains(id)) {
                self.frame_children.entry(frame_id.to_string()).or_default().push(index);
            }
        }

        self.elements = Arc::from(elements);
        self.revision += 1;
        self.nonce = self.nonce_state.hash_one(self.revision);
        self.selection_cache.replace(None);

        debug!(
            revision = self.revision,
            elements = self.elements.len(),
            frames = self.frames.len(),
            "Installed scene"
        );

        for (_, callback) in self.subscribers.iter_mut() {
            callback();
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("elements", &self.elements.len())
            .field("revision", &self.revision)
            .field("policy", &self.policy)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
