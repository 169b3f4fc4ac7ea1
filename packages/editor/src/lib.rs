//! # Tessera Editor
//!
//! Scene store and z-order engine for the Tessera canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ fractional-index: order keys + repair       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Scene lifecycle + z-order           │
//! │  - Install sequences with validation        │
//! │  - Repair keys on every install             │
//! │  - Groups, frames and bound text as units   │
//! │  - Bring forward / send backward / ends     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ renderer / sync: read snapshots + keys      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Sequence is source of truth**: keys always agree with it after install
//! 2. **Minimal rekeying**: only moved or inserted elements get new keys
//! 3. **Units move whole**: groups, frame children and bound text
//! 4. **Snapshots are immutable**: readers hold an `Arc` across edits
//!
//! ## Usage
//!
//! ```rust
//! use tessera_editor::{EditSession, Element, Scene};
//!
//! let mut scene = Scene::new();
//! scene.replace_all(vec![
//!     Element::rectangle("a"),
//!     Element::rectangle("b"),
//! ])?;
//!
//! let mut session = EditSession::new("client-1", scene);
//! session.set_selection(["a"]);
//! session.bring_to_front()?;
//!
//! let order: Vec<&str> = session.scene.elements().iter().map(|e| e.id.as_str()).collect();
//! assert_eq!(order, ["b", "a"]);
//! # Ok::<(), tessera_editor::EditorError>(())
//! ```

mod config;
mod element;
mod errors;
mod frame;
mod groups;
mod scene;
mod selection;
mod session;
mod validation;
mod zindex;

pub use config::{SceneConfig, ValidationMode, DEFAULT_CONFIG_NAME};
pub use element::{BoundElement, BoundElementKind, Element, ElementId, ElementKind, GroupId};
pub use errors::{EditorError, EditorResult};
pub use frame::{contiguous_frame_range, frame_children, frame_ids, is_of_frame, resolve_frame_id};
pub use groups::{
    effective_group_id, elements_are_in_same_group, elements_in_group, maximum_groups,
    resolve_atomic_units, select_groups_for_selected_elements, AtomicUnit, GroupSelection, UnitKey,
};
pub use scene::{Scene, SubscriptionId};
pub use selection::{elements_to_reorder, selected_elements, SelectionOptions};
pub use session::EditSession;
pub use validation::{
    validate_sequence, AlwaysValidate, NeverValidate, SampledValidation, SceneViolation, ValidationPolicy,
};
pub use zindex::{apply as apply_z_order, ZOrderOp, ZOrderResult};

// Re-export order key types for convenience
pub use tessera_fractional_index::{OrderKey, OrderedItem};
