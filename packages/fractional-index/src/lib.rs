//! # Tessera Fractional Index
//!
//! Stable, mergeable position keys for ordered sequences of canvas elements.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ key: OrderKey grammar + validation          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ generate: key strictly between two bounds   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: keep key order == array order         │
//! │  - repair_all (full greedy pass)            │
//! │  - repair_moved (moved items only)          │
//! │  - validate (read-only check)               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Array order is the source of truth**: keys follow it, never lead it
//! 2. **Minimal writes**: keys that already fit are never rewritten
//! 3. **Deterministic**: same bounds, same key, on every replica
//!
//! ## Usage
//!
//! ```rust
//! use tessera_fractional_index::key_between;
//!
//! let first = key_between(None, None);
//! let second = key_between(Some(&first), None);
//! let middle = key_between(Some(&first), Some(&second));
//!
//! assert_eq!(first.as_str(), "a0");
//! assert!(first < middle && middle < second);
//! ```

mod error;
mod generate;
mod key;
mod sync;

pub use error::{OrderKeyError, OrderKeyResult};
pub use generate::{key_between, n_keys_between, try_key_between, try_n_keys_between};
pub use key::OrderKey;
pub use sync::{
    order_by_key, repair_all, repair_moved, validate, OrderedItem, RepairReport, ValidateOptions,
    Violation, ViolationKind,
};
