//! # Sequence Validation
//!
//! Checks run by [`Scene::replace_all`](crate::Scene::replace_all) on
//! incoming sequences, and the policies deciding when they run.
//!
//! | Policy               | Validates                   |
//! |----------------------|-----------------------------|
//! | `AlwaysValidate`     | every install               |
//! | `SampledValidation`  | first install, then every n |
//! | `NeverValidate`      | never                       |
//!
//! A strict policy turns violations into errors; otherwise they are logged
//! and repaired.

use crate::element::{Element, ElementId};
use std::collections::HashMap;
use std::fmt;
use tessera_fractional_index::{validate, ValidateOptions, Violation};

/// Decides whether an install is validated
pub trait ValidationPolicy: fmt::Debug {
    /// Called once per install
    fn should_validate(&mut self) -> bool;

    /// Reject installs with violations instead of logging them
    fn is_strict(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValidate {
    pub strict: bool,
}

impl ValidationPolicy for AlwaysValidate {
    fn should_validate(&mut self) -> bool {
        true
    }

    fn is_strict(&self) -> bool {
        self.strict
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverValidate;

impl ValidationPolicy for NeverValidate {
    fn should_validate(&mut self) -> bool {
        false
    }

    fn is_strict(&self) -> bool {
        false
    }
}

/// Validates the first install and then every `every`-th one
#[derive(Debug, Clone)]
pub struct SampledValidation {
    every: u64,
    calls: u64,
    strict: bool,
}

impl SampledValidation {
    pub fn new(every: u32, strict: bool) -> Self {
        Self {
            every: u64::from(every.max(1)),
            calls: 0,
            strict,
        }
    }
}

impl ValidationPolicy for SampledValidation {
    fn should_validate(&mut self) -> bool {
        let sample = self.calls % self.every == 0;
        self.calls += 1;
        sample
    }

    fn is_strict(&self) -> bool {
        self.strict
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneViolation {
    /// Key not above its predecessor's key, or malformed
    Order(Violation),

    /// Bound text keyed at or below its container
    BoundTextBelowContainer {
        text_id: ElementId,
        container_id: ElementId,
    },
}

impl fmt::Display for SceneViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneViolation::Order(violation) => violation.fmt(f),
            SceneViolation::BoundTextBelowContainer {
                text_id,
                container_id,
            } => write!(f, "bound text {text_id} is keyed below its container {container_id}"),
        }
    }
}

/// All violations in `elements`. Unkeyed elements are not violations.
pub fn validate_sequence(elements: &[Element], include_bound_text: bool) -> Vec<SceneViolation> {
    let mut violations: Vec<SceneViolation> = validate(elements, ValidateOptions::default())
        .into_iter()
        .map(SceneViolation::Order)
        .collect();

    if include_bound_text {
        let by_id: HashMap<&str, &Element> = elements.iter().map(|e| (e.id.as_str(), e)).collect();
        for container in elements {
            let Some(text) = container.bound_text_id().and_then(|id| by_id.get(id)) else {
                continue;
            };
            if let (Some(text_key), Some(container_key)) = (text.order_key(), container.order_key()) {
                if text_key <= container_key {
                    violations.push(SceneViolation::BoundTextBelowContainer {
                        text_id: text.id.clone(),
                        container_id: container.id.clone(),
                    });
                }
            }
        }
    }

    violations
}
