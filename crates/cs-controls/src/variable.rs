//! Named, shared Q31 parameters.
//!
//! Variables are plain tunables (limits, trims, feed-forward terms) that any
//! thread may read or write. Each value is a single atomic cell.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use cs_core::Q31;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ControlError, ControlResult};

#[derive(Debug)]
pub struct Variable {
    name: String,
    value: AtomicI32,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Q31 {
        Q31::from_bits(self.value.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: Q31) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Point-in-time copy of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSnapshot {
    #[serde(rename = "nm")]
    pub name: String,
    pub value: Q31,
}

/// Registration-ordered set of variables.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    variables: Vec<Arc<Variable>>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable holding `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::DuplicateName`] if `name` is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        initial: Q31,
    ) -> ControlResult<Arc<Variable>> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ControlError::DuplicateName { name });
        }

        let variable = Arc::new(Variable {
            name,
            value: AtomicI32::new(initial.to_bits()),
        });
        debug!(name = variable.name(), %initial, "variable registered");
        self.variables.push(Arc::clone(&variable));
        Ok(variable)
    }

    pub fn enumerate(&self) -> impl Iterator<Item = &Arc<Variable>> {
        self.variables.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Variable>> {
        self.variables.iter().find(|variable| variable.name() == name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn snapshot(&self) -> Vec<VariableSnapshot> {
        self.variables
            .iter()
            .map(|variable| VariableSnapshot {
                name: variable.name().to_string(),
                value: variable.get(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_through_any_handle() {
        let mut registry = VariableRegistry::new();
        let limit = registry.register("limit", Q31::from_bits(100)).unwrap();
        assert_eq!(limit.get(), Q31::from_bits(100));

        registry.get("limit").unwrap().set(Q31::from_bits(-5));
        assert_eq!(limit.get(), Q31::from_bits(-5));
        assert_eq!(limit.name(), "limit");
    }

    #[test]
    fn enumerates_in_registration_order() {
        let mut registry = VariableRegistry::new();
        for name in ["b", "a", "c"] {
            registry.register(name, Q31::ZERO).unwrap();
        }
        let names: Vec<_> = registry.enumerate().map(|v| v.name()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = VariableRegistry::new();
        registry.register("trim", Q31::from_bits(1)).unwrap();
        assert!(matches!(
            registry.register("trim", Q31::from_bits(2)),
            Err(ControlError::DuplicateName { .. })
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("trim").unwrap().get(), Q31::from_bits(1));
    }

    #[test]
    fn snapshot_serializes() {
        let mut registry = VariableRegistry::new();
        registry.register("gain", Q31::MAX).unwrap();
        let snapshot = registry.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json[0]["nm"], "gain");
        assert!(json[0].get("value").is_some());

        let back: Vec<VariableSnapshot> = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back[0].value, Q31::MAX);
    }

    #[test]
    fn concurrent_writers_leave_a_written_value() {
        let mut registry = VariableRegistry::new();
        let shared = registry.register("shared", Q31::ZERO).unwrap();

        std::thread::scope(|scope| {
            for writer in 1..=4 {
                let shared = Arc::clone(&shared);
                scope.spawn(move || {
                    for _ in 0..100 {
                        shared.set(Q31::from_bits(writer));
                    }
                });
            }
        });

        assert!((1..=4).contains(&shared.get().to_bits()));
    }
}
