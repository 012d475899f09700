//! Complexity Claim - declared time and space complexity of one operation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ComplexityClass;

/// Complexity Claim pairs an operation with its asserted complexity.
///
/// Claims are created by [`ClaimStore`](super::ClaimStore) during loading,
/// which guarantees the operation name is non-empty and unique within the
/// batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplexityClaim {
    operation: String,
    time_complexity: ComplexityClass,
    space_complexity: ComplexityClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl ComplexityClaim {
    /// Create a new claim without notes or metadata.
    ///
    /// # Arguments
    ///
    /// * `operation` - Operation identifier (unique key)
    /// * `time_complexity` - Declared time complexity
    /// * `space_complexity` - Declared auxiliary space complexity
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        time_complexity: ComplexityClass,
        space_complexity: ComplexityClass,
    ) -> Self {
        Self {
            operation: operation.into(),
            time_complexity,
            space_complexity,
            notes: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Create a builder for constructing a claim with optional fields.
    #[must_use]
    pub fn builder(
        operation: impl Into<String>,
        time_complexity: ComplexityClass,
        space_complexity: ComplexityClass,
    ) -> ComplexityClaimBuilder {
        ComplexityClaimBuilder::new(operation, time_complexity, space_complexity)
    }

    /// Get the operation identifier.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Get the declared time complexity.
    #[must_use]
    pub const fn time_complexity(&self) -> ComplexityClass {
        self.time_complexity
    }

    /// Get the declared space complexity.
    #[must_use]
    pub const fn space_complexity(&self) -> ComplexityClass {
        self.space_complexity
    }

    /// Get the free-form notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Get fields of the source entry that are not part of the claim schema.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Builder for `ComplexityClaim`.
#[derive(Debug)]
pub struct ComplexityClaimBuilder {
    operation: String,
    time_complexity: ComplexityClass,
    space_complexity: ComplexityClass,
    notes: Option<String>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl ComplexityClaimBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        time_complexity: ComplexityClass,
        space_complexity: ComplexityClass,
    ) -> Self {
        Self {
            operation: operation.into(),
            time_complexity,
            space_complexity,
            notes: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach free-form notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach one metadata field.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build the `ComplexityClaim`.
    #[must_use]
    pub fn build(self) -> ComplexityClaim {
        ComplexityClaim {
            operation: self.operation,
            time_complexity: self.time_complexity,
            space_complexity: self.space_complexity,
            notes: self.notes,
            metadata: self.metadata,
        }
    }
}
