//! Reference implementations and their registry
//!
//! A [`Reference`] pairs a deterministic input constructor with the operation
//! under test. The profiler builds a fresh input for every trial and times
//! only the operation, never the construction or the teardown of the input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of one execution of a reference operation.
pub type ExecutionResult = std::result::Result<(), String>;

/// Prepared trial: the input is already built, calling runs the operation once.
pub(crate) type Job = Box<dyn FnMut() -> ExecutionResult>;

type Prepare = Box<dyn Fn(usize) -> Job + Send + Sync>;

/// Executable reference implementation of one operation.
pub struct Reference {
    prepare: Prepare,
    description: Option<String>,
    repeatable: bool,
    input_sizes: Option<Vec<usize>>,
}

impl Reference {
    /// Create a reference whose operation cannot fail.
    ///
    /// # Arguments
    ///
    /// * `build` - Deterministic input constructor for a given size
    /// * `operation` - The operation to time, run once per trial
    ///
    /// # Example
    ///
    /// ```rust
    /// use complexity_validator::profiler::Reference;
    ///
    /// let linear_scan = Reference::new(
    ///     |n| (0..n as u64).collect::<Vec<u64>>(),
    ///     |input| {
    ///         std::hint::black_box(input.iter().sum::<u64>());
    ///     },
    /// );
    /// ```
    #[must_use]
    pub fn new<T, B, F>(build: B, operation: F) -> Self
    where
        T: 'static,
        B: Fn(usize) -> T + Send + Sync + 'static,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        Self::fallible(build, move |input| {
            operation(input);
            Ok(())
        })
    }

    /// Create a reference whose operation reports failure through `Err`.
    #[must_use]
    pub fn fallible<T, B, F>(build: B, operation: F) -> Self
    where
        T: 'static,
        B: Fn(usize) -> T + Send + Sync + 'static,
        F: Fn(&mut T) -> ExecutionResult + Send + Sync + 'static,
    {
        let operation = Arc::new(operation);
        Self {
            prepare: Box::new(move |size| {
                let mut input = build(size);
                let operation = Arc::clone(&operation);
                Box::new(move || operation(&mut input))
            }),
            description: None,
            repeatable: false,
            input_sizes: None,
        }
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare that the operation leaves its input equivalent to how it found it.
    ///
    /// The profiler may then time a calibrated batch of executions on one
    /// input and divide, which is what makes nanosecond operations measurable.
    /// Operations that consume or reorder their input (sorting, draining)
    /// must not be marked repeatable.
    ///
    /// ```rust
    /// use complexity_validator::profiler::Reference;
    ///
    /// let pop = Reference::new(
    ///     |n| vec![0u64; n],
    ///     |v| {
    ///         if let Some(last) = v.pop() {
    ///             v.push(last);
    ///         }
    ///     },
    /// )
    /// .repeatable();
    /// assert!(pop.is_repeatable());
    /// ```
    #[must_use]
    pub const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Profile this reference over its own size ladder instead of the run's.
    ///
    /// Used for references too slow for the run's largest sizes, e.g. quadratic sorts.
    #[must_use]
    pub fn input_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.input_sizes = Some(sizes.into());
        self
    }

    /// Check if the operation may run repeatedly on one input.
    #[must_use]
    pub const fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    /// Get the reference's own size ladder, if it has one.
    #[must_use]
    pub fn sizes(&self) -> Option<&[usize]> {
        self.input_sizes.as_deref()
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Build the input for `size` and return the ready-to-run trial.
    pub(crate) fn prepare(&self, size: usize) -> Job {
        (self.prepare)(size)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("description", &self.description)
            .field("repeatable", &self.repeatable)
            .field("input_sizes", &self.input_sizes)
            .finish_non_exhaustive()
    }
}

/// Registry mapping operation ids to reference implementations.
///
/// Supplied by the caller; the validator only reads it.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    references: BTreeMap<String, Reference>,
}

impl ReferenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reference, returning the one it replaced.
    pub fn register(&mut self, operation: impl Into<String>, reference: Reference) -> Option<Reference> {
        self.references.insert(operation.into(), reference)
    }

    /// Builder-style [`ReferenceRegistry::register`].
    #[must_use]
    pub fn with(mut self, operation: impl Into<String>, reference: Reference) -> Self {
        self.register(operation, reference);
        self
    }

    /// Get the reference for an operation.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&Reference> {
        self.references.get(operation)
    }

    /// Check if an operation has a reference.
    #[must_use]
    pub fn contains(&self, operation: &str) -> bool {
        self.references.contains_key(operation)
    }

    /// Number of registered references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Iterate `(operation, reference)` pairs in operation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Reference)> {
        self.references.iter().map(|(name, reference)| (name.as_str(), reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_builds_input_of_requested_size() {
        let reference = Reference::fallible(
            |n| vec![0u8; n],
            |input| {
                if input.len() == 3 {
                    Ok(())
                } else {
                    Err(format!("unexpected length {}", input.len()))
                }
            },
        );
        assert_eq!((reference.prepare(3))(), Ok(()));
        assert!((reference.prepare(4))().is_err());
    }

    #[test]
    fn test_repeatable_and_own_sizes() {
        let plain = Reference::new(|n| n, |_| {});
        assert!(!plain.is_repeatable());
        assert!(plain.sizes().is_none());

        let tuned = Reference::new(|n| n, |_| {})
            .repeatable()
            .input_sizes(vec![10, 20, 40, 80]);
        assert!(tuned.is_repeatable());
        assert_eq!(tuned.sizes(), Some(&[10, 20, 40, 80][..]));
    }

    #[test]
    fn test_prepared_job_runs_repeatedly_on_one_input() {
        let counter = Reference::new(|_| 0u32, |count| *count += 1).repeatable();
        let mut job = counter.prepare(1);
        for _ in 0..5 {
            assert_eq!(job(), Ok(()));
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ReferenceRegistry::new();
        assert!(registry.is_empty());

        let previous = registry.register("noop", Reference::new(|_| (), |_: &mut ()| {}));
        assert!(previous.is_none());
        let registry = registry.with(
            "alpha",
            Reference::new(|_| (), |_: &mut ()| {}).describe("does nothing"),
        );

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("noop"));
        assert_eq!(registry.get("alpha").unwrap().description(), Some("does nothing"));
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "noop"]);
    }
}
