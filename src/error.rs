//! Error types for complexity-validator
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::fmt;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Complexity-validator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed claim source or claim entry
    #[error("Schema error in {entry}: {message}")]
    Schema {
        /// Entry location (operation name or array index)
        entry: String,
        /// What is wrong with the entry
        message: String,
    },

    /// Complexity symbol outside the recognized set
    #[error("Unknown complexity class {symbol:?} for {field} of {operation:?}\nRecognized classes: O(1), O(log n), O(n), O(n log n), O(n^2), O(n^3), O(2^n)")]
    UnknownComplexityClass {
        /// Operation the symbol was declared for
        operation: String,
        /// Field carrying the symbol (`time_complexity` or `space_complexity`)
        field: String,
        /// The rejected symbol
        symbol: String,
    },

    /// Two entries declare the same operation
    #[error("Duplicate operation {0:?}: each operation may be claimed only once per source")]
    DuplicateOperation(String),

    /// One or more claim entries failed to load
    #[error("{0}")]
    ClaimLoad(LoadErrors),

    /// Reference implementation failed while being profiled
    #[error("Execution of {operation:?} failed at input size {input_size}: {message}")]
    Execution {
        /// Operation being profiled
        operation: String,
        /// Input size of the failing trial
        input_size: usize,
        /// Failure reported by the reference (error or panic payload)
        message: String,
    },

    /// Not enough distinct input sizes to discriminate growth curves
    #[error("Insufficient samples: got {got} distinct input sizes, need at least {required}\nWiden the configured input sizes")]
    InsufficientSamples {
        /// Distinct sizes supplied
        got: usize,
        /// Minimum required
        required: usize,
    },

    /// Invalid caller input (sizes, thresholds, operation filters)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Profiling deadline passed before the operation finished
    #[error("Profiling of {0:?} timed out")]
    TimedOut(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Individual entry errors when this is a batched load failure.
    #[must_use]
    pub fn load_errors(&self) -> &[Self] {
        match self {
            Self::ClaimLoad(errors) => errors.as_slice(),
            _ => &[],
        }
    }
}

/// Every entry error collected while loading one claim source.
#[derive(Debug, Default)]
pub struct LoadErrors(Vec<Error>);

impl LoadErrors {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an entry error.
    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    /// Check if no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the recorded errors.
    #[must_use]
    pub fn as_slice(&self) -> &[Error] {
        &self.0
    }

    /// Convert into `Ok(value)` when empty, otherwise a `ClaimLoad` error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClaimLoad`] if any error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(Error::ClaimLoad(self))
        }
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} claim entr", self.0.len())?;
        f.write_str(if self.0.len() == 1 { "y" } else { "ies" })?;
        f.write_str(" failed to load")?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}
