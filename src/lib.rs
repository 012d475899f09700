//! # Complexity Validator: Empirical Checks for Big-O Claims
//!
//! Declared time and space complexities drift away from what the code
//! actually does. This crate loads complexity claims, profiles reference
//! implementations over increasing input sizes, fits the measurements to a
//! fixed set of growth classes, and reports a verdict per claim.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Genchi Genbutsu**: Verdicts come from measurements, never from the claim
//! - **Jidoka**: A claim source with any bad entry is rejected as a whole
//! - **Poka-Yoke**: Fewer than four distinct input sizes is a configuration error
//! - **Kaizen**: Reports are deterministic and diffable between runs
//!
//! ## Example Usage
//!
//! ```rust
//! use complexity_validator::claims::ClaimStore;
//! use complexity_validator::profiler::{ProfilerConfig, Reference, ReferenceRegistry};
//! use complexity_validator::{Report, Validator, ValidatorConfig, Verdict};
//!
//! let claims = ClaimStore::load_str(
//!     r#"{"vec_index": {"time_complexity": "O(1)", "space_complexity": "O(1)"},
//!         "missing_op": {"time_complexity": "O(n)", "space_complexity": "O(1)"}}"#,
//! )?;
//!
//! let registry = ReferenceRegistry::new().with(
//!     "vec_index",
//!     Reference::new(
//!         |n| vec![0u64; n],
//!         |v| {
//!             std::hint::black_box(v[v.len() - 1]);
//!         },
//!     ),
//! );
//!
//! let config = ValidatorConfig::default()
//!     .profiler_config(ProfilerConfig::default().input_sizes(vec![16, 32, 64, 128]));
//! let run = Validator::new(config).run(&claims, &registry)?;
//!
//! let report = Report::new(run.into_results());
//! assert_eq!(report.results()[0].operation(), "missing_op");
//! assert_eq!(report.results()[0].verdict(), Verdict::Unverifiable);
//! assert_eq!(report.exit_code(), 2);
//! # Ok::<(), complexity_validator::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod builtins;
pub mod claims;
pub mod complexity;
pub mod error;
pub mod matcher;
pub mod profiler;
pub mod report;
pub mod validator;

pub use complexity::ComplexityClass;
pub use error::{Error, Result};
pub use matcher::{ComplexityMatcher, UnverifiableReason, Verdict, VerificationResult};
pub use report::Report;
pub use validator::{ValidationRun, Validator, ValidatorConfig};
