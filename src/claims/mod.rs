//! Complexity claims and the claim store
//!
//! ## Claim Source Format
//!
//! Claims are loaded from JSON in either of two shapes:
//!
//! ```text
//! { "bubble_sort": { "time_complexity": "O(n^2)", "space_complexity": "O(1)" } }
//!
//! [ { "operation": "bubble_sort", "time_complexity": "O(n^2)", "space_complexity": "O(1)" } ]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use complexity_validator::claims::ClaimStore;
//! use complexity_validator::ComplexityClass;
//!
//! let store = ClaimStore::load_str(
//!     r#"{"linear_scan": {"time_complexity": "O(n)", "space_complexity": "O(1)"}}"#,
//! )?;
//!
//! let claim = store.get("linear_scan").unwrap();
//! assert_eq!(claim.time_complexity(), ComplexityClass::Linear);
//! # Ok::<(), complexity_validator::Error>(())
//! ```

mod claim;
mod store;

pub use claim::{ComplexityClaim, ComplexityClaimBuilder};
pub use store::ClaimStore;
