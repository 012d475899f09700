//! Claim-versus-measurement matching
//!
//! Verdict policy for one claim:
//!
//! - `UNVERIFIABLE` when no fit exists for the operation
//! - `CONFIRMED` when the fitted class equals the declared class and the fit
//!   confidence reaches the threshold (default 0.6)
//! - `SUSPECT` otherwise
//!
//! Matching is a pure function of its inputs; results are ordered by
//! operation name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::claims::ClaimStore;
use crate::profiler::EmpiricalFit;
use crate::ComplexityClass;

/// Default minimum fit confidence for a `CONFIRMED` verdict.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

/// Outcome of comparing a claim with its fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Measurement agrees with the claim
    Confirmed,
    /// Measurement disagrees, or agrees with low confidence
    Suspect,
    /// No measurement available
    Unverifiable,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confirmed => "CONFIRMED",
            Self::Suspect => "SUSPECT",
            Self::Unverifiable => "UNVERIFIABLE",
        })
    }
}

/// Why a claim could not be verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnverifiableReason {
    /// No fit was supplied for the operation
    NotProfiled,
    /// The registry has no reference implementation for the operation
    MissingReference,
    /// The reference implementation failed
    ExecutionFailed(String),
    /// The run's timeout expired before the operation was profiled
    TimedOut,
}

impl fmt::Display for UnverifiableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProfiled => f.write_str("not profiled"),
            Self::MissingReference => f.write_str("no reference implementation"),
            Self::ExecutionFailed(message) => write!(f, "execution failed: {message}"),
            Self::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Space-complexity comparison attached to a result when memory was measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceCheck {
    /// Declared space class
    pub declared: ComplexityClass,
    /// Fitted space class
    pub observed: ComplexityClass,
    /// Fit confidence
    pub confidence: f64,
    /// Same policy as the time verdict
    pub verdict: Verdict,
}

/// Result of validating one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    operation: String,
    declared: ComplexityClass,
    observed: Option<ComplexityClass>,
    confidence: Option<f64>,
    verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<UnverifiableReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    space: Option<SpaceCheck>,
}

impl VerificationResult {
    /// Get the operation.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Get the declared time class.
    #[must_use]
    pub const fn declared(&self) -> ComplexityClass {
        self.declared
    }

    /// Get the fitted time class, if the operation was measured.
    #[must_use]
    pub const fn observed(&self) -> Option<ComplexityClass> {
        self.observed
    }

    /// Get the fit confidence, if the operation was measured.
    #[must_use]
    pub const fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Get the verdict.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Get the reason for an `UNVERIFIABLE` verdict.
    #[must_use]
    pub const fn reason(&self) -> Option<&UnverifiableReason> {
        self.reason.as_ref()
    }

    /// Get the space check, if memory was measured.
    #[must_use]
    pub const fn space(&self) -> Option<&SpaceCheck> {
        self.space.as_ref()
    }
}

/// Compares claims against empirical fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityMatcher {
    min_confidence: f64,
}

impl Default for ComplexityMatcher {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl ComplexityMatcher {
    /// Create a matcher with the default confidence threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum confidence for `CONFIRMED`.
    #[must_use]
    pub const fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Get the confidence threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.min_confidence
    }

    /// Match every claim against its time fit.
    ///
    /// # Example
    ///
    /// ```rust
    /// use complexity_validator::claims::{ClaimStore, ComplexityClaim};
    /// use complexity_validator::matcher::{ComplexityMatcher, Verdict};
    /// use complexity_validator::profiler::EmpiricalFit;
    /// use complexity_validator::ComplexityClass::{Constant, Linear, Quadratic};
    ///
    /// let mut claims = ClaimStore::new();
    /// claims.insert(ComplexityClaim::new("scan", Linear, Constant))?;
    ///
    /// let fits = [EmpiricalFit::new("scan", Quadratic, 0.9)];
    /// let results = ComplexityMatcher::new().match_claims(&claims, &fits);
    /// assert_eq!(results[0].verdict(), Verdict::Suspect);
    /// # Ok::<(), complexity_validator::Error>(())
    /// ```
    #[must_use]
    pub fn match_claims(&self, claims: &ClaimStore, fits: &[EmpiricalFit]) -> Vec<VerificationResult> {
        self.match_with(claims, fits, &[], &BTreeMap::new())
    }

    /// Match claims against time fits, optional memory fits, and recorded
    /// per-operation failures.
    ///
    /// A recorded failure takes precedence over any fit for the same
    /// operation. When several fits name the same operation the last wins.
    #[must_use]
    pub fn match_with(
        &self,
        claims: &ClaimStore,
        time_fits: &[EmpiricalFit],
        space_fits: &[EmpiricalFit],
        failures: &BTreeMap<String, UnverifiableReason>,
    ) -> Vec<VerificationResult> {
        let time_by_op = index(time_fits);
        let space_by_op = index(space_fits);

        claims
            .iter()
            .map(|claim| {
                let operation = claim.operation();
                let declared = claim.time_complexity();

                if let Some(reason) = failures.get(operation) {
                    return unverifiable(operation, declared, reason.clone());
                }

                match time_by_op.get(operation) {
                    Some(fit) => VerificationResult {
                        operation: operation.to_string(),
                        declared,
                        observed: Some(fit.fitted_class()),
                        confidence: Some(fit.confidence()),
                        verdict: self.verdict(declared, fit),
                        reason: None,
                        space: space_by_op.get(operation).map(|space_fit| SpaceCheck {
                            declared: claim.space_complexity(),
                            observed: space_fit.fitted_class(),
                            confidence: space_fit.confidence(),
                            verdict: self.verdict(claim.space_complexity(), space_fit),
                        }),
                    },
                    None => unverifiable(operation, declared, UnverifiableReason::NotProfiled),
                }
            })
            .collect()
    }

    fn verdict(&self, declared: ComplexityClass, fit: &EmpiricalFit) -> Verdict {
        if fit.fitted_class() == declared && fit.confidence() >= self.min_confidence {
            Verdict::Confirmed
        } else {
            Verdict::Suspect
        }
    }
}

fn index(fits: &[EmpiricalFit]) -> BTreeMap<&str, &EmpiricalFit> {
    fits.iter().map(|fit| (fit.operation(), fit)).collect()
}

fn unverifiable(operation: &str, declared: ComplexityClass, reason: UnverifiableReason) -> VerificationResult {
    VerificationResult {
        operation: operation.to_string(),
        declared,
        observed: None,
        confidence: None,
        verdict: Verdict::Unverifiable,
        reason: Some(reason),
        space: None,
    }
}
