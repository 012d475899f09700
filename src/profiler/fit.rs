//! Growth-curve fitting
//!
//! Every recognized class is fitted as `y ≈ c · f(n)` by least squares in log
//! space, i.e. on `ln y − ln f(n)` with `ln c` as the fitted constant. Each
//! input size therefore weighs the same regardless of magnitude, and
//! `O(2^n)` never overflows.
//!
//! The residual of a candidate is the mean squared log deviation after the
//! constant is fitted. The candidate with the smallest residual wins; when
//! others are within [`TIE_TOLERANCE`] of it the asymptotically smallest one
//! is chosen instead, so ambiguous data never overclaims.

use serde::{Deserialize, Serialize};

use super::{validate_sizes, SampleMeasurement};
use crate::{ComplexityClass, Error, Result};

/// Relative residual window inside which candidates count as tied.
pub const TIE_TOLERANCE: f64 = 0.01;

/// Smallest elapsed time distinguished from zero (1 ps).
///
/// Batched per-execution averages of constant-time operations sit well
/// below a nanosecond.
const TIME_FLOOR_SECS: f64 = 1e-12;

/// Smallest peak memory distinguished from zero (1 byte).
const MEMORY_FLOOR_BYTES: f64 = 1.0;

/// Which measured quantity a fit describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Elapsed wall-clock time
    Time,
    /// Peak auxiliary memory
    Memory,
}

impl Metric {
    #[allow(clippy::cast_precision_loss)]
    fn value(self, sample: &SampleMeasurement) -> f64 {
        match self {
            Self::Time => sample.elapsed_time().max(TIME_FLOOR_SECS),
            Self::Memory => (sample.peak_memory() as f64).max(MEMORY_FLOOR_BYTES),
        }
    }
}

/// Residual of one candidate class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateResidual {
    /// Candidate class
    pub class: ComplexityClass,
    /// Mean squared log-space residual
    pub residual: f64,
}

/// Complexity class inferred from a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalFit {
    operation: String,
    metric: Metric,
    fitted_class: ComplexityClass,
    confidence: f64,
    residuals: Vec<CandidateResidual>,
}

impl EmpiricalFit {
    /// Create a fit directly, e.g. from an external estimator.
    ///
    /// `confidence` is clamped to `[0, 1]`; NaN becomes 0.
    #[must_use]
    pub fn new(operation: impl Into<String>, fitted_class: ComplexityClass, confidence: f64) -> Self {
        Self {
            operation: operation.into(),
            metric: Metric::Time,
            fitted_class,
            confidence: clamp_unit(confidence),
            residuals: Vec::new(),
        }
    }

    /// Set the metric this fit describes.
    #[must_use]
    pub const fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Get the operation the profile belongs to.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Get the metric that was fitted.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Get the fitted class.
    #[must_use]
    pub const fn fitted_class(&self) -> ComplexityClass {
        self.fitted_class
    }

    /// Get the confidence in `[0, 1]`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Get per-candidate residuals, smallest class first.
    #[must_use]
    pub fn residuals(&self) -> &[CandidateResidual] {
        &self.residuals
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Fit elapsed time against the recognized classes.
///
/// # Errors
///
/// As [`fit_metric`].
pub fn fit(operation: &str, samples: &[SampleMeasurement]) -> Result<EmpiricalFit> {
    fit_metric(operation, samples, Metric::Time)
}

/// Fit peak memory against the recognized classes.
///
/// # Errors
///
/// As [`fit_metric`].
pub fn fit_memory(operation: &str, samples: &[SampleMeasurement]) -> Result<EmpiricalFit> {
    fit_metric(operation, samples, Metric::Memory)
}

/// Fit any metric against the recognized classes.
///
/// # Errors
///
/// Returns [`Error::InsufficientSamples`] when the samples cover fewer than
/// four distinct input sizes, and [`Error::InvalidInput`] when their sizes
/// are not positive and strictly increasing.
#[allow(clippy::cast_precision_loss)]
pub fn fit_metric(operation: &str, samples: &[SampleMeasurement], metric: Metric) -> Result<EmpiricalFit> {
    let sizes: Vec<usize> = samples.iter().map(SampleMeasurement::input_size).collect();
    validate_sizes(&sizes)?;

    let log_y: Vec<f64> = samples.iter().map(|s| metric.value(s).ln()).collect();
    let k = samples.len() as f64;

    let residuals: Vec<CandidateResidual> = ComplexityClass::ALL
        .iter()
        .map(|&class| {
            let deviations: Vec<f64> = samples
                .iter()
                .zip(&log_y)
                .map(|(s, ly)| ly - class.log_growth(s.input_size()))
                .collect();
            let log_c = deviations.iter().sum::<f64>() / k;
            let residual = deviations.iter().map(|d| (d - log_c).powi(2)).sum::<f64>() / k;
            CandidateResidual { class, residual }
        })
        .filter(|c| c.residual.is_finite())
        .collect();

    let (chosen, confidence) = select(&residuals);

    tracing::debug!(
        operation,
        ?metric,
        fitted = %chosen.class,
        confidence,
        "fitted growth curve"
    );

    Ok(EmpiricalFit {
        operation: operation.to_string(),
        metric,
        fitted_class: chosen.class,
        confidence,
        residuals,
    })
}

/// Pick the winning class from residuals given in class order, and its
/// confidence against the best other candidate.
fn select(residuals: &[CandidateResidual]) -> (CandidateResidual, f64) {
    let best = residuals
        .iter()
        .map(|c| c.residual)
        .fold(f64::INFINITY, f64::min);

    // Residuals are in class order, so the first within tolerance is the smallest class.
    let chosen = residuals
        .iter()
        .find(|c| c.residual <= best * (1.0 + TIE_TOLERANCE))
        .copied()
        .unwrap_or(CandidateResidual {
            class: ComplexityClass::Constant,
            residual: 0.0,
        });

    let runner_up = residuals
        .iter()
        .filter(|c| c.class != chosen.class)
        .map(|c| c.residual)
        .fold(f64::INFINITY, f64::min);

    let confidence = if runner_up.is_infinite() {
        1.0
    } else if runner_up <= 0.0 {
        0.0
    } else {
        clamp_unit(1.0 - chosen.residual / runner_up)
    };
    (chosen, confidence)
}
