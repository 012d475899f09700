//! Validation run coordinator
//!
//! Wires the claim store, profiler and matcher together for one invocation:
//!
//! 1. check the configuration (bad sizes abort before any profiling starts)
//! 2. profile every claimed operation that has a reference implementation
//! 3. fold per-operation failures into `UNVERIFIABLE` results
//! 4. match claims against the fits
//!
//! Failures of one operation never abort the others. Once the overall
//! timeout passes, operations not yet profiled are reported as timed out.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::claims::{ClaimStore, ComplexityClaim};
use crate::matcher::{ComplexityMatcher, UnverifiableReason, VerificationResult, DEFAULT_MIN_CONFIDENCE};
use crate::profiler::{
    fit, fit_memory, memory_tracking_active, EmpiricalFit, EmpiricalProfiler, ProfilerConfig,
    ReferenceRegistry, SampleMeasurement,
};
use crate::{Error, Result};

/// Validation run configuration.
///
/// Deserializable from JSON with every field optional:
///
/// ```rust
/// use complexity_validator::ValidatorConfig;
///
/// let config: ValidatorConfig = serde_json::from_str(
///     r#"{"profiler": {"trials": 5}, "timeout_secs": 30.0}"#,
/// )?;
/// assert_eq!(config.profiler().trial_count(), 5);
/// assert_eq!(config.profiler().sizes().len(), 5);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    profiler: ProfilerConfig,
    min_confidence: f64,
    timeout_secs: Option<f64>,
    parallel: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            profiler: ProfilerConfig::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            timeout_secs: None,
            parallel: false,
        }
    }
}

impl ValidatorConfig {
    /// Set the profiler configuration.
    #[must_use]
    pub fn profiler_config(mut self, profiler: ProfilerConfig) -> Self {
        self.profiler = profiler;
        self
    }

    /// Set the minimum confidence for `CONFIRMED`.
    #[must_use]
    pub const fn min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Set the overall timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    /// Profile unrelated operations on parallel workers.
    ///
    /// Has no effect unless the `parallel` feature is enabled.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Get the profiler configuration.
    #[must_use]
    pub const fn profiler(&self) -> &ProfilerConfig {
        &self.profiler
    }

    /// Get the confidence threshold.
    #[must_use]
    pub const fn confidence_threshold(&self) -> f64 {
        self.min_confidence
    }

    /// Get the overall timeout, if any.
    #[must_use]
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout_secs.and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Check whether parallel profiling was requested.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InsufficientSamples`] for fewer than four distinct sizes
    /// - [`Error::InvalidInput`] for bad sizes, zero trials, a threshold
    ///   outside `[0, 1]` or a negative timeout
    pub fn validate(&self) -> Result<()> {
        self.profiler.validate()?;
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidInput(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if let Some(secs) = self.timeout_secs {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(Error::InvalidInput(format!(
                    "timeout must be a non-negative number of seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything one validation run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRun {
    results: Vec<VerificationResult>,
    time_fits: Vec<EmpiricalFit>,
    space_fits: Vec<EmpiricalFit>,
    samples: BTreeMap<String, Vec<SampleMeasurement>>,
    #[serde(with = "duration_secs")]
    elapsed: Duration,
}

impl ValidationRun {
    /// Get the per-claim results, ordered by operation.
    #[must_use]
    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    /// Take ownership of the results.
    #[must_use]
    pub fn into_results(self) -> Vec<VerificationResult> {
        self.results
    }

    /// Get the time fits of every profiled operation.
    #[must_use]
    pub fn time_fits(&self) -> &[EmpiricalFit] {
        &self.time_fits
    }

    /// Get the memory fits (empty unless the tracking allocator is installed).
    #[must_use]
    pub fn space_fits(&self) -> &[EmpiricalFit] {
        &self.space_fits
    }

    /// Get the raw samples of a profiled operation.
    #[must_use]
    pub fn samples(&self, operation: &str) -> Option<&[SampleMeasurement]> {
        self.samples.get(operation).map(Vec::as_slice)
    }

    /// Get the wall-clock duration of the run.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// Outcome of profiling one operation.
enum Profiled {
    Measured {
        samples: Vec<SampleMeasurement>,
        time: EmpiricalFit,
        space: Option<EmpiricalFit>,
    },
    Failed(UnverifiableReason),
}

/// Runs claims against a reference registry.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    /// Create a validator.
    #[must_use]
    pub const fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate every claim against the registry.
    ///
    /// # Errors
    ///
    /// Only configuration errors are returned (see [`ValidatorConfig::validate`]);
    /// they are detected before any profiling begins. Per-operation failures
    /// become `UNVERIFIABLE` results.
    pub fn run(&self, claims: &ClaimStore, registry: &ReferenceRegistry) -> Result<ValidationRun> {
        self.config.validate()?;

        let started = Instant::now();
        let deadline = self.config.timeout_duration().map(|t| started + t);
        let profiler = EmpiricalProfiler::new(self.config.profiler.clone());
        let track_memory = memory_tracking_active();

        info!(
            claims = claims.len(),
            references = registry.len(),
            track_memory,
            "starting validation run"
        );

        let claimed: Vec<&ComplexityClaim> = claims.iter().collect();
        let outcomes = self.profile_all(&claimed, &profiler, registry, deadline, track_memory);

        let mut time_fits = Vec::new();
        let mut space_fits = Vec::new();
        let mut samples = BTreeMap::new();
        let mut failures = BTreeMap::new();

        for (claim, outcome) in claimed.iter().zip(outcomes) {
            match outcome {
                Profiled::Measured {
                    samples: measured,
                    time,
                    space,
                } => {
                    time_fits.push(time);
                    space_fits.extend(space);
                    samples.insert(claim.operation().to_string(), measured);
                }
                Profiled::Failed(reason) => {
                    failures.insert(claim.operation().to_string(), reason);
                }
            }
        }

        let matcher = ComplexityMatcher::new().min_confidence(self.config.min_confidence);
        let results = matcher.match_with(claims, &time_fits, &space_fits, &failures);
        let elapsed = started.elapsed();

        info!(?elapsed, profiled = time_fits.len(), failed = failures.len(), "validation run finished");

        Ok(ValidationRun {
            results,
            time_fits,
            space_fits,
            samples,
            elapsed,
        })
    }

    fn profile_all(
        &self,
        claimed: &[&ComplexityClaim],
        profiler: &EmpiricalProfiler,
        registry: &ReferenceRegistry,
        deadline: Option<Instant>,
        track_memory: bool,
    ) -> Vec<Profiled> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            use rayon::prelude::*;
            return claimed
                .par_iter()
                .map(|claim| profile_one(claim, profiler, registry, deadline, track_memory))
                .collect();
        }

        #[cfg(not(feature = "parallel"))]
        if self.config.parallel {
            warn!("parallel profiling requested but the `parallel` feature is disabled");
        }

        claimed
            .iter()
            .map(|claim| profile_one(claim, profiler, registry, deadline, track_memory))
            .collect()
    }
}

fn profile_one(
    claim: &ComplexityClaim,
    profiler: &EmpiricalProfiler,
    registry: &ReferenceRegistry,
    deadline: Option<Instant>,
    track_memory: bool,
) -> Profiled {
    let operation = claim.operation();
    let _span = info_span!("profile", operation).entered();

    let Some(reference) = registry.get(operation) else {
        warn!("no reference implementation registered");
        return Profiled::Failed(UnverifiableReason::MissingReference);
    };

    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!("timeout reached before profiling started");
        return Profiled::Failed(UnverifiableReason::TimedOut);
    }

    // A reference's own ladder wins over the run's.
    let sizes = reference.sizes().unwrap_or_else(|| profiler.config().sizes());
    let measured = profiler
        .profile_until(operation, reference, sizes, deadline)
        .and_then(|samples| {
            let time = fit(operation, &samples)?;
            let space = if track_memory {
                Some(fit_memory(operation, &samples)?)
            } else {
                None
            };
            Ok((samples, time, space))
        });

    match measured {
        Ok((samples, time, space)) => {
            info!(
                declared = %claim.time_complexity(),
                observed = %time.fitted_class(),
                confidence = time.confidence(),
                "profiled"
            );
            Profiled::Measured { samples, time, space }
        }
        Err(Error::TimedOut(_)) => {
            warn!("timed out while profiling");
            Profiled::Failed(UnverifiableReason::TimedOut)
        }
        Err(error) => {
            warn!(%error, "profiling failed");
            let message = match error {
                Error::Execution { message, input_size, .. } => format!("{message} (input size {input_size})"),
                other => other.to_string(),
            };
            Profiled::Failed(UnverifiableReason::ExecutionFailed(message))
        }
    }
}
