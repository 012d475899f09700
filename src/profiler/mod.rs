//! Empirical profiler
//!
//! Genchi Genbutsu: measure the reference operation, don't trust the docs.
//!
//! For every input size the profiler builds a deterministic input, runs the
//! operation a fixed number of trials, and keeps the fastest trial (the one
//! least disturbed by scheduling noise) together with the largest auxiliary
//! memory peak. Trials of one operation always run serially on the calling
//! thread.
//!
//! A single execution of a lookup takes nanoseconds, well inside timer and
//! scheduler noise. For references marked [`Reference::repeatable`] the
//! profiler first calibrates how many executions make a batch of at least
//! [`MIN_BATCH_TIME`], then times whole batches on one input and records the
//! per-execution average. Other references get one execution per fresh input.
//!
//! ## Usage
//!
//! ```rust
//! use complexity_validator::profiler::{fit, EmpiricalProfiler, Reference};
//!
//! let scan = Reference::new(
//!     |n| vec![1u64; n],
//!     |input| {
//!         std::hint::black_box(input.iter().sum::<u64>());
//!     },
//! );
//!
//! let profiler = EmpiricalProfiler::default();
//! let samples = profiler.profile("linear_scan", &scan, &[64, 128, 256, 512])?;
//! assert_eq!(samples.len(), 4);
//!
//! let fit = fit("linear_scan", &samples)?;
//! assert!((0.0..=1.0).contains(&fit.confidence()));
//! # Ok::<(), complexity_validator::Error>(())
//! ```

mod fit;
mod memory;
mod reference;
mod sample;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use fit::{fit, fit_memory, fit_metric, CandidateResidual, EmpiricalFit, Metric, TIE_TOLERANCE};
pub use memory::{is_active as memory_tracking_active, PeakScope, TrackingAllocator};
pub use reference::{ExecutionResult, Reference, ReferenceRegistry};
use reference::Job;
pub use sample::SampleMeasurement;

use crate::{Error, Result};

/// Minimum number of distinct input sizes needed to tell growth curves apart.
pub const MIN_DISTINCT_SIZES: usize = 4;

/// Default number of trials per input size.
pub const DEFAULT_TRIALS: usize = 3;

/// Default input sizes used when none are configured.
///
/// Three decades in steps of 4x: enough spread for `ln ln n` to move, small
/// enough that linear inputs stay under a megabyte.
pub const DEFAULT_INPUT_SIZES: [usize; 6] = [100, 400, 1_600, 6_400, 25_600, 102_400];

/// Shortest batch a repeatable reference is timed over.
pub const MIN_BATCH_TIME: Duration = Duration::from_micros(50);

/// Upper bound on executions per batch.
pub const MAX_BATCH_ITERATIONS: u64 = 1 << 20;

/// Profiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    trials: usize,
    input_sizes: Vec<usize>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            input_sizes: DEFAULT_INPUT_SIZES.to_vec(),
        }
    }
}

impl ProfilerConfig {
    /// Set the number of trials per input size.
    #[must_use]
    pub const fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Set the input sizes to profile.
    #[must_use]
    pub fn input_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.input_sizes = sizes.into();
        self
    }

    /// Get the number of trials per input size.
    #[must_use]
    pub const fn trial_count(&self) -> usize {
        self.trials
    }

    /// Get the configured input sizes.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.input_sizes
    }

    /// Check trials and input sizes.
    ///
    /// # Errors
    ///
    /// See [`validate_sizes`]; additionally [`Error::InvalidInput`] for zero trials.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::InvalidInput("trials must be greater than 0".to_string()));
        }
        validate_sizes(&self.input_sizes)
    }
}

/// Check that sizes can support curve discrimination.
///
/// # Errors
///
/// Returns [`Error::InsufficientSamples`] for fewer than
/// [`MIN_DISTINCT_SIZES`] distinct sizes, and [`Error::InvalidInput`] if the
/// sizes are not positive and strictly increasing.
pub fn validate_sizes(sizes: &[usize]) -> Result<()> {
    let mut distinct = sizes.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < MIN_DISTINCT_SIZES {
        return Err(Error::InsufficientSamples {
            got: distinct.len(),
            required: MIN_DISTINCT_SIZES,
        });
    }
    if distinct.first() == Some(&0) {
        return Err(Error::InvalidInput("input sizes must be positive".to_string()));
    }
    if sizes.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::InvalidInput(format!(
            "input sizes must be strictly increasing, got {sizes:?}"
        )));
    }
    Ok(())
}

/// Times reference operations over increasing input sizes.
#[derive(Debug, Clone, Default)]
pub struct EmpiricalProfiler {
    config: ProfilerConfig,
}

impl EmpiricalProfiler {
    /// Create a profiler with the given configuration.
    #[must_use]
    pub const fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profile `reference` over `input_sizes`.
    ///
    /// # Errors
    ///
    /// - [`Error::InsufficientSamples`] / [`Error::InvalidInput`] for unusable sizes
    /// - [`Error::Execution`] if the reference returns an error or panics
    pub fn profile(
        &self,
        operation: &str,
        reference: &Reference,
        input_sizes: &[usize],
    ) -> Result<Vec<SampleMeasurement>> {
        self.profile_until(operation, reference, input_sizes, None)
    }

    /// Profile with an optional deadline, checked before calibration and
    /// before every trial.
    ///
    /// # Errors
    ///
    /// As [`EmpiricalProfiler::profile`], plus [`Error::TimedOut`] once the
    /// deadline has passed.
    #[allow(clippy::cast_precision_loss)]
    pub fn profile_until(
        &self,
        operation: &str,
        reference: &Reference,
        input_sizes: &[usize],
        deadline: Option<Instant>,
    ) -> Result<Vec<SampleMeasurement>> {
        if self.config.trials == 0 {
            return Err(Error::InvalidInput("trials must be greater than 0".to_string()));
        }
        validate_sizes(input_sizes)?;

        let mut samples = Vec::with_capacity(input_sizes.len());
        let timed_out = || deadline.is_some_and(|d| Instant::now() >= d);
        for &size in input_sizes {
            if timed_out() {
                return Err(Error::TimedOut(operation.to_string()));
            }
            let iterations = if reference.is_repeatable() {
                calibrate(operation, reference, size)?
            } else {
                1
            };

            let mut fastest = f64::INFINITY;
            let mut peak_memory = 0u64;
            for trial in 0..self.config.trials {
                if timed_out() {
                    return Err(Error::TimedOut(operation.to_string()));
                }
                let (elapsed, peak) = run_trial(operation, reference, size, iterations)?;
                let per_execution = elapsed.as_secs_f64() / iterations as f64;
                trace!(operation, size, trial, iterations, per_execution, peak, "trial");
                fastest = fastest.min(per_execution);
                peak_memory = peak_memory.max(peak);
            }

            let sample = SampleMeasurement::from_secs(size, fastest, peak_memory);
            debug!(
                operation,
                size,
                iterations,
                elapsed_time = sample.elapsed_time(),
                peak_memory,
                "sample"
            );
            samples.push(sample);
        }
        Ok(samples)
    }
}

fn execution_error(operation: &str, size: usize, message: String) -> Error {
    Error::Execution {
        operation: operation.to_string(),
        input_size: size,
        message,
    }
}

fn prepare_job(operation: &str, reference: &Reference, size: usize) -> Result<Job> {
    catch_unwind(AssertUnwindSafe(|| reference.prepare(size))).map_err(|payload| {
        execution_error(
            operation,
            size,
            format!("input construction panicked: {}", panic_message(&*payload)),
        )
    })
}

/// Time `iterations` back-to-back executions on one input and track the
/// memory peak across them.
fn time_batch(operation: &str, size: usize, job: &mut Job, iterations: u64) -> Result<(Duration, u64)> {
    let scope = PeakScope::start();
    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| -> ExecutionResult {
        for _ in 0..iterations {
            job()?;
        }
        Ok(())
    }));
    let elapsed = start.elapsed();
    let peak = scope.finish();

    match outcome {
        Ok(Ok(())) => Ok((elapsed, peak)),
        Ok(Err(message)) => Err(execution_error(operation, size, message)),
        Err(payload) => Err(execution_error(
            operation,
            size,
            format!("panicked: {}", panic_message(&*payload)),
        )),
    }
}

/// Smallest power-of-two execution count whose batch reaches
/// [`MIN_BATCH_TIME`], capped at [`MAX_BATCH_ITERATIONS`].
fn calibrate(operation: &str, reference: &Reference, size: usize) -> Result<u64> {
    let mut job = prepare_job(operation, reference, size)?;
    let mut iterations = 1u64;
    loop {
        let (elapsed, _) = time_batch(operation, size, &mut job, iterations)?;
        if elapsed >= MIN_BATCH_TIME || iterations >= MAX_BATCH_ITERATIONS {
            trace!(operation, size, iterations, ?elapsed, "calibrated");
            return Ok(iterations);
        }
        iterations *= 2;
    }
}

/// Build a fresh input, then time one batch on it.
fn run_trial(operation: &str, reference: &Reference, size: usize, iterations: u64) -> Result<(Duration, u64)> {
    let mut job = prepare_job(operation, reference, size)?;
    let measured = time_batch(operation, size, &mut job, iterations);
    // Input teardown happens outside the timed region.
    drop(job);
    measured
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
