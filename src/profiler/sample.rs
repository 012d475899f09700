//! Sample Measurement - cost of one reference operation at one input size

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Measured cost of an operation at a single input size.
///
/// A profile is a sequence of these ordered by strictly increasing
/// `input_size`. `elapsed_time` is the fastest of the trials run at that size,
/// `peak_memory` the largest auxiliary allocation peak observed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SampleMeasurement {
    input_size: usize,
    elapsed_time: f64,
    peak_memory: u64,
}

impl SampleMeasurement {
    /// Create a new sample.
    ///
    /// # Arguments
    ///
    /// * `input_size` - Size of the input the operation ran on
    /// * `elapsed` - Wall-clock time of the operation
    /// * `peak_memory` - Peak auxiliary bytes allocated by the operation
    #[must_use]
    pub fn new(input_size: usize, elapsed: Duration, peak_memory: u64) -> Self {
        Self {
            input_size,
            elapsed_time: elapsed.as_secs_f64(),
            peak_memory,
        }
    }

    /// Create a sample from a fractional elapsed time in seconds.
    ///
    /// Batched measurements average below the `Duration` resolution, so the
    /// per-execution time is carried as `f64` directly.
    #[must_use]
    pub const fn from_secs(input_size: usize, elapsed_secs: f64, peak_memory: u64) -> Self {
        Self {
            input_size,
            elapsed_time: elapsed_secs,
            peak_memory,
        }
    }

    /// Get the input size.
    #[must_use]
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    /// Get the elapsed time in seconds.
    #[must_use]
    pub const fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Get the peak auxiliary memory in bytes.
    #[must_use]
    pub const fn peak_memory(&self) -> u64 {
        self.peak_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_new() {
        let sample = SampleMeasurement::new(1000, Duration::from_micros(250), 8000);
        assert_eq!(sample.input_size(), 1000);
        assert!((sample.elapsed_time() - 0.000_25).abs() < 1e-12);
        assert_eq!(sample.peak_memory(), 8000);
    }

    #[test]
    fn test_sample_from_secs_keeps_sub_nanosecond_time() {
        let sample = SampleMeasurement::from_secs(100, 4e-10, 0);
        assert!((sample.elapsed_time() - 4e-10).abs() < 1e-20);
    }

    #[test]
    fn test_sample_serialization() {
        let sample = SampleMeasurement::new(10, Duration::from_secs(1), 0);
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"input_size": 10, "elapsed_time": 1.0, "peak_memory": 0})
        );
    }
}
