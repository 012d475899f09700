//! Empirical profiler tests against real std operations
//!
//! Genchi Genbutsu: these measure actual code, so assertions stick to
//! properties that hold on any reasonable machine (batched min-of-trials
//! timing, log-space fitting). Memory assertions rely on the tracking
//! allocator installed below.

use std::hint::black_box;

use complexity_validator::builtins;
use complexity_validator::profiler::{
    fit, fit_memory, memory_tracking_active, EmpiricalProfiler, ProfilerConfig, Reference,
    TrackingAllocator,
};
use complexity_validator::{ComplexityClass, Error};

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

const WIDE_SIZES: [usize; 4] = [100, 1_000, 10_000, 100_000];

fn profiler() -> EmpiricalProfiler {
    EmpiricalProfiler::new(ProfilerConfig::default().trials(5))
}

// ============================================================================
// Time fits
// ============================================================================

#[test]
fn test_linear_scan_fits_linear() {
    let scan = Reference::new(
        |n| (0..n as u64).collect::<Vec<u64>>(),
        |v| {
            black_box(v.contains(&black_box(u64::MAX)));
        },
    )
    .repeatable();

    let samples = profiler().profile("linear_scan", &scan, &WIDE_SIZES).unwrap();
    let fit = fit("linear_scan", &samples).unwrap();

    assert_eq!(fit.fitted_class(), ComplexityClass::Linear, "{fit:?}");
    assert!(fit.confidence() >= 0.6, "{fit:?}");
}

#[test]
fn test_constant_lookup_fits_constant() {
    let lookup = Reference::new(
        |n| (0..n as u64).collect::<Vec<u64>>(),
        |v| {
            black_box(v[black_box(v.len() - 1)]);
        },
    )
    .repeatable();

    let samples = profiler().profile("vec_index", &lookup, &WIDE_SIZES).unwrap();
    // Averaged over a batch, a single index is far below a microsecond.
    assert!(samples.iter().all(|s| s.elapsed_time() < 1e-6), "{samples:?}");

    let fit = fit("vec_index", &samples).unwrap();
    assert_eq!(fit.fitted_class(), ComplexityClass::Constant, "{fit:?}");
}

#[test]
fn test_builtin_constant_lookups_fit_constant_on_default_sizes() {
    let registry = builtins::registry();
    let profiler = EmpiricalProfiler::default();
    for name in ["vec_index", "vec_pop"] {
        let reference = registry.get(name).unwrap();
        assert!(reference.is_repeatable(), "{name}");
        let samples = profiler.profile(name, reference, profiler.config().sizes()).unwrap();
        let fit = fit(name, &samples).unwrap();
        assert_eq!(fit.fitted_class(), ComplexityClass::Constant, "{name}: {fit:?}");
    }
}

#[test]
fn test_samples_ordered_by_size() {
    let registry = builtins::registry();
    let samples = profiler()
        .profile("vec_pop", registry.get("vec_pop").unwrap(), &WIDE_SIZES)
        .unwrap();

    let sizes: Vec<usize> = samples.iter().map(|s| s.input_size()).collect();
    assert_eq!(sizes, WIDE_SIZES.to_vec());
    assert!(samples.iter().all(|s| s.elapsed_time() >= 0.0));
}

// ============================================================================
// Memory fits
// ============================================================================

#[test]
fn test_tracking_allocator_is_active() {
    let _warmup = vec![0u8; 16];
    assert!(memory_tracking_active());
}

#[test]
fn test_vec_clone_memory_fits_linear() {
    let registry = builtins::registry();
    let samples = profiler()
        .profile("vec_clone", registry.get("vec_clone").unwrap(), &WIDE_SIZES)
        .unwrap();

    for sample in &samples {
        assert!(sample.peak_memory() >= 8 * sample.input_size() as u64, "{sample:?}");
    }

    let fit = fit_memory("vec_clone", &samples).unwrap();
    assert_eq!(fit.fitted_class(), ComplexityClass::Linear, "{fit:?}");
    assert!(fit.confidence() > 0.9, "{fit:?}");
}

#[test]
fn test_in_place_operation_memory_fits_constant() {
    let registry = builtins::registry();
    let samples = profiler()
        .profile("vec_insert_front", registry.get("vec_insert_front").unwrap(), &WIDE_SIZES)
        .unwrap();

    assert!(samples.iter().all(|s| s.peak_memory() == 0), "{samples:?}");
    let fit = fit_memory("vec_insert_front", &samples).unwrap();
    assert_eq!(fit.fitted_class(), ComplexityClass::Constant);
    assert!((fit.confidence() - 1.0).abs() < f64::EPSILON);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_too_few_sizes_rejected_before_running() {
    let never = Reference::new(|n| n, |_| panic!("must not run"));
    let err = profiler().profile("never", &never, &[10, 20, 30]).unwrap_err();
    assert!(matches!(err, Error::InsufficientSamples { got: 3, required: 4 }));
}

#[test]
fn test_failing_reference_reports_input_size() {
    let failing = Reference::fallible(
        |n| n,
        |n| {
            if *n >= 1_000 {
                Err(format!("refusing {n}"))
            } else {
                Ok(())
            }
        },
    );
    let err = profiler().profile("failing", &failing, &WIDE_SIZES).unwrap_err();
    assert!(matches!(
        err,
        Error::Execution { ref operation, input_size: 1_000, .. } if operation == "failing"
    ));
}
