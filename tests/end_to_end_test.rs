//! End-to-end validation runs: claim source → profiler → matcher → report
//!
//! Uses the builtin reference registry, the same one the CLI runs against.

use std::time::Duration;

use complexity_validator::builtins;
use complexity_validator::claims::ClaimStore;
use complexity_validator::profiler::ProfilerConfig;
use complexity_validator::report::{EXIT_CONFIRMED, EXIT_SUSPECT, EXIT_UNVERIFIABLE};
use complexity_validator::{
    ComplexityClass, Report, UnverifiableReason, Validator, ValidatorConfig, Verdict,
};

fn config(sizes: &[usize]) -> ValidatorConfig {
    ValidatorConfig::default().profiler_config(
        ProfilerConfig::default()
            .trials(3)
            .input_sizes(sizes.to_vec()),
    )
}

#[test]
fn test_understated_bubble_sort_is_suspect() {
    let claims = ClaimStore::load_str(
        r#"{"bubble_sort": {"time_complexity": "O(n)", "space_complexity": "O(1)",
                            "notes": "documented as a single pass"}}"#,
    )
    .unwrap();

    let run = Validator::new(config(&[100, 200, 400, 800, 1_600]))
        .run(&claims, &builtins::registry())
        .unwrap();

    let result = &run.results()[0];
    assert_eq!(result.operation(), "bubble_sort");
    assert_eq!(result.verdict(), Verdict::Suspect);
    assert_eq!(result.observed(), Some(ComplexityClass::Quadratic), "{result:?}");
    // bubble_sort carries its own ladder, which replaces the run's sizes
    let samples = run.samples("bubble_sort").unwrap();
    assert_eq!(samples.len(), 5);
    assert_eq!(samples[0].input_size(), 200);

    let report = Report::new(run.into_results());
    assert_eq!(report.exit_code(), EXIT_SUSPECT);
    assert!(report.to_text().contains("1 claims: 0 confirmed, 1 suspect, 0 unverifiable"));
}

#[test]
fn test_demo_constant_and_linear_claims_confirmed_on_defaults() {
    let claims = ClaimStore::load_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/std_claims.json"))
        .unwrap()
        .restrict(&["vec_index", "vec_pop", "linear_scan"])
        .unwrap();

    let run = Validator::new(ValidatorConfig::default())
        .run(&claims, &builtins::registry())
        .unwrap();

    assert_eq!(run.results().len(), 3);
    for result in run.results() {
        assert_eq!(result.verdict(), Verdict::Confirmed, "{result:?}");
    }
    assert_eq!(Report::new(run.into_results()).exit_code(), EXIT_CONFIRMED);
}

#[test]
fn test_unknown_operation_is_unverifiable() {
    let claims = ClaimStore::load_str(
        r#"[
            {"operation": "vec_pop", "time_complexity": "O(1)", "space_complexity": "O(1)"},
            {"operation": "quantum_sort", "time_complexity": "O(1)", "space_complexity": "O(1)"}
        ]"#,
    )
    .unwrap();

    let run = Validator::new(config(&[100, 1_000, 10_000, 100_000]))
        .run(&claims, &builtins::registry())
        .unwrap();

    let quantum = run
        .results()
        .iter()
        .find(|r| r.operation() == "quantum_sort")
        .unwrap();
    assert_eq!(quantum.verdict(), Verdict::Unverifiable);
    assert_eq!(quantum.reason(), Some(&UnverifiableReason::MissingReference));

    let report = Report::new(run.into_results());
    assert_eq!(report.exit_code(), EXIT_UNVERIFIABLE);
}

#[test]
fn test_restricted_run_only_profiles_selected() {
    let claims = ClaimStore::load_str(
        r#"{
            "vec_index": {"time_complexity": "O(1)", "space_complexity": "O(1)"},
            "bubble_sort": {"time_complexity": "O(n^2)", "space_complexity": "O(1)"}
        }"#,
    )
    .unwrap()
    .restrict(&["vec_index"])
    .unwrap();

    let run = Validator::new(config(&[100, 1_000, 10_000, 100_000]))
        .run(&claims, &builtins::registry())
        .unwrap();

    assert_eq!(run.results().len(), 1);
    assert!(run.samples("bubble_sort").is_none());
    assert_eq!(run.time_fits().len(), 1);
}

#[test]
fn test_parallel_run_matches_serial_shape() {
    let claims = ClaimStore::load_str(
        r#"{
            "vec_index": {"time_complexity": "O(1)", "space_complexity": "O(1)"},
            "vec_pop": {"time_complexity": "O(1)", "space_complexity": "O(1)"},
            "linear_scan": {"time_complexity": "O(n)", "space_complexity": "O(1)"}
        }"#,
    )
    .unwrap();
    let registry = builtins::registry();
    let sizes = [100, 1_000, 10_000, 100_000];

    let serial = Validator::new(config(&sizes)).run(&claims, &registry).unwrap();
    let parallel = Validator::new(config(&sizes).parallel(true))
        .run(&claims, &registry)
        .unwrap();

    let operations = |run: &complexity_validator::ValidationRun| {
        run.results()
            .iter()
            .map(|r| r.operation().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(operations(&serial), operations(&parallel));
    assert!(parallel
        .results()
        .iter()
        .all(|r| r.verdict() != Verdict::Unverifiable));
}

#[test]
fn test_expired_timeout_reports_timed_out() {
    let claims = ClaimStore::load_str(
        r#"{"vec_sort": {"time_complexity": "O(n log n)", "space_complexity": "O(n)"}}"#,
    )
    .unwrap();

    let run = Validator::new(config(&[100, 1_000, 10_000, 100_000]).timeout(Duration::ZERO))
        .run(&claims, &builtins::registry())
        .unwrap();

    assert_eq!(run.results()[0].reason(), Some(&UnverifiableReason::TimedOut));
}

#[test]
fn test_run_serializes_to_json() {
    let claims = ClaimStore::load_str(
        r#"{"vec_pop": {"time_complexity": "O(1)", "space_complexity": "O(1)"}}"#,
    )
    .unwrap();
    let run = Validator::new(config(&[100, 1_000, 10_000, 100_000]))
        .run(&claims, &builtins::registry())
        .unwrap();

    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["results"][0]["operation"], "vec_pop");
    assert_eq!(json["samples"]["vec_pop"].as_array().unwrap().len(), 4);
    assert!(json["elapsed"].as_f64().unwrap() >= 0.0);
}
