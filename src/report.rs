//! Validation reports
//!
//! Thin rendering layer over [`VerificationResult`]s: a fixed-width text
//! table for terminals, JSON for tooling, and the process exit-code policy.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matcher::{Verdict, VerificationResult};
use crate::Result;

/// Exit code when every claim is confirmed.
pub const EXIT_CONFIRMED: u8 = 0;
/// Exit code when at least one claim is suspect and none is unverifiable.
pub const EXIT_SUSPECT: u8 = 1;
/// Exit code when at least one claim is unverifiable, whatever the cause:
/// no reference implementation, a failed execution, the run timing out, or
/// no profile at all.
pub const EXIT_UNVERIFIABLE: u8 = 2;
/// Exit code when the claim source failed to load.
pub const EXIT_LOAD_FAILURE: u8 = 3;

/// Verdict counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of claims
    pub total: usize,
    /// Claims confirmed
    pub confirmed: usize,
    /// Claims suspect
    pub suspect: usize,
    /// Claims unverifiable
    pub unverifiable: usize,
}

impl Summary {
    /// Count verdicts.
    #[must_use]
    pub fn from_results(results: &[VerificationResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            match result.verdict() {
                Verdict::Confirmed => summary.confirmed += 1,
                Verdict::Suspect => summary.suspect += 1,
                Verdict::Unverifiable => summary.unverifiable += 1,
            }
            summary
        })
    }

    /// Process exit code for these counts.
    ///
    /// `UNVERIFIABLE` outranks `SUSPECT`; an empty report counts as confirmed.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.unverifiable > 0 {
            EXIT_UNVERIFIABLE
        } else if self.suspect > 0 {
            EXIT_SUSPECT
        } else {
            EXIT_CONFIRMED
        }
    }
}

/// Rendered outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    generated_at: DateTime<Utc>,
    summary: Summary,
    results: Vec<VerificationResult>,
}

impl Report {
    /// Create a report stamped with the current time.
    #[must_use]
    pub fn new(results: Vec<VerificationResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: Summary::from_results(&results),
            results,
        }
    }

    /// Get the generation timestamp.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Get the verdict counts.
    #[must_use]
    pub const fn summary(&self) -> Summary {
        self.summary
    }

    /// Get the results.
    #[must_use]
    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    /// Process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.summary.exit_code()
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a text table followed by a summary line.
    #[must_use]
    pub fn to_text(&self) -> String {
        let width = self
            .results
            .iter()
            .map(|r| r.operation().len())
            .chain(std::iter::once("OPERATION".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:<10}  {:<10}  {:>10}  {:<12}  {}",
            "OPERATION", "DECLARED", "OBSERVED", "CONFIDENCE", "VERDICT", "SPACE"
        );

        for result in &self.results {
            let observed = result.observed().map_or_else(|| "-".to_string(), |c| c.to_string());
            let confidence = result.confidence().map_or_else(|| "-".to_string(), |c| format!("{c:.2}"));
            let space = result.space().map_or_else(
                || "-".to_string(),
                |s| format!("{} vs {} {}", s.declared, s.observed, s.verdict),
            );
            let _ = write!(
                out,
                "{:<width$}  {:<10}  {:<10}  {:>10}  {:<12}  {}",
                result.operation(),
                result.declared().to_string(),
                observed,
                confidence,
                result.verdict().to_string(),
                space
            );
            if let Some(reason) = result.reason() {
                let _ = write!(out, "  ({reason})");
            }
            out.push('\n');
        }

        let summary = self.summary;
        let _ = writeln!(
            out,
            "\n{} claims: {} confirmed, {} suspect, {} unverifiable",
            summary.total, summary.confirmed, summary.suspect, summary.unverifiable
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{ClaimStore, ComplexityClaim};
    use std::collections::BTreeMap;

    use crate::matcher::{ComplexityMatcher, UnverifiableReason};
    use crate::profiler::EmpiricalFit;
    use crate::ComplexityClass::{Constant, Linear, Quadratic};

    fn results(fits: &[EmpiricalFit]) -> Vec<VerificationResult> {
        let mut claims = ClaimStore::new();
        claims.insert(ComplexityClaim::new("bubble_sort", Linear, Constant)).unwrap();
        claims.insert(ComplexityClaim::new("vec_index", Constant, Constant)).unwrap();
        ComplexityMatcher::new().match_claims(&claims, fits)
    }

    #[test]
    fn test_exit_code_all_confirmed() {
        let report = Report::new(results(&[
            EmpiricalFit::new("bubble_sort", Linear, 0.9),
            EmpiricalFit::new("vec_index", Constant, 0.9),
        ]));
        assert_eq!(report.exit_code(), EXIT_CONFIRMED);
        assert_eq!(report.summary().confirmed, 2);
    }

    #[test]
    fn test_exit_code_suspect() {
        let report = Report::new(results(&[
            EmpiricalFit::new("bubble_sort", Quadratic, 0.9),
            EmpiricalFit::new("vec_index", Constant, 0.9),
        ]));
        assert_eq!(report.exit_code(), EXIT_SUSPECT);
    }

    #[test]
    fn test_exit_code_unverifiable_outranks_suspect() {
        let report = Report::new(results(&[EmpiricalFit::new("bubble_sort", Quadratic, 0.9)]));
        assert_eq!(report.summary().suspect, 1);
        assert_eq!(report.summary().unverifiable, 1);
        assert_eq!(report.exit_code(), EXIT_UNVERIFIABLE);
    }

    #[test]
    fn test_every_unverifiable_cause_exits_unverifiable() {
        let mut claims = ClaimStore::new();
        claims.insert(ComplexityClaim::new("vec_index", Constant, Constant)).unwrap();
        let fits = [EmpiricalFit::new("vec_index", Constant, 0.9)];

        for reason in [
            UnverifiableReason::MissingReference,
            UnverifiableReason::ExecutionFailed("index out of bounds".to_string()),
            UnverifiableReason::TimedOut,
        ] {
            let failures = BTreeMap::from([("vec_index".to_string(), reason.clone())]);
            let report = Report::new(ComplexityMatcher::new().match_with(&claims, &fits, &[], &failures));
            assert_eq!(report.exit_code(), EXIT_UNVERIFIABLE, "{reason}");
        }

        let unprofiled = Report::new(ComplexityMatcher::new().match_claims(&claims, &[]));
        assert_eq!(unprofiled.exit_code(), EXIT_UNVERIFIABLE);
    }

    #[test]
    fn test_empty_report_is_confirmed() {
        assert_eq!(Report::new(Vec::new()).exit_code(), EXIT_CONFIRMED);
    }

    #[test]
    fn test_text_rendering() {
        let report = Report::new(results(&[EmpiricalFit::new("bubble_sort", Quadratic, 0.87)]));
        let text = report.to_text();
        assert!(text.starts_with("OPERATION"));
        assert!(text.contains("bubble_sort"));
        assert!(text.contains("O(n^2)"));
        assert!(text.contains("0.87"));
        assert!(text.contains("(not profiled)"));
        assert!(text.contains("2 claims: 0 confirmed, 1 suspect, 1 unverifiable"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = Report::new(results(&[EmpiricalFit::new("vec_index", Constant, 1.0)]));
        let json = report.to_json().unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
