//! Benchmark runner.
//!
//! For every case the runner times one of two loops against the loaded
//! schema:
//!
//! - [`ValidationMode::Json`] calls `valid_json` on the raw bytes, so parse
//!   cost is included;
//! - [`ValidationMode::Value`] decodes the document once before timing and
//!   calls `valid_value`, measuring validation alone.
//!
//! Schema compilation and decoding happen outside the timed region. The
//! iteration count scales up until a round lasts at least
//! [`BenchSettings::min_time`]. Any iteration whose verdict differs from the
//! expected one fails the case on the spot: a measurement of a wrong answer
//! is not reported.

use super::conformance::{case_label, group_label};
use super::fault::guard;
use crate::adapter::ValidatorAdapter;
use crate::alloc::{self, AllocStats};
use crate::config::{BenchSettings, ValidationMode};
use crate::error::{BenchError, FixtureError, Operation};
use crate::fixture::{load_dir, FixtureFile, TestCase, TestGroup};
use log::{debug, info, warn};
use std::fmt;
use std::hint::black_box;
use std::path::Path;
use std::time::{Duration, Instant};

/// Timing of one case in one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub iterations: u64,
    pub elapsed: Duration,
    /// Allocations made inside the timed region, when counting is installed.
    ///
    /// The counters are process-wide: allocations by other threads during
    /// the timed region, such as the remote schema server or the HTTP
    /// client's worker, are charged to this case too.
    pub allocations: Option<AllocStats>,
}

impl Measurement {
    pub fn ns_per_iter(&self) -> f64 {
        self.elapsed.as_nanos() as f64 / self.iterations.max(1) as f64
    }

    pub fn allocs_per_iter(&self) -> Option<f64> {
        self.allocations
            .map(|stats| stats.allocations as f64 / self.iterations.max(1) as f64)
    }

    pub fn bytes_per_iter(&self) -> Option<f64> {
        self.allocations
            .map(|stats| stats.bytes as f64 / self.iterations.max(1) as f64)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10} {:>12.1} ns/op", self.iterations, self.ns_per_iter())?;
        if let (Some(bytes), Some(allocs)) = (self.bytes_per_iter(), self.allocs_per_iter()) {
            write!(f, " {:>10.0} B/op {:>8.0} allocs/op", bytes, allocs)?;
        }
        Ok(())
    }
}

/// Result of benchmarking one case (or of a file or group that could not be
/// prepared).
#[derive(Debug)]
pub struct BenchOutcome {
    pub label: String,
    pub mode: Option<ValidationMode>,
    pub result: Result<Measurement, BenchError>,
}

impl BenchOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for BenchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = self.mode.map(|m| m.as_str()).unwrap_or("-");
        match &self.result {
            Ok(measurement) => write!(f, "{} [{}] {}", self.label, mode, measurement),
            Err(e) => write!(f, "{} [{}] FAILED: {}", self.label, mode, e),
        }
    }
}

/// Ordered outcomes of a benchmark run.
#[derive(Debug)]
pub struct BenchReport {
    pub validator: &'static str,
    pub outcomes: Vec<BenchOutcome>,
}

impl BenchReport {
    pub fn new(validator: &'static str) -> Self {
        Self {
            validator,
            outcomes: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(BenchOutcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BenchOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn measurements(&self) -> impl Iterator<Item = (&BenchOutcome, &Measurement)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|m| (o, m)))
    }

    pub fn merge(&mut self, other: BenchReport) {
        self.outcomes.extend(other.outcomes);
    }

    fn push(&mut self, label: String, mode: Option<ValidationMode>, result: Result<Measurement, BenchError>) {
        match &result {
            Ok(measurement) => debug!("{} [{:?}] {}", label, mode, measurement),
            Err(e) => warn!("Benchmark {} failed: {}", label, e),
        }
        self.outcomes.push(BenchOutcome {
            label,
            mode,
            result,
        });
    }
}

/// Benchmarks fixtures against a single adapter, one loop at a time.
pub struct BenchmarkRunner<'a> {
    adapter: &'a mut dyn ValidatorAdapter,
    settings: BenchSettings,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(adapter: &'a mut dyn ValidatorAdapter, settings: BenchSettings) -> Self {
        Self { adapter, settings }
    }

    /// Benchmark every fixture file in `dir`.
    pub fn run_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<BenchReport, FixtureError> {
        let load = load_dir(&dir)?;
        info!(
            "Benchmarking {} fixture files from {} with {}",
            load.entries.len(),
            dir.as_ref().display(),
            self.adapter.name()
        );

        let mut report = BenchReport::new(self.adapter.name());
        for entry in load.entries {
            match entry.result {
                Ok(file) => report.merge(self.run_file(&file)),
                Err(e) => report.push(entry.name, None, Err(BenchError::Fixture(e))),
            }
        }
        Ok(report)
    }

    /// Benchmark every case of one file in every configured mode.
    pub fn run_file(&mut self, file: &FixtureFile) -> BenchReport {
        let mut report = BenchReport::new(self.adapter.name());
        for group in &file.groups {
            self.run_group(&file.name, group, &mut report);
        }
        report
    }

    fn run_group(&mut self, file: &str, group: &TestGroup, report: &mut BenchReport) {
        if let Err(e) = load_group(&mut *self.adapter, group) {
            report.push(group_label(file, group), None, Err(e));
            return;
        }

        for case in &group.cases {
            for mode in self.settings.modes.clone() {
                let result = self.bench_case(case, mode);
                report.push(case_label(file, group, case), Some(mode), result);
            }
        }
    }

    /// Time one case against the currently loaded schema.
    pub fn bench_case(&self, case: &TestCase, mode: ValidationMode) -> Result<Measurement, BenchError> {
        let adapter = &*self.adapter;
        match mode {
            ValidationMode::Json => {
                let data = case.data_bytes();
                self.measure(case.expected_valid, Operation::ValidJson, || {
                    adapter.valid_json(black_box(data))
                })
            }
            ValidationMode::Value => {
                let value = case.decode().map_err(BenchError::Decode)?;
                self.measure(case.expected_valid, Operation::ValidValue, || {
                    adapter.valid_value(black_box(&value))
                })
            }
        }
    }

    fn measure(
        &self,
        expected: bool,
        operation: Operation,
        mut validate: impl FnMut() -> bool,
    ) -> Result<Measurement, BenchError> {
        let min_time = self.settings.min_time;
        let max_iterations = self.settings.max_iterations.max(1);
        let counting = alloc::is_installed();
        let mut total = 0u64;
        let mut n = 1u64;

        loop {
            let before = alloc::snapshot();
            let start = Instant::now();
            for i in 0..n {
                let actual = guard(operation, &mut validate)?;
                if black_box(actual) != expected {
                    return Err(BenchError::Mismatch {
                        iteration: total + i,
                        expected,
                        actual,
                    });
                }
            }
            let elapsed = start.elapsed();
            let allocations = counting.then(|| alloc::snapshot().since(before));
            total += n;

            if elapsed >= min_time || n >= max_iterations {
                return Ok(Measurement {
                    iterations: n,
                    elapsed,
                    allocations,
                });
            }
            n = next_iterations(n, elapsed, min_time, max_iterations);
        }
    }
}

/// Load `group`'s schema into `adapter` behind the fault boundary.
pub fn load_group(adapter: &mut dyn ValidatorAdapter, group: &TestGroup) -> Result<(), BenchError> {
    match guard(Operation::LoadSchema, || adapter.load_schema(group.schema_bytes())) {
        Ok(loaded) => loaded.map_err(BenchError::Compile),
        Err(fault) => Err(BenchError::Fault(fault)),
    }
}

/// Validate `case` once in `mode` behind the fault boundary and compare the
/// verdict with the expected one.
///
/// Timing loops that do not go through [`BenchmarkRunner`] run this first,
/// so a faulting engine costs one case instead of the whole run.
pub fn check_case(
    adapter: &dyn ValidatorAdapter,
    case: &TestCase,
    mode: ValidationMode,
) -> Result<(), BenchError> {
    let actual = match mode {
        ValidationMode::Json => {
            guard(Operation::ValidJson, || adapter.valid_json(case.data_bytes()))?
        }
        ValidationMode::Value => {
            let value = case.decode().map_err(BenchError::Decode)?;
            guard(Operation::ValidValue, || adapter.valid_value(&value))?
        }
    };

    if actual != case.expected_valid {
        return Err(BenchError::Mismatch {
            iteration: 0,
            expected: case.expected_valid,
            actual,
        });
    }
    Ok(())
}

/// Predict the iteration count for the next round: aim for `min_time` with
/// 20% headroom, grow at least 2x and at most 100x, never past `max`.
fn next_iterations(n: u64, elapsed: Duration, min_time: Duration, max: u64) -> u64 {
    let per_iter = (elapsed.as_nanos() / n as u128).max(1);
    let predicted = (min_time.as_nanos() * 6 / 5 / per_iter) as u64;
    predicted
        .max(n.saturating_mul(2))
        .min(n.saturating_mul(100))
        .min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedAdapter;

    fn settings(modes: &[ValidationMode]) -> BenchSettings {
        BenchSettings {
            min_time: Duration::from_millis(1),
            max_iterations: 10_000,
            modes: modes.to_vec(),
        }
    }

    fn fixture(raw: &str) -> FixtureFile {
        FixtureFile {
            name: "bench.json".to_string(),
            groups: serde_json::from_str(raw).unwrap(),
        }
    }

    #[test]
    fn test_next_iterations_bounds() {
        let ms = Duration::from_millis(1);
        assert_eq!(next_iterations(1, Duration::from_secs(1), ms, 1000), 2);
        assert_eq!(next_iterations(10, Duration::from_nanos(10), ms, u64::MAX), 1000);
        assert_eq!(next_iterations(10, Duration::from_nanos(10), ms, 50), 50);
    }

    #[test]
    fn test_measures_both_modes() {
        let file = fixture(
            r#"[{"description": "g", "schema": {}, "tests": [
                {"description": "int", "data": 4, "valid": true},
                {"description": "str", "data": "x", "valid": false}
            ]}]"#,
        );
        let mut adapter = ScriptedAdapter::default();
        let report = BenchmarkRunner::new(
            &mut adapter,
            settings(&[ValidationMode::Json, ValidationMode::Value]),
        )
        .run_file(&file);

        assert!(report.is_success());
        assert_eq!(report.outcomes.len(), 4);
        for (_, measurement) in report.measurements() {
            assert!(measurement.iterations >= 1);
        }
    }

    #[test]
    fn test_mismatch_fails_immediately() {
        let file = fixture(
            r#"[{"description": "g", "schema": {}, "tests": [
                {"description": "wrong", "data": 4, "valid": false}
            ]}]"#,
        );
        let mut adapter = ScriptedAdapter::default();
        let report = BenchmarkRunner::new(&mut adapter, settings(&[ValidationMode::Json])).run_file(&file);

        let outcome = report.failures().next().unwrap();
        assert_eq!(outcome.label, "bench.json:g:wrong");
        assert!(matches!(
            outcome.result,
            Err(BenchError::Mismatch {
                iteration: 0,
                expected: false,
                actual: true
            })
        ));
    }

    #[test]
    fn test_compile_failure_skips_group_only() {
        let file = fixture(
            r#"[
                {"description": "broken", "schema": "broken", "tests": [
                    {"description": "c", "data": 1, "valid": true}
                ]},
                {"description": "ok", "schema": {}, "tests": [
                    {"description": "c", "data": 1, "valid": true}
                ]}
            ]"#,
        );
        let mut adapter = ScriptedAdapter::default();
        let report = BenchmarkRunner::new(&mut adapter, settings(&[ValidationMode::Value])).run_file(&file);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].label, "bench.json:broken");
        assert!(matches!(report.outcomes[0].result, Err(BenchError::Compile(_))));
        assert!(report.outcomes[1].passed());
    }

    #[test]
    fn test_fault_fails_the_case() {
        let file = fixture(
            r#"[{"description": "g", "schema": {}, "tests": [
                {"description": "boom", "data": "explode", "valid": false}
            ]}]"#,
        );
        let mut adapter = ScriptedAdapter::default();
        let report = BenchmarkRunner::new(&mut adapter, settings(&[ValidationMode::Json])).run_file(&file);

        assert!(matches!(
            report.outcomes[0].result,
            Err(BenchError::Fault(_))
        ));
    }

    fn case(raw: &str) -> TestCase {
        serde_json::from_str(raw).unwrap()
    }

    fn group(raw: &str) -> TestGroup {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_load_group_catches_faults() {
        let mut adapter = ScriptedAdapter::default();

        let panicking = group(r#"{"description": "g", "schema": "panic", "tests": []}"#);
        assert!(matches!(
            load_group(&mut adapter, &panicking),
            Err(BenchError::Fault(_))
        ));

        let broken = group(r#"{"description": "g", "schema": "broken", "tests": []}"#);
        assert!(matches!(
            load_group(&mut adapter, &broken),
            Err(BenchError::Compile(_))
        ));

        let fine = group(r#"{"description": "g", "schema": {}, "tests": []}"#);
        assert!(load_group(&mut adapter, &fine).is_ok());
    }

    #[test]
    fn test_check_case_reports_instead_of_panicking() {
        let mut adapter = ScriptedAdapter::default();
        let fine = group(r#"{"description": "g", "schema": {}, "tests": []}"#);
        load_group(&mut adapter, &fine).unwrap();

        let exploding = case(r#"{"description": "boom", "data": "explode", "valid": false}"#);
        for mode in [ValidationMode::Json, ValidationMode::Value] {
            assert!(matches!(
                check_case(&adapter, &exploding, mode),
                Err(BenchError::Fault(_))
            ));
        }

        let wrong = case(r#"{"description": "wrong", "data": 3, "valid": false}"#);
        assert!(matches!(
            check_case(&adapter, &wrong, ValidationMode::Json),
            Err(BenchError::Mismatch {
                expected: false,
                actual: true,
                ..
            })
        ));

        let right = case(r#"{"description": "right", "data": 3, "valid": true}"#);
        assert!(check_case(&adapter, &right, ValidationMode::Value).is_ok());
    }

    #[test]
    fn test_check_case_without_schema_is_a_fault() {
        let adapter = ScriptedAdapter::default();
        let any = case(r#"{"description": "any", "data": 1, "valid": true}"#);
        assert!(matches!(
            check_case(&adapter, &any, ValidationMode::Json),
            Err(BenchError::Fault(_))
        ));
    }

    #[test]
    fn test_schema_loaded_once_per_group() {
        let file = fixture(
            r#"[{"description": "g", "schema": {}, "tests": [
                {"description": "a", "data": 1, "valid": true},
                {"description": "b", "data": 2, "valid": true}
            ]}]"#,
        );
        let mut adapter = ScriptedAdapter::default();
        BenchmarkRunner::new(&mut adapter, settings(&[ValidationMode::Json])).run_file(&file);
        assert_eq!(adapter.loads, 1);
    }
}
