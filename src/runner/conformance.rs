//! Conformance runner.
//!
//! Walks fixture files group by group, loads each group's schema into the
//! adapter and checks every case's verdict. Failures stay local:
//!
//! - a file that cannot be loaded fails only that file,
//! - a schema that fails to compile fails only its group,
//! - a wrong verdict or an engine fault fails only its case.
//!
//! Every case is reported under its own `file:group:case` label.

use super::fault::guard;
use crate::adapter::ValidatorAdapter;
use crate::config::ValidationMode;
use crate::error::{CompileError, FixtureError, InternalFault, Operation};
use crate::fixture::{load_dir, DirectoryLoad, FixtureFile, TestCase, TestGroup};
use log::{debug, info, warn};
use std::fmt;
use std::path::Path;

/// What a reported outcome covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    File,
    Group,
    Case,
}

/// Result for one reported unit.
#[derive(Debug)]
pub enum Verdict {
    Pass,
    /// The adapter disagreed with the expected verdict
    Mismatch { expected: bool, actual: bool },
    /// The engine faulted while loading or validating
    Fault(InternalFault),
    /// The group's schema did not compile
    Compile(CompileError),
    /// The fixture file could not be loaded
    Fixture(FixtureError),
    /// The case data could not be decoded for value mode
    Decode(serde_json::Error),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Mismatch { expected, actual } => {
                write!(f, "expected valid={}, got valid={}", expected, actual)
            }
            Verdict::Fault(fault) => write!(f, "{}", fault),
            Verdict::Compile(e) => write!(f, "{}", e),
            Verdict::Fixture(e) => write!(f, "{}", e),
            Verdict::Decode(e) => write!(f, "failed to decode data: {}", e),
        }
    }
}

/// One independently reported unit of a conformance run.
#[derive(Debug)]
pub struct Outcome {
    pub label: String,
    pub scope: Scope,
    /// Validation mode for case outcomes
    pub mode: Option<ValidationMode>,
    pub verdict: Verdict,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Some(mode) => write!(f, "{} [{}]: {}", self.label, mode, self.verdict),
            None => write!(f, "{}: {}", self.label, self.verdict),
        }
    }
}

/// Ordered outcomes of a conformance run.
#[derive(Debug)]
pub struct ConformanceReport {
    pub validator: &'static str,
    pub outcomes: Vec<Outcome>,
}

impl ConformanceReport {
    pub fn new(validator: &'static str) -> Self {
        Self {
            validator,
            outcomes: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(Outcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    /// First outcome reported under `label`.
    pub fn find(&self, label: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.label == label)
    }

    /// Append another report's outcomes after this one's.
    pub fn merge(&mut self, other: ConformanceReport) {
        self.outcomes.extend(other.outcomes);
    }

    fn push(&mut self, label: String, scope: Scope, mode: Option<ValidationMode>, verdict: Verdict) {
        if verdict.is_pass() {
            debug!("PASS {}", label);
        } else {
            warn!("FAIL {}: {}", label, verdict);
        }
        self.outcomes.push(Outcome {
            label,
            scope,
            mode,
            verdict,
        });
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} passed, {} failed",
            self.validator,
            self.passed(),
            self.failed()
        )
    }
}

/// Label of a group: `file:group`.
pub fn group_label(file: &str, group: &TestGroup) -> String {
    format!("{}:{}", file, group.description)
}

/// Label of a case: `file:group:case`.
pub fn case_label(file: &str, group: &TestGroup, case: &TestCase) -> String {
    format!("{}:{}:{}", file, group.description, case.description)
}

/// Drives fixtures through a single adapter, sequentially.
pub struct ConformanceRunner<'a> {
    adapter: &'a mut dyn ValidatorAdapter,
    modes: Vec<ValidationMode>,
}

impl<'a> ConformanceRunner<'a> {
    /// Create a runner that checks raw documents through `valid_json`.
    pub fn new(adapter: &'a mut dyn ValidatorAdapter) -> Self {
        Self {
            adapter,
            modes: vec![ValidationMode::Json],
        }
    }

    /// Check every case in each of `modes`. Running both modes also checks
    /// that raw and decoded validation agree.
    pub fn with_modes(mut self, modes: &[ValidationMode]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    /// Run every fixture file in `dir`.
    ///
    /// Fails only if the directory itself cannot be listed.
    pub fn run_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<ConformanceReport, FixtureError> {
        let load = load_dir(&dir)?;
        info!(
            "Running {} fixture files from {} with {}",
            load.entries.len(),
            dir.as_ref().display(),
            self.adapter.name()
        );
        Ok(self.run_load(load))
    }

    /// Run several directories in order into one report.
    pub fn run_dirs<P: AsRef<Path>>(&mut self, dirs: &[P]) -> Result<ConformanceReport, FixtureError> {
        let mut report = ConformanceReport::new(self.adapter.name());
        for dir in dirs {
            report.merge(self.run_dir(dir)?);
        }
        Ok(report)
    }

    /// Run an already loaded directory. Rejected files become file-level
    /// failures.
    pub fn run_load(&mut self, load: DirectoryLoad) -> ConformanceReport {
        let mut report = ConformanceReport::new(self.adapter.name());
        for entry in load.entries {
            match entry.result {
                Ok(file) => self.run_file_into(&file, &mut report),
                Err(e) => report.push(entry.name, Scope::File, None, Verdict::Fixture(e)),
            }
        }
        report
    }

    /// Run every group of one file.
    pub fn run_file(&mut self, file: &FixtureFile) -> ConformanceReport {
        let mut report = ConformanceReport::new(self.adapter.name());
        self.run_file_into(file, &mut report);
        report
    }

    fn run_file_into(&mut self, file: &FixtureFile, report: &mut ConformanceReport) {
        debug!("Running {} ({} groups)", file.name, file.groups.len());
        for group in &file.groups {
            self.run_group(&file.name, group, report);
        }
    }

    fn run_group(&mut self, file: &str, group: &TestGroup, report: &mut ConformanceReport) {
        let adapter = &mut *self.adapter;
        let loaded = guard(Operation::LoadSchema, || adapter.load_schema(group.schema_bytes()));

        let failure = match loaded {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(Verdict::Compile(e)),
            Err(fault) => Some(Verdict::Fault(fault)),
        };
        if let Some(verdict) = failure {
            report.push(group_label(file, group), Scope::Group, None, verdict);
            return;
        }

        for case in &group.cases {
            for &mode in &self.modes {
                let verdict = self.run_case(case, mode);
                report.push(case_label(file, group, case), Scope::Case, Some(mode), verdict);
            }
        }
    }

    fn run_case(&self, case: &TestCase, mode: ValidationMode) -> Verdict {
        let adapter = &*self.adapter;
        let actual = match mode {
            ValidationMode::Json => {
                guard(Operation::ValidJson, || adapter.valid_json(case.data_bytes()))
            }
            ValidationMode::Value => {
                let value = match case.decode() {
                    Ok(value) => value,
                    Err(e) => return Verdict::Decode(e),
                };
                guard(Operation::ValidValue, || adapter.valid_value(&value))
            }
        };

        match actual {
            Ok(actual) if actual == case.expected_valid => Verdict::Pass,
            Ok(actual) => Verdict::Mismatch {
                expected: case.expected_valid,
                actual,
            },
            Err(fault) => Verdict::Fault(fault),
        }
    }
}
