//! Conformance and benchmark runners.
//!
//! Both runners hold one adapter through the [`ValidatorAdapter`] trait and
//! walk fixtures sequentially: a compiled schema is never shared between
//! concurrent calls. Every adapter call goes through [`fault::guard`].
//!
//! [`ValidatorAdapter`]: crate::adapter::ValidatorAdapter

pub mod bench;
pub mod conformance;
pub mod fault;

pub use bench::{BenchOutcome, BenchReport, BenchmarkRunner, Measurement, check_case, load_group};
pub use conformance::{ConformanceReport, ConformanceRunner, Outcome, Scope, Verdict};
pub use fault::guard;
