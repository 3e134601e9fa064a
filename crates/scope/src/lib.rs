//! Scoped multi-resource block, failure reporter, and data sinks.

pub mod files;
pub mod reporter;
pub mod scenarios;
pub mod scope;
pub mod sink;
pub mod unwind;

pub use files::{first_line, transfer_first_line, Properties};
pub use reporter::FailureReport;
pub use scenarios::{Scenario, ScenarioOutcome};
pub use scope::{with, Acquire, Scope};
pub use unwind::Unwind;
