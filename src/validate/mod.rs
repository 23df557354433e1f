//! Validation runs
//!
//! - [`Validator`] detects the framework and runs its stages in order
//! - [`aggregate`] folds stage results into an overall status
//! - [`Report`] renders a run as text or JSON

pub mod report;
pub mod types;
pub mod validator;

pub use report::{tail_lines, Report, StageReport};
pub use types::{
    aggregate, CheckResult, CheckStatus, OverallStatus, StageKind, StageReason, Summary,
    ValidateOptions, ValidationRun,
};
pub use validator::{resolve_project_root, NoopObserver, StageObserver, Validator};
