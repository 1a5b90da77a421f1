// pyexec: sandboxed Python execution via a resource-caged child interpreter.

pub mod analyzer;
pub mod cage;
pub mod error;
pub mod interpreter;
pub mod launcher;
pub mod template;
pub mod timeout;
pub mod types;

pub use analyzer::{check_syntax, scan};
pub use error::LauncherError;
pub use launcher::{evaluate, evaluate_outcome};
pub use types::{
    ChildRecord, EvaluateOutcome, ExecutionResult, Limits, Phase, SyntaxError, SyntaxReport,
    ViolationList,
};
