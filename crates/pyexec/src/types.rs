//! Foundational public types for the pyexec library.
//!
//! This module defines the core data structures used throughout the
//! sandboxing pipeline:
//! - [`Limits`] — the three runtime isolation bounds for a single evaluation.
//! - [`ExecutionResult`] — the flattened outcome of one `evaluate()` call.
//! - [`Phase`] — how far the pipeline advanced before producing a result.
//! - [`SyntaxReport`] / [`SyntaxError`] — the outcome of `check_syntax()`.
//! - [`EvaluateOutcome`] — the full, phase-specific outcome `evaluate()`
//!   produces internally, before it is flattened into an [`ExecutionResult`]
//!   or rendered as the external JSON shape from spec §6.
//! - [`ChildRecord`] — the structured record the sandboxed child emits.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Ordered, duplicate-preserving list of human-readable violation
/// descriptions produced by [`crate::analyzer::scan`].
pub type ViolationList = Vec<String>;

/// Configuration that governs the three runtime isolation bounds applied to
/// a single sandboxed evaluation.
///
/// A `0.0`/`0` limit means "do not enforce that bound", except
/// `wall_timeout_seconds`, which is mandatory and must be strictly positive
/// (enforced by [`crate::launcher::evaluate`], not by this type).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum wall-clock time in seconds before the child is killed.
    pub wall_timeout_seconds: f64,
    /// Maximum CPU time in seconds granted to the child (`0` = unbounded).
    pub cpu_seconds: f64,
    /// Maximum address-space size in megabytes granted to the child
    /// (`0` = unbounded).
    pub address_space_mb: u64,
}

impl Default for Limits {
    /// The defaults named in spec §6: 15s wall-clock, 10s CPU, 100MB address space.
    fn default() -> Self {
        Self {
            wall_timeout_seconds: 15.0,
            cpu_seconds: 10.0,
            address_space_mb: 100,
        }
    }
}

/// How far the evaluation pipeline advanced before producing a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SyntaxCheck,
    SecurityCheck,
    Execution,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::SyntaxCheck => "syntax_check",
            Phase::SecurityCheck => "security_check",
            Phase::Execution => "execution",
        }
    }
}

/// The flattened, single-shape outcome of an `evaluate()` call (spec §3's
/// `ExecutionResult` record). Every phase folds its phase-specific data
/// (a rendered [`SyntaxReport`], a rendered [`ViolationList`], or raw child
/// output) into this one shape so Rust callers have a single type to match
/// on. Callers that need the un-flattened, phase-specific data (e.g. the
/// exact JSON shape spec §6 names for each phase) should use
/// [`EvaluateOutcome`] via [`crate::launcher::evaluate_outcome`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub phase: Phase,
    /// Advertises reduced isolation when platform resource-limit setup
    /// failed (spec invariant I4: never silently apply none of the
    /// caller's stated limits). Empty string when full isolation is active.
    pub platform_note: String,
}

/// A single parse failure, with position information best-effort filled in.
///
/// `line` is 1-indexed; `column` is a 1-indexed character offset into the
/// offending line; `context_line` is that line with surrounding whitespace
/// trimmed, or empty if the line number is unavailable or out of range.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub context_line: String,
}

/// The outcome of `check_syntax()`.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxReport {
    Ok,
    Err(SyntaxError),
}

impl SyntaxReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, SyntaxReport::Ok)
    }

    /// Render as the exact JSON shape spec §6 names for `check_syntax`:
    /// `{"valid": true}` or
    /// `{"valid": false, "error": ..., "line": ..., "offset": ..., "context": ...}`.
    pub fn to_json(&self) -> Value {
        match self {
            SyntaxReport::Ok => json!({ "valid": true }),
            SyntaxReport::Err(e) => json!({
                "valid": false,
                "error": e.message,
                "line": e.line,
                "offset": e.column,
                "context": e.context_line,
            }),
        }
    }
}

/// The record the sandboxed child emits on its standard output: the only
/// legitimate bytes it is allowed to write there (spec invariant I1). Any
/// deviation — malformed JSON, missing output, extra bytes — is a
/// containment failure, handled by the launcher rather than represented
/// here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChildRecord {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// The full, phase-specific outcome of a single `evaluate()` call.
///
/// This is the pipeline's natural result shape: each phase carries only the
/// data relevant to it, rather than forcing every phase through one
/// lowest-common-denominator struct. [`Self::flatten`] and [`Self::to_json`]
/// adapt it to, respectively, the generic [`ExecutionResult`] record (spec
/// §3) and the exact per-phase JSON spec §6 names.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluateOutcome {
    SyntaxFailed(SyntaxError),
    SecurityRejected {
        violations: ViolationList,
        platform_note: String,
    },
    Executed {
        stdout: String,
        stderr: String,
        exit_code: i32,
        platform_note: String,
    },
}

impl EvaluateOutcome {
    /// Flatten into the generic [`ExecutionResult`] record (spec §4.3's
    /// pipeline steps 1/2/8). Syntax and security failures carry no stdout
    /// and a rendered, human-readable `stderr`; `exit_code` is always
    /// nonzero on those two paths.
    pub fn flatten(&self) -> ExecutionResult {
        match self {
            EvaluateOutcome::SyntaxFailed(e) => ExecutionResult {
                stdout: String::new(),
                stderr: render_syntax_error(e),
                exit_code: 1,
                phase: Phase::SyntaxCheck,
                platform_note: String::new(),
            },
            EvaluateOutcome::SecurityRejected {
                violations,
                platform_note,
            } => ExecutionResult {
                stdout: String::new(),
                stderr: violations.join("\n"),
                exit_code: 1,
                phase: Phase::SecurityCheck,
                platform_note: platform_note.clone(),
            },
            EvaluateOutcome::Executed {
                stdout,
                stderr,
                exit_code,
                platform_note,
            } => ExecutionResult {
                stdout: stdout.clone(),
                stderr: stderr.clone(),
                exit_code: *exit_code,
                phase: Phase::Execution,
                platform_note: platform_note.clone(),
            },
        }
    }

    /// Render as the exact JSON shape spec §6 names for `evaluate`.
    pub fn to_json(&self) -> Value {
        match self {
            EvaluateOutcome::SyntaxFailed(e) => {
                let mut v = SyntaxReport::Err(e.clone()).to_json();
                v["phase"] = json!(Phase::SyntaxCheck.as_str());
                v
            }
            EvaluateOutcome::SecurityRejected {
                violations,
                platform_note,
            } => json!({
                "valid": false,
                "phase": Phase::SecurityCheck.as_str(),
                "violations": violations,
                "platform_warning": platform_note,
            }),
            EvaluateOutcome::Executed {
                stdout,
                stderr,
                exit_code,
                platform_note,
            } => json!({
                "stdout": stdout,
                "stderr": stderr,
                "exit_code": exit_code,
                "phase": Phase::Execution.as_str(),
                "platform_warning": platform_note,
            }),
        }
    }
}

fn render_syntax_error(e: &SyntaxError) -> String {
    match (e.line, e.column) {
        (Some(line), Some(col)) => format!("{} (line {line}, column {col})", e.message),
        (Some(line), None) => format!("{} (line {line})", e.message),
        _ => e.message.clone(),
    }
}
