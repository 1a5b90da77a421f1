//! The sandbox launcher: wires the static analyzer, the inner runtime
//! template, and a platform resource cage into the single `evaluate`
//! pipeline spec'd for this crate.
//!
//! Pipeline: syntax check → security scan → template render → temp file
//! write → interpreter discovery → cleaned environment → spawn under a
//! resource cage → deadline wait → reap/cleanup → parse the child's JSON
//! record, or synthesize a containment failure if it didn't produce one.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::analyzer::{check_syntax, scan};
use crate::cage::{PlatformResourceCage, ResourceCage};
use crate::error::LauncherError;
use crate::interpreter;
use crate::template;
use crate::timeout::{wait_with_deadline, WaitOutcome};
use crate::types::{ChildRecord, EvaluateOutcome, ExecutionResult, Limits, SyntaxReport};

/// Run the full pipeline and flatten the result into the generic
/// [`ExecutionResult`] record.
pub fn evaluate(code: &str, limits: Limits) -> ExecutionResult {
    evaluate_outcome(code, limits).flatten()
}

/// Run the full pipeline, keeping each phase's result un-flattened so a
/// caller can render the exact per-phase JSON shape described in spec §6.
pub fn evaluate_outcome(code: &str, limits: Limits) -> EvaluateOutcome {
    if let SyntaxReport::Err(err) = check_syntax(code) {
        return EvaluateOutcome::SyntaxFailed(err);
    }

    let violations = scan(code);
    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "security scan rejected code");
        return EvaluateOutcome::SecurityRejected {
            violations,
            platform_note: String::new(),
        };
    }

    match run_sandboxed(code, limits) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "sandbox launcher failed before producing a result");
            EvaluateOutcome::Executed {
                stdout: String::new(),
                stderr: format!("internal sandbox error: {err}"),
                exit_code: 1,
                platform_note: String::new(),
            }
        }
    }
}

fn run_sandboxed(code: &str, limits: Limits) -> Result<EvaluateOutcome, LauncherError> {
    let rendered = template::render(code);

    let mut script_file = tempfile::Builder::new()
        .prefix("pyexec-sandbox-")
        .suffix(".py")
        .tempfile()
        .map_err(LauncherError::ScriptWrite)?;
    script_file
        .write_all(rendered.as_bytes())
        .map_err(LauncherError::ScriptWrite)?;
    script_file.flush().map_err(LauncherError::ScriptWrite)?;
    let script_path = script_file.path().to_path_buf();

    let interpreter_path = interpreter::discover()?;

    let mut cmd = Command::new(&interpreter_path);
    cmd.arg(&script_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_remove("PYTHONPATH")
        .env("PYTHONUNBUFFERED", "1");

    tracing::debug!(interpreter = %interpreter_path.display(), "spawning sandboxed interpreter");

    let mut platform_note = PlatformResourceCage::cage(&limits, &mut cmd);

    let child = cmd.spawn().map_err(LauncherError::Spawn)?;

    #[cfg(windows)]
    {
        let note = crate::cage::windows::assign_and_resume(&limits, &child);
        if !note.is_empty() {
            platform_note = note;
        }
    }

    let deadline = Duration::from_secs_f64(limits.wall_timeout_seconds.max(0.0));
    let wait_result = wait_with_deadline(child, deadline, |pid| {
        #[cfg(unix)]
        crate::cage::unix::kill_group(pid);
        #[cfg(windows)]
        crate::cage::windows::kill_process(pid);
    });

    // `script_file` (a `NamedTempFile`) deletes its backing file on drop,
    // covering every return path below, including the error paths above.
    drop(script_file);

    match wait_result {
        Ok(WaitOutcome::TimedOut) => {
            tracing::warn!(
                seconds = limits.wall_timeout_seconds,
                "sandboxed evaluation exceeded wall-clock timeout"
            );
            Ok(EvaluateOutcome::Executed {
                stdout: String::new(),
                stderr: format!(
                    "Execution timed out after {} seconds",
                    limits.wall_timeout_seconds
                ),
                exit_code: 124,
                platform_note,
            })
        }
        Ok(WaitOutcome::Completed(output)) => Ok(parse_child_output(output, platform_note)),
        Err(err) => {
            tracing::error!(error = %err, "failed to wait on sandboxed interpreter");
            Ok(EvaluateOutcome::Executed {
                stdout: String::new(),
                stderr: "sandbox process could not be waited on".to_string(),
                exit_code: 1,
                platform_note,
            })
        }
    }
}

/// Parse the child's stdout as a [`ChildRecord`]. Any deviation — malformed
/// JSON, partial JSON, or a process that never wrote to stdout at all — is a
/// containment failure: the child broke its one contract (speak JSON on
/// stdout, nothing else), so its exit code is treated as nonzero regardless
/// of what the OS actually reported.
fn parse_child_output(output: std::process::Output, platform_note: String) -> EvaluateOutcome {
    match serde_json::from_slice::<ChildRecord>(&output.stdout) {
        Ok(record) => EvaluateOutcome::Executed {
            stdout: record.stdout,
            stderr: record.stderr,
            exit_code: record.exit_code,
            platform_note,
        },
        Err(_) => {
            let raw_stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let stderr = if raw_stderr.is_empty() {
                "sandboxed process produced no parseable result".to_string()
            } else {
                raw_stderr
            };
            let exit_code = if output.status.success() {
                1
            } else {
                output.status.code().unwrap_or(1)
            };
            EvaluateOutcome::Executed {
                stdout: String::new(),
                stderr,
                exit_code,
                platform_note,
            }
        }
    }
}
