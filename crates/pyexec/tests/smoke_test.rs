//! Smoke tests for the pyexec library's three pipeline phases.
//!
//! Syntax and security checks run without spawning anything, so they run
//! unconditionally. Full execution needs a real `python3`/`python` on
//! `PATH` and is marked `#[ignore]`.
//!
//! Run the fast tests with: `cargo test -p pyexec --test smoke_test`
//! Run everything, including the sandboxed subprocess tests, with:
//! `cargo test -p pyexec --test smoke_test -- --ignored`

use pyexec::{evaluate, Limits, Phase};

#[test]
fn test_syntax_error_short_circuits_before_execution() {
    let result = evaluate("def f(:", Limits::default());
    assert_eq!(result.phase, Phase::SyntaxCheck);
    assert_ne!(result.exit_code, 0);
}

#[test]
fn test_dangerous_call_short_circuits_before_execution() {
    let result = evaluate("eval('1 + 1')", Limits::default());
    assert_eq!(result.phase, Phase::SecurityCheck);
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("eval"));
}

#[test]
fn test_dangerous_import_short_circuits_before_execution() {
    let result = evaluate("import socket", Limits::default());
    assert_eq!(result.phase, Phase::SecurityCheck);
    assert_ne!(result.exit_code, 0);
}

#[test]
#[ignore = "requires a python3/python interpreter on PATH"]
fn test_execute_hello_world() {
    let result = evaluate(r#"print("hi")"#, Limits::default());
    assert_eq!(result.stdout, "hi\n");
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.phase, Phase::Execution);
}

#[test]
#[ignore = "requires a python3/python interpreter on PATH"]
fn test_execute_runtime_error_is_captured_not_propagated() {
    let result = evaluate("1 / 0", Limits::default());
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("ZeroDivisionError"));
}

#[test]
#[ignore = "requires a python3/python interpreter on PATH"]
fn test_execute_denied_module_raises_import_error_at_runtime() {
    // `random` passes the static scan (it's on neither the analyzer's nor
    // the template's dangerous-modules list); the template's `__import__`
    // replacement still denies it, since it blocks all imports at runtime
    // regardless of name.
    let result = evaluate("import random\nrandom.random()", Limits::default());
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("ImportError") || result.stderr.contains("disabled"));
}

#[test]
#[ignore = "requires a python3/python interpreter on PATH"]
fn test_execute_allows_permitted_modules() {
    let result = evaluate("import math\nprint(math.sqrt(16))", Limits::default());
    assert_eq!(result.stdout, "4.0\n");
    assert_eq!(result.exit_code, 0);
}

#[test]
#[ignore = "requires a python3/python interpreter on PATH"]
fn test_execute_no_output_yields_empty_stdout() {
    let result = evaluate("x = 1 + 1", Limits::default());
    assert_eq!(result.stdout, "");
    assert_eq!(result.exit_code, 0);
}
