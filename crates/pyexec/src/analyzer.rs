//! Static pre-execution analysis: syntax validation and the dangerous-name /
//! dangerous-module scan.
//!
//! Both operations are pure functions over source text — neither touches the
//! filesystem nor spawns anything. They run before the [`crate::template`]
//! is ever rendered, so user code that fails either check never reaches an
//! interpreter at all.

use rustpython_parser::ast::{self, Expr, Stmt};
use rustpython_parser::{Parse, ParseError};

use crate::types::{SyntaxError, SyntaxReport, ViolationList};

/// Names that, if *called*, let user code reach outside the sandbox's
/// attenuated environment (reflection, re-entrant eval/exec, introspection
/// that leaks live object state, or raw file/stream access). This is the
/// full set the static scan rejects; the inner runtime template (see
/// [`crate::template`]) works from a narrower derived subset, since it
/// shadows `open`/`input` directly at runtime rather than needing to flag
/// them syntactically.
pub const DANGEROUS_NAMES: &[&str] = &[
    "__import__",
    "eval",
    "exec",
    "compile",
    "getattr",
    "setattr",
    "globals",
    "locals",
    "help",
    "dir",
    "vars",
    "breakpoint",
    "memoryview",
    "open",
    "input",
];

/// Modules that, if imported, grant filesystem, process, network, or
/// interpreter access the sandbox must deny. This is the full set the
/// static scan rejects; the template works from a narrower derived subset
/// (see [`crate::template::template_dangerous_modules`]), since it still
/// needs `sys` at module scope to redirect stdio and emit its terminal JSON
/// record, and `platform` is not itself dangerous enough to evict from
/// `sys.modules` once the riskier names are gone.
pub const DANGEROUS_MODULES: &[&str] = &[
    "os",
    "sys",
    "subprocess",
    "shutil",
    "socket",
    "requests",
    "urllib",
    "pathlib",
    "inspect",
    "types",
    "ctypes",
    "pickle",
    "marshal",
    "builtins",
    "platform",
    "resource",
    "signal",
];

/// Parse `code` and report whether it is syntactically valid Python.
///
/// This never executes or imports anything; it only runs the parser's
/// front end.
pub fn check_syntax(code: &str) -> SyntaxReport {
    match ast::Suite::parse(code, "<sandboxed-code>") {
        Ok(_) => SyntaxReport::Ok,
        Err(err) => SyntaxReport::Err(render_parse_error(code, &err)),
    }
}

fn render_parse_error(code: &str, err: &ParseError) -> SyntaxError {
    let row = err.location.row();
    let column = err.location.column();
    let context_line = code
        .lines()
        .nth(row.saturating_sub(1))
        .unwrap_or("")
        .trim()
        .to_string();
    SyntaxError {
        message: err.error.to_string(),
        line: Some(row as u32),
        column: Some(column as u32),
        context_line,
    }
}

/// Scan already-parsed-valid `code` for dangerous-name calls and
/// dangerous-module imports.
///
/// Returns an empty list when `code` is clean. Callers are expected to have
/// already confirmed `code` parses via [`check_syntax`]; a second parse
/// failure here still reports, rather than silently swallowing, the
/// problem — it pushes a single sentinel violation instead of returning an
/// empty list, since the caller's pipeline (see [`crate::launcher::evaluate`])
/// always checks syntax first and this branch should never actually be hit.
pub fn scan(code: &str) -> ViolationList {
    let mut violations = Vec::new();
    let Ok(body) = ast::Suite::parse(code, "<sandboxed-code>") else {
        violations.push("Syntax error (should have been caught earlier)".to_string());
        return violations;
    };
    for stmt in &body {
        walk_stmt(stmt, &mut violations);
    }
    violations
}

fn flag_import(name: &str, violations: &mut ViolationList) {
    let top_level = name.split('.').next().unwrap_or(name);
    if DANGEROUS_MODULES.contains(&name) || DANGEROUS_MODULES.contains(&top_level) {
        violations.push(format!("Import of dangerous module: {name}"));
    }
}

fn flag_import_from(name: &str, violations: &mut ViolationList) {
    let top_level = name.split('.').next().unwrap_or(name);
    if DANGEROUS_MODULES.contains(&name) || DANGEROUS_MODULES.contains(&top_level) {
        violations.push(format!("Import from dangerous module: {top_level}"));
    }
}

fn flag_call(name: &str, violations: &mut ViolationList) {
    if DANGEROUS_NAMES.contains(&name) {
        violations.push(format!("Call to dangerous function: {name}"));
    }
}

fn walk_body(body: &[Stmt], violations: &mut ViolationList) {
    for stmt in body {
        walk_stmt(stmt, violations);
    }
}

fn walk_stmt(stmt: &Stmt, violations: &mut ViolationList) {
    match stmt {
        Stmt::Import(node) => {
            for alias in &node.names {
                flag_import(alias.name.as_str(), violations);
            }
        }
        Stmt::ImportFrom(node) => {
            if let Some(module) = &node.module {
                flag_import_from(module.as_str(), violations);
            }
        }
        Stmt::FunctionDef(node) => walk_body(&node.body, violations),
        Stmt::AsyncFunctionDef(node) => walk_body(&node.body, violations),
        Stmt::ClassDef(node) => walk_body(&node.body, violations),
        Stmt::Return(node) => {
            if let Some(value) = &node.value {
                walk_expr(value, violations);
            }
        }
        Stmt::Delete(node) => {
            for target in &node.targets {
                walk_expr(target, violations);
            }
        }
        Stmt::Assign(node) => {
            for target in &node.targets {
                walk_expr(target, violations);
            }
            walk_expr(&node.value, violations);
        }
        Stmt::AugAssign(node) => {
            walk_expr(&node.target, violations);
            walk_expr(&node.value, violations);
        }
        Stmt::AnnAssign(node) => {
            walk_expr(&node.target, violations);
            if let Some(value) = &node.value {
                walk_expr(value, violations);
            }
        }
        Stmt::For(node) => {
            walk_expr(&node.target, violations);
            walk_expr(&node.iter, violations);
            walk_body(&node.body, violations);
            walk_body(&node.orelse, violations);
        }
        Stmt::AsyncFor(node) => {
            walk_expr(&node.target, violations);
            walk_expr(&node.iter, violations);
            walk_body(&node.body, violations);
            walk_body(&node.orelse, violations);
        }
        Stmt::While(node) => {
            walk_expr(&node.test, violations);
            walk_body(&node.body, violations);
            walk_body(&node.orelse, violations);
        }
        Stmt::If(node) => {
            walk_expr(&node.test, violations);
            walk_body(&node.body, violations);
            walk_body(&node.orelse, violations);
        }
        Stmt::With(node) => {
            for item in &node.items {
                walk_expr(&item.context_expr, violations);
            }
            walk_body(&node.body, violations);
        }
        Stmt::AsyncWith(node) => {
            for item in &node.items {
                walk_expr(&item.context_expr, violations);
            }
            walk_body(&node.body, violations);
        }
        Stmt::Raise(node) => {
            if let Some(exc) = &node.exc {
                walk_expr(exc, violations);
            }
            if let Some(cause) = &node.cause {
                walk_expr(cause, violations);
            }
        }
        Stmt::Try(node) => {
            walk_body(&node.body, violations);
            for handler in &node.handlers {
                match handler {
                    ast::ExceptHandler::ExceptHandler(h) => {
                        if let Some(ty) = &h.type_ {
                            walk_expr(ty, violations);
                        }
                        walk_body(&h.body, violations);
                    }
                }
            }
            walk_body(&node.orelse, violations);
            walk_body(&node.finalbody, violations);
        }
        Stmt::Assert(node) => {
            walk_expr(&node.test, violations);
            if let Some(msg) = &node.msg {
                walk_expr(msg, violations);
            }
        }
        Stmt::Expr(node) => walk_expr(&node.value, violations),
        _ => {}
    }
}

fn walk_expr(expr: &Expr, violations: &mut ViolationList) {
    match expr {
        Expr::Call(node) => {
            if let Expr::Name(name) = node.func.as_ref() {
                flag_call(name.id.as_str(), violations);
            }
            walk_expr(&node.func, violations);
            for arg in &node.args {
                walk_expr(arg, violations);
            }
            for kw in &node.keywords {
                walk_expr(&kw.value, violations);
            }
        }
        Expr::BoolOp(node) => {
            for value in &node.values {
                walk_expr(value, violations);
            }
        }
        Expr::NamedExpr(node) => {
            walk_expr(&node.target, violations);
            walk_expr(&node.value, violations);
        }
        Expr::BinOp(node) => {
            walk_expr(&node.left, violations);
            walk_expr(&node.right, violations);
        }
        Expr::UnaryOp(node) => walk_expr(&node.operand, violations),
        Expr::Lambda(node) => walk_expr(&node.body, violations),
        Expr::IfExp(node) => {
            walk_expr(&node.test, violations);
            walk_expr(&node.body, violations);
            walk_expr(&node.orelse, violations);
        }
        Expr::Dict(node) => {
            for key in node.keys.iter().flatten() {
                walk_expr(key, violations);
            }
            for value in &node.values {
                walk_expr(value, violations);
            }
        }
        Expr::Set(node) => {
            for elt in &node.elts {
                walk_expr(elt, violations);
            }
        }
        Expr::ListComp(node) => {
            walk_expr(&node.elt, violations);
            walk_comprehensions(&node.generators, violations);
        }
        Expr::SetComp(node) => {
            walk_expr(&node.elt, violations);
            walk_comprehensions(&node.generators, violations);
        }
        Expr::DictComp(node) => {
            walk_expr(&node.key, violations);
            walk_expr(&node.value, violations);
            walk_comprehensions(&node.generators, violations);
        }
        Expr::GeneratorExp(node) => {
            walk_expr(&node.elt, violations);
            walk_comprehensions(&node.generators, violations);
        }
        Expr::Await(node) => walk_expr(&node.value, violations),
        Expr::Yield(node) => {
            if let Some(value) = &node.value {
                walk_expr(value, violations);
            }
        }
        Expr::YieldFrom(node) => walk_expr(&node.value, violations),
        Expr::Compare(node) => {
            walk_expr(&node.left, violations);
            for comparator in &node.comparators {
                walk_expr(comparator, violations);
            }
        }
        Expr::Attribute(node) => walk_expr(&node.value, violations),
        Expr::Subscript(node) => {
            walk_expr(&node.value, violations);
            walk_expr(&node.slice, violations);
        }
        Expr::Starred(node) => walk_expr(&node.value, violations),
        Expr::List(node) => {
            for elt in &node.elts {
                walk_expr(elt, violations);
            }
        }
        Expr::Tuple(node) => {
            for elt in &node.elts {
                walk_expr(elt, violations);
            }
        }
        _ => {}
    }
}

fn walk_comprehensions(generators: &[ast::Comprehension], violations: &mut ViolationList) {
    for generator in generators {
        walk_expr(&generator.iter, violations);
        for condition in &generator.ifs {
            walk_expr(condition, violations);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_syntax_accepts_valid_code() {
        assert!(check_syntax("x = 1 + 2\nprint(x)").is_ok());
    }

    #[test]
    fn test_check_syntax_rejects_invalid_code() {
        let report = check_syntax("print(2 +");
        assert!(!report.is_ok());
        let SyntaxReport::Err(err) = report else {
            panic!("expected SyntaxReport::Err");
        };
        assert!(err.line.is_some());
    }

    #[test]
    fn test_scan_clean_code_has_no_violations() {
        assert!(scan("x = 1\nprint(x * 2)").is_empty());
    }

    #[test]
    fn test_scan_flags_eval_call() {
        let violations = scan("eval('1+1')");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("eval"));
    }

    #[test]
    fn test_scan_flags_dangerous_import() {
        let violations = scan("import os\nos.system('ls')");
        assert!(violations.iter().any(|v| v.contains("os")));
    }

    #[test]
    fn test_scan_flags_dangerous_import_from() {
        let violations = scan("from subprocess import Popen");
        assert!(violations
            .iter()
            .any(|v| v == "Import from dangerous module: subprocess"));
    }

    #[test]
    fn test_scan_flags_dotted_dangerous_import() {
        let violations = scan("import os.path");
        assert!(violations.iter().any(|v| v.contains("os.path")));
    }

    #[test]
    fn test_scan_does_not_flag_allowed_modules() {
        let violations = scan("import math\nimport json\nprint(math.pi)");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_scan_flags_sys_and_platform() {
        let violations = scan("import sys\nimport platform\nprint(sys.version)");
        assert!(violations.iter().any(|v| v.contains("sys")));
        assert!(violations.iter().any(|v| v.contains("platform")));
    }

    #[test]
    fn test_scan_finds_dangerous_call_nested_in_function() {
        let code = "def f():\n    return getattr(object(), 'x')\n";
        let violations = scan(code);
        assert!(violations.iter().any(|v| v.contains("getattr")));
    }

    #[test]
    fn test_scan_finds_dangerous_call_nested_in_comprehension() {
        let code = "values = [eval(x) for x in ['1']]\n";
        let violations = scan(code);
        assert!(violations.iter().any(|v| v.contains("eval")));
    }

    #[test]
    fn test_scan_flags_open_and_input_calls() {
        let violations = scan("x = input()\nf = open('f.txt')");
        assert!(violations.iter().any(|v| v.contains("input")));
        assert!(violations.iter().any(|v| v.contains("open")));
    }

    #[test]
    fn test_scan_preserves_duplicate_violations() {
        let violations = scan("eval('1')\neval('2')");
        assert_eq!(violations.len(), 2);
    }
}
