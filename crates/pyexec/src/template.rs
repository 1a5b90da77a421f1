//! Renders the inner runtime template: the Python source that actually runs
//! inside the child interpreter.
//!
//! The template is assembled by string substitution, never by splicing the
//! user's tokens into a larger program — the user's code is embedded as a
//! single `repr()`-escaped string literal and handed to `exec()` at the very
//! end. This is deliberate: it is the one place in the pipeline where
//! "stitch untrusted text into source" would be tempting, and the template
//! avoids it by keeping the untrusted text as *data* (a string value) rather
//! than *code* until the single, audited `exec()` call.

use crate::analyzer::{DANGEROUS_MODULES, DANGEROUS_NAMES};

/// The template's own `SAFE_BUILTINS` exclusion list: every statically
/// flagged dangerous name except `open`/`input`, which the template shadows
/// directly in `safe_globals` rather than evicting from `builtins`.
pub fn template_dangerous_names() -> Vec<&'static str> {
    DANGEROUS_NAMES
        .iter()
        .copied()
        .filter(|name| *name != "open" && *name != "input")
        .collect()
}

/// The template's own `sys.modules` eviction list. `sys` stays reachable
/// because the template needs it at module scope for stdio redirection and
/// terminal JSON emission; `platform` stays reachable once the riskier
/// modules around it are gone. `getpass` is added even though the analyzer
/// doesn't statically flag it under a distinct name collision, matching the
/// eviction list the rendered script has always carried.
pub fn template_dangerous_modules() -> Vec<&'static str> {
    let mut modules: Vec<&'static str> = DANGEROUS_MODULES
        .iter()
        .copied()
        .filter(|module| *module != "sys" && *module != "platform")
        .collect();
    if !modules.contains(&"getpass") {
        modules.push("getpass");
    }
    modules
}

/// Render the full inner runtime template for `user_code`.
///
/// The returned string is a complete, standalone Python program: write it to
/// a file and hand that file to an interpreter. Its only contract with the
/// launcher is the final line it emits on stdout — a single JSON object
/// shaped like [`crate::types::ChildRecord`].
pub fn render(user_code: &str) -> String {
    let dangerous_names_literal = py_str_list(&template_dangerous_names());
    let dangerous_modules_literal = py_str_list(&template_dangerous_modules());
    let user_code_literal = py_repr(user_code);

    format!(
        r#"import sys

# Neutralize any debugger trace hooks inherited from the parent process.
sys.settrace(None)
if hasattr(sys, 'gettrace') and sys.gettrace() is not None:
    sys.settrace(None)
for mod in list(sys.modules):
    if mod.startswith(('debugpy', 'pydevd', '_pydev')):
        del sys.modules[mod]

import json
import io
import builtins

DANGEROUS_MODULES = {dangerous_modules_literal}
DANGEROUS_NAMES = {dangerous_names_literal}

for mod in DANGEROUS_MODULES:
    if mod in sys.modules:
        del sys.modules[mod]

SAFE_BUILTINS = {{
    name: getattr(builtins, name)
    for name in dir(builtins)
    if name not in DANGEROUS_NAMES and not name.startswith('_')
}}


def _restricted_import(name, globals=None, locals=None, fromlist=(), level=0):
    raise ImportError("All imports disabled in sandbox")


def _disabled_open(*args, **kwargs):
    raise OSError("open() disabled in sandbox")


safe_globals = {{
    '__builtins__': SAFE_BUILTINS,
    '__import__': _restricted_import,
    'open': _disabled_open,
}}

stdout_buffer = io.StringIO()
stderr_buffer = io.StringIO()


def _safe_print(*args, **kwargs):
    kwargs['file'] = stdout_buffer
    kwargs['flush'] = True
    print(*args, **kwargs)


safe_globals['print'] = _safe_print

exit_code = 0
try:
    exec({user_code_literal}, safe_globals)
except BaseException as e:
    stderr_buffer.write(f"{{type(e).__name__}}: {{e}}")
    exit_code = 1
finally:
    result = {{
        "stdout": stdout_buffer.getvalue(),
        "stderr": stderr_buffer.getvalue(),
        "exit_code": exit_code,
    }}
    sys.stdout.write(json.dumps(result))
    sys.stdout.flush()
"#
    )
}

/// Render a Rust string as a Python string literal via the same mechanism
/// `repr()` uses: the user's source becomes a single-quoted or
/// double-quoted Python string, never raw source text.
fn py_repr(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn py_str_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{s}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_user_code_as_literal() {
        let rendered = render("print('hi')");
        assert!(rendered.contains("exec(\"print('hi')\""));
    }

    #[test]
    fn test_render_escapes_embedded_quotes() {
        let rendered = render(r#"print("quoted")"#);
        assert!(rendered.contains(r#"\"quoted\""#));
    }

    #[test]
    fn test_render_escapes_newlines_as_single_line_literal() {
        let rendered = render("a = 1\nb = 2\n");
        // The whole user program collapses into one Python string literal
        // (no raw newlines inside the quotes), even though it spans
        // multiple lines of user source.
        let start = rendered.find("exec(\"").unwrap() + "exec(\"".len();
        let end = rendered[start..].find("\", safe_globals)").unwrap() + start;
        assert!(!rendered[start..end].contains('\n'));
        assert!(rendered[start..end].contains("\\n"));
    }

    #[test]
    fn test_render_includes_all_template_dangerous_names() {
        let rendered = render("pass");
        for name in template_dangerous_names() {
            assert!(rendered.contains(name), "missing dangerous name {name}");
        }
    }

    #[test]
    fn test_render_includes_all_template_dangerous_modules() {
        let rendered = render("pass");
        for module in template_dangerous_modules() {
            assert!(rendered.contains(module), "missing dangerous module {module}");
        }
    }

    #[test]
    fn test_render_excludes_open_and_input_from_names_literal() {
        let rendered = render("pass");
        let start = rendered.find("DANGEROUS_NAMES = [").unwrap();
        let end = rendered[start..].find(']').unwrap() + start;
        let literal = &rendered[start..end];
        assert!(!literal.contains("'open'"));
        assert!(!literal.contains("'input'"));
    }

    #[test]
    fn test_render_excludes_sys_and_platform_from_modules_literal() {
        let rendered = render("pass");
        let start = rendered.find("DANGEROUS_MODULES = [").unwrap();
        let end = rendered[start..].find(']').unwrap() + start;
        let literal = &rendered[start..end];
        assert!(!literal.contains("'sys'"));
        assert!(!literal.contains("'platform'"));
        assert!(literal.contains("'socket'"));
        assert!(literal.contains("'getpass'"));
    }

    #[test]
    fn test_render_disables_open() {
        let rendered = render("pass");
        assert!(rendered.contains("open() disabled in sandbox"));
    }

    #[test]
    fn test_render_emits_terminal_json_write() {
        let rendered = render("pass");
        assert!(rendered.contains("sys.stdout.write(json.dumps(result))"));
    }
}
