use crate::judge::adapter::LanguageAdapter;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct PythonAdapter;

/// Record separator framing keeps the response line distinct from anything
/// else the interpreter may print.
pub const RESPONSE_MARKER: &str = "\u{1e}REVIEWBOX\u{1e}";

/// Request/response harness executed with `python3 -c`.
///
/// Reads one JSON request from stdin and prints one framed JSON response.
/// `parse` only runs the parser and reports top-level statement spans.
/// `load` and `call` compile the candidate source and execute it in a single
/// namespace whose `__builtins__` holds only the requested names. Every
/// exception, including `SystemExit` and `MemoryError`, is reported as an
/// error response.
pub const HARNESS: &str = r#"
import ast
import builtins
import inspect
import json
import sys

MARKER = "\x1eREVIEWBOX\x1e"


def _emit(payload):
    sys.stdout.write("\n" + MARKER + json.dumps(payload, allow_nan=False) + "\n")
    sys.stdout.flush()


def _fail(stage, exc):
    try:
        message = str(exc)
    except BaseException:
        message = "<unprintable>"
    _emit({
        "status": "error",
        "stage": stage,
        "error_type": type(exc).__name__,
        "message": message,
    })


def _encode(value):
    if value is None:
        return {"t": "none"}
    if isinstance(value, bool):
        return {"t": "bool", "v": value}
    if isinstance(value, int):
        return {"t": "int", "v": str(int(value))}
    if isinstance(value, float):
        return {"t": "float", "v": value}
    if isinstance(value, str):
        return {"t": "str", "v": value}
    if isinstance(value, list):
        return {"t": "list", "v": [_encode(item) for item in value]}
    if isinstance(value, tuple):
        return {"t": "tuple", "v": [_encode(item) for item in value]}
    if isinstance(value, (set, frozenset)):
        return {"t": "set", "v": [_encode(item) for item in sorted(value, key=repr)]}
    if isinstance(value, dict):
        return {"t": "dict", "v": [[str(key), _encode(item)] for key, item in value.items()]}
    raise TypeError("unsupported return type: " + type(value).__name__)


def _node_kind(node):
    if isinstance(node, (ast.FunctionDef, ast.AsyncFunctionDef)):
        return "function"
    if isinstance(node, ast.ClassDef):
        return "class"
    if isinstance(node, (ast.Import, ast.ImportFrom)):
        return "import"
    return "other"


def _functions(node):
    found = [
        child
        for child in ast.walk(node)
        if isinstance(child, (ast.FunctionDef, ast.AsyncFunctionDef))
    ]
    found.sort(key=lambda child: (child.lineno, child.col_offset))
    return [child.name for child in found]


def _parse(request):
    try:
        tree = ast.parse(request["source"], "<candidate>", "exec")
    except SyntaxError as exc:
        _emit({
            "status": "error",
            "stage": "compile",
            "error_type": type(exc).__name__,
            "message": exc.msg or "invalid syntax",
            "line": exc.lineno,
        })
        return
    except BaseException as exc:
        _fail("compile", exc)
        return
    nodes = []
    for node in tree.body:
        decorators = getattr(node, "decorator_list", [])
        nodes.append({
            "kind": _node_kind(node),
            "name": getattr(node, "name", None),
            "line": min([node.lineno] + [d.lineno for d in decorators]),
            "col": 0 if decorators else node.col_offset,
            "end_line": node.end_lineno,
            "end_col": node.end_col_offset,
            "functions": _functions(node),
        })
    _emit({"status": "ok", "nodes": nodes})


def _params(obj):
    try:
        signature = inspect.signature(obj)
    except (TypeError, ValueError):
        return []
    return [
        {
            "name": name,
            "kind": param.kind.name.lower(),
            "has_default": param.default is not inspect.Parameter.empty,
        }
        for name, param in signature.parameters.items()
    ]


def _load(request):
    try:
        code = compile(request["source"], "<candidate>", "exec")
    except BaseException as exc:
        _fail("compile", exc)
        return None
    safe = {
        name: getattr(builtins, name)
        for name in request.get("builtins", [])
        if hasattr(builtins, name)
    }
    namespace = {"__builtins__": safe, "__name__": "candidate"}
    try:
        exec(code, namespace)
    except BaseException as exc:
        _fail("load", exc)
        return None
    return namespace


def _symbols(namespace):
    symbols = []
    for name, obj in namespace.items():
        if name.startswith("__"):
            continue
        is_callable = callable(obj)
        symbols.append({
            "name": name,
            "callable": is_callable,
            "params": _params(obj) if is_callable else [],
        })
    return symbols


def _call(request, namespace):
    name = request.get("function") or ""
    target = namespace.get(name)
    if name.startswith("__") or target is None or not callable(target):
        _emit({
            "status": "error",
            "stage": "load",
            "error_type": "LookupError",
            "message": "Function '" + name + "' not found or not callable",
        })
        return
    try:
        result = target(*request.get("args", []), **request.get("kwargs", {}))
    except BaseException as exc:
        _fail("call", exc)
        return
    try:
        payload = {
            "status": "ok",
            "output": _encode(result),
            "output_type": type(result).__name__,
        }
        _emit(payload)
    except BaseException as exc:
        _fail("encode", exc)


def _main():
    try:
        request = json.loads(sys.stdin.read())
        op = request["op"]
    except BaseException as exc:
        _fail("protocol", exc)
        return
    if op == "parse":
        _parse(request)
        return
    namespace = _load(request)
    if namespace is None:
        return
    if op == "load":
        _emit({"status": "ok", "symbols": _symbols(namespace)})
    elif op == "call":
        _call(request, namespace)
    else:
        _emit({
            "status": "error",
            "stage": "protocol",
            "error_type": "ValueError",
            "message": "unknown op: " + str(op),
        })


_main()
"#;

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> &'static str {
        "python"
    }

    fn response_marker(&self) -> &'static str {
        RESPONSE_MARKER
    }

    fn worker_command(&self, interpreter: &Path) -> Vec<String> {
        // -I: isolated mode (no env vars, no user site), -S: skip site,
        // -B: never write bytecode
        vec![
            interpreter.to_string_lossy().to_string(),
            "-I".to_string(),
            "-S".to_string(),
            "-B".to_string(),
            "-c".to_string(),
            HARNESS.to_string(),
        ]
    }

    fn version_command(&self, interpreter: &Path) -> Vec<String> {
        vec![
            interpreter.to_string_lossy().to_string(),
            "-I".to_string(),
            "-S".to_string(),
            "--version".to_string(),
        ]
    }
}
