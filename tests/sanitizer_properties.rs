//! Sanitizer properties over a corpus of generated-code shapes, parsed by a
//! real interpreter worker.
//!
//! Skipped when no system python3 is installed.

use reviewbox::config::presets::standard_policy;
use reviewbox::sandbox::Sandbox;
use reviewbox::sanitizer::{extract_function_name, sanitize, DefinitionKind};
use reviewbox::{ReviewConfig, SanitizationError};
use std::path::{Path, PathBuf};

fn parser() -> Option<Sandbox> {
    let interpreter = ["/usr/bin/python3", "/usr/local/bin/python3"]
        .iter()
        .map(PathBuf::from)
        .find(|p| Path::new(p).exists());
    let Some(interpreter) = interpreter else {
        eprintln!("python3 not found, skipping");
        return None;
    };
    let config = ReviewConfig {
        interpreter,
        ..ReviewConfig::default()
    };
    Some(Sandbox::new(config, standard_policy()).unwrap())
}

const CORPUS: &[&str] = &[
    "def fibonacci(n):\n    if n <= 0:\n        return []\n    seq = [0, 1]\n    while len(seq) < n:\n        seq.append(seq[-1] + seq[-2])\n    return seq[:n]\n\nprint(fibonacci(10))\n",
    "import math\nfrom collections import Counter\n\n\ndef find_duplicates(nums):\n    counts = Counter(nums)\n    return [n for n, c in counts.items() if c > 1]\n\n\nif __name__ == '__main__':\n    print(find_duplicates([1, 2, 2]))\n",
    "class Solver:\n    \"\"\"Docstring with def inside: def nope(): pass\"\"\"\n\n    def solve(self, n):\n        return n\n\n\nsolver = Solver()\n",
    "@staticmethod\ndef helper(x):\n    return x\n\ndef main(n):\n    total = 0\n    for i in range(n + 1):\n        total += i\n    return total\n\nresult = main(10)\n",
    "def f(a,\n      b=(1, 2),\n      *args, **kwargs):\n    text = '''\nprint('not top level')\n'''\n    return a\n",
    "# comment only line\r\ndef windows(n):\r\n    return n * 2\r\n\r\nwindows(3)\r\n",
    "try:\n    import numpy\nexcept ImportError:\n    numpy = None\n\ndef g():\n    return [\n        1,\n        2,\n    ]\n",
    "import math; total = sum(range(10))\ndef f(n):\n    return n  # done\n",
];

#[test]
fn test_sanitize_is_idempotent_over_corpus() {
    let Some(parser) = parser() else { return };
    for code in CORPUS {
        let once = sanitize(&parser, code).unwrap_or_else(|e| panic!("{code:?}: {e}"));
        let twice = sanitize(&parser, &once.sanitized).unwrap();
        assert_eq!(once.sanitized, twice.sanitized, "not idempotent for {code:?}");
        assert_eq!(once.definitions, twice.definitions);
        assert_eq!(once.digest, twice.digest);
        assert!(!once.sanitized.ends_with('\n'));
    }
}

#[test]
fn test_syntax_errors_are_rejected() {
    let Some(parser) = parser() else { return };
    let cases = [
        "def fibonacci(n) return n\n",
        "def f(x):\n    return x +\n",
        "def f(:\n    pass\n",
        "def f():\n    return 'abc\n",
        "  def f():\n    return 1\n",
        "def f():\n",
    ];
    for code in cases {
        match sanitize(&parser, code) {
            Err(SanitizationError::InvalidSource { line, .. }) => {
                assert!(line.is_some(), "{code:?}: no line reported")
            }
            other => panic!("{code:?}: expected invalid source, got {other:?}"),
        }
    }
}

#[test]
fn test_error_reports_offending_line() {
    let Some(parser) = parser() else { return };
    match sanitize(&parser, "def f():\n    return 1\n\nx = (1,\n") {
        Err(SanitizationError::InvalidSource { line, message }) => {
            assert_eq!(line, Some(4), "{message}")
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_top_level_calls_are_removed() {
    let Some(parser) = parser() else { return };
    let artifact = sanitize(&parser, CORPUS[0]).unwrap();
    assert!(!artifact.sanitized.contains("print(fibonacci(10))"));

    let artifact = sanitize(&parser, CORPUS[1]).unwrap();
    assert!(artifact.sanitized.starts_with("import math\nfrom collections import Counter\n"));
    assert!(!artifact.sanitized.contains("__main__"));
    assert_eq!(artifact.imports, 2);

    let artifact = sanitize(&parser, CORPUS[3]).unwrap();
    assert!(artifact.sanitized.starts_with("@staticmethod\ndef helper(x):"));
    assert!(!artifact.sanitized.contains("result = main(10)"));
    assert!(artifact.sanitized.contains("total += i"));
}

#[test]
fn test_semicolon_statement_is_not_kept_with_import() {
    let Some(parser) = parser() else { return };
    let artifact = sanitize(&parser, CORPUS[7]).unwrap();
    assert_eq!(artifact.sanitized, "import math\ndef f(n):\n    return n");
    assert_eq!(artifact.imports, 1);
}

#[test]
fn test_docstring_text_is_not_a_definition() {
    let Some(parser) = parser() else { return };
    let artifact = sanitize(&parser, CORPUS[2]).unwrap();
    assert_eq!(artifact.definitions.len(), 1);
    assert_eq!(artifact.definitions[0].name, "Solver");
    assert_eq!(artifact.definitions[0].kind, DefinitionKind::Class);
    assert!(!artifact.sanitized.contains("solver = Solver()"));
    assert_eq!(extract_function_name(&artifact).unwrap(), "solve");

    let code = "def outer():\n    \"\"\"\n    def fake(x):\n    \"\"\"\n    def inner(y):\n        return y\n    return inner\n";
    let artifact = sanitize(&parser, code).unwrap();
    assert_eq!(artifact.functions, vec!["outer", "inner"]);

    let code = "def solve(n):\n    '''Usage: def helper(x): ...'''\n    return n\n";
    let artifact = sanitize(&parser, code).unwrap();
    assert_eq!(extract_function_name(&artifact).unwrap(), "solve");
}

#[test]
fn test_multiline_string_body_survives() {
    let Some(parser) = parser() else { return };
    let artifact = sanitize(&parser, CORPUS[4]).unwrap();
    assert!(artifact.sanitized.contains("print('not top level')"));
    assert_eq!(artifact.definitions.len(), 1);
}

#[test]
fn test_crlf_is_normalized() {
    let Some(parser) = parser() else { return };
    let artifact = sanitize(&parser, CORPUS[5]).unwrap();
    assert_eq!(artifact.sanitized, "def windows(n):\n    return n * 2");
}

#[test]
fn test_guarded_import_blocks_are_dropped() {
    let Some(parser) = parser() else { return };
    let artifact = sanitize(&parser, CORPUS[6]).unwrap();
    assert_eq!(artifact.imports, 0);
    assert!(artifact.sanitized.starts_with("def g():"));
}

#[test]
fn test_digest_tracks_content() {
    let Some(parser) = parser() else { return };
    let a = sanitize(&parser, "def f():\n    return 1\n").unwrap();
    let b = sanitize(&parser, "def f():\n    return 2\n").unwrap();
    let c = sanitize(&parser, "x = 0\ndef f():\n    return 1\n").unwrap();
    assert_ne!(a.digest, b.digest);
    assert_eq!(a.digest, c.digest);
}

#[test]
fn test_no_definitions() {
    let Some(parser) = parser() else { return };
    assert_eq!(
        sanitize(&parser, "x = 1\ny = 2\n"),
        Err(SanitizationError::NoDefinitions)
    );
    assert_eq!(
        sanitize(&parser, "import os\n"),
        Err(SanitizationError::NoDefinitions)
    );
}
