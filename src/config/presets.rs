/// Sandbox policy presets
///
/// A sandbox policy is the explicit, immutable and versioned set of builtins a
/// candidate module may see. Policies are built once per process and shared
/// by reference; nothing mutates them after startup.
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Builtins exposed to candidate code under the restricted-v1 policy.
/// Arithmetic and comparison are language operators and need no entry here.
const RESTRICTED_V1_BUILTINS: &[&str] = &[
    "abs",
    "all",
    "any",
    "bool",
    "dict",
    "enumerate",
    "float",
    "int",
    "isinstance",
    "len",
    "list",
    "max",
    "min",
    "range",
    "reversed",
    "round",
    "set",
    "sorted",
    "str",
    "sum",
    "tuple",
    "zip",
];

/// Interpreter hooks required for definitions to evaluate at all.
/// `__build_class__` backs `class` statements; without it only functions load.
const RESTRICTED_V1_HOOKS: &[&str] = &["__build_class__"];

/// Builtins that must never appear in any policy.
const FORBIDDEN_BUILTINS: &[&str] = &[
    "__import__",
    "breakpoint",
    "compile",
    "delattr",
    "eval",
    "exec",
    "getattr",
    "globals",
    "input",
    "locals",
    "open",
    "setattr",
    "vars",
];

/// Immutable sandbox policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    /// Policy ID (e.g., "restricted-v1")
    pub id: String,
    /// Version of this policy
    pub version: String,
    /// Builtin names visible to candidate code
    pub allowed_builtins: Vec<String>,
    /// Interpreter hooks visible to candidate code
    pub hooks: Vec<String>,
}

impl SandboxPolicy {
    /// Every name the worker exposes through `__builtins__`
    pub fn exposed_names(&self) -> Vec<String> {
        self.allowed_builtins
            .iter()
            .chain(self.hooks.iter())
            .cloned()
            .collect()
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed_builtins.iter().any(|b| b == name) || self.hooks.iter().any(|h| h == name)
    }

    /// Names in this policy that are on the forbidden list
    pub fn forbidden_entries(&self) -> Vec<&str> {
        FORBIDDEN_BUILTINS
            .iter()
            .copied()
            .filter(|name| self.allows(name))
            .collect()
    }
}

fn restricted_v1() -> SandboxPolicy {
    SandboxPolicy {
        id: "restricted-v1".to_string(),
        version: "1.0".to_string(),
        allowed_builtins: RESTRICTED_V1_BUILTINS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        hooks: RESTRICTED_V1_HOOKS.iter().map(|s| s.to_string()).collect(),
    }
}

static STANDARD_POLICY: Lazy<Arc<SandboxPolicy>> = Lazy::new(|| Arc::new(restricted_v1()));

/// The process-wide default policy
pub fn standard_policy() -> Arc<SandboxPolicy> {
    Arc::clone(&STANDARD_POLICY)
}
