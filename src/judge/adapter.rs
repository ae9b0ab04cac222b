use std::path::Path;

/// Language adapter contract for sandbox workers.
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> &'static str;

    /// Prefix of the stdout line that carries the harness response
    fn response_marker(&self) -> &'static str;

    /// Full argv of a worker process running the harness
    fn worker_command(&self, interpreter: &Path) -> Vec<String>;

    /// Argv that prints the interpreter version, for dependency checks
    fn version_command(&self, interpreter: &Path) -> Vec<String>;
}
