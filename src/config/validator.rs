// Config Validation
// Startup validation of limits, paths and the sandbox policy.
// Any error is fatal: a reviewer never starts with an unbounded worker envelope.

use crate::config::presets::SandboxPolicy;
use crate::config::types::{ReviewConfig, ReviewError, Result};
use std::path::Path;

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validate config at startup. Errors fail fast; warnings are returned.
pub fn validate_config(config: &ReviewConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_limits(config, &mut result);
    validate_paths(config, &mut result);

    if !result.is_valid() {
        let error_msg = format!("Config validation failed:\n{}", result.errors.join("\n"));
        return Err(ReviewError::Config(error_msg));
    }

    for warning in &result.warnings {
        log::warn!("config: {}", warning);
    }

    Ok(result)
}

/// Validate a sandbox policy before it is handed to workers
pub fn validate_policy(policy: &SandboxPolicy) -> Result<()> {
    let forbidden = policy.forbidden_entries();
    if !forbidden.is_empty() {
        return Err(ReviewError::Config(format!(
            "policy {} exposes forbidden builtins: {}",
            policy.id,
            forbidden.join(", ")
        )));
    }
    if policy.allowed_builtins.is_empty() {
        return Err(ReviewError::Config(format!(
            "policy {} exposes no builtins",
            policy.id
        )));
    }
    Ok(())
}

/// Validate resource limits
fn validate_limits(config: &ReviewConfig, result: &mut ValidationResult) {
    if let Some(memory_limit) = config.memory_limit {
        if memory_limit == 0 {
            result.add_error("memory_limit cannot be zero".to_string());
        } else if memory_limit < 32 * 1024 * 1024 {
            result.add_warning(format!(
                "memory_limit {} is very low (< 32MB), the interpreter may fail to start",
                memory_limit
            ));
        }
    } else {
        result.add_warning("memory_limit is unset, workers have no address space cap".to_string());
    }

    if config.call_wall_time_limit_ms == 0 {
        result.add_error("call_wall_time_limit_ms cannot be zero".to_string());
    }
    if config.load_wall_time_limit_ms == 0 {
        result.add_error("load_wall_time_limit_ms cannot be zero".to_string());
    }

    if let Some(cpu_time) = config.cpu_time_limit_ms {
        if cpu_time == 0 {
            result.add_error("cpu_time_limit_ms cannot be zero".to_string());
        } else if cpu_time > config.call_wall_time_limit_ms {
            result.add_warning(format!(
                "cpu_time_limit_ms ({}) exceeds call_wall_time_limit_ms ({}), the wall clock will fire first",
                cpu_time, config.call_wall_time_limit_ms
            ));
        }
    }

    if let Some(process_limit) = config.process_limit {
        if process_limit == 0 {
            result.add_error("process_limit cannot be zero".to_string());
        }
    }

    if let Some(fd_limit) = config.fd_limit {
        if fd_limit < 4 {
            result.add_error(format!(
                "fd_limit {} is too low, workers need stdin/stdout/stderr",
                fd_limit
            ));
        }
    }

    if config.max_parallel == 0 {
        result.add_error("max_parallel cannot be zero".to_string());
    }

    if config.output_limit_bytes == 0 {
        result.add_error("output_limit_bytes cannot be zero".to_string());
    }
}

/// Validate paths
fn validate_paths(config: &ReviewConfig, result: &mut ValidationResult) {
    if !config.interpreter.is_absolute() {
        result.add_error(format!(
            "interpreter must be an absolute path: {:?}",
            config.interpreter
        ));
    } else if !config.interpreter.exists() {
        result.add_warning(format!(
            "interpreter does not exist: {:?}",
            config.interpreter
        ));
    }

    if let Some(ref audit_log) = config.audit_log {
        if let Some(parent) = audit_log.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                result.add_error(format!(
                    "audit_log parent directory does not exist: {:?}",
                    parent
                ));
            }
        }
    }
}

/// Report which host facilities a worker relies on are missing
pub fn check_system_capabilities(config: &ReviewConfig) -> Vec<String> {
    let mut missing = Vec::new();

    if !config.interpreter.exists() {
        missing.push(format!(
            "interpreter not found: {}",
            config.interpreter.display()
        ));
    }

    #[cfg(not(target_os = "linux"))]
    {
        missing.push("rlimit enforcement is only verified on Linux".to_string());
    }

    #[cfg(target_os = "linux")]
    {
        if !Path::new("/proc/self/limits").exists() {
            missing.push("/proc not mounted, rlimits cannot be inspected".to_string());
        }
    }

    missing
}
