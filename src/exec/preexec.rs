/// Pre-Exec Setup for worker processes
///
/// The sequence is fixed and runs in the forked child before exec:
/// 1. setsid() so the worker leads its own process group
/// 2. prctl(PR_SET_PDEATHSIG, SIGKILL) on Linux
/// 3. apply the rlimit set computed by the parent
///
/// Everything the child needs is computed before fork. The child only issues
/// raw syscalls: no allocation, no logging, no locks.
use crate::config::types::ReviewConfig;
use nix::sys::resource::{setrlimit, Resource};
use std::io;

/// One rlimit to apply in the child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlimitValue {
    pub name: &'static str,
    pub resource: Resource,
    pub soft: u64,
    pub hard: u64,
}

/// Resource envelope of a single worker process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerLimits {
    rlimits: Vec<RlimitValue>,
}

impl WorkerLimits {
    /// Derive the rlimit set from review configuration
    pub fn from_config(config: &ReviewConfig) -> Self {
        let mut rlimits = Vec::new();

        if let Some(memory_limit) = config.memory_limit {
            rlimits.push(RlimitValue {
                name: "RLIMIT_AS",
                resource: Resource::RLIMIT_AS,
                soft: memory_limit,
                hard: memory_limit,
            });
        }

        // soft = limit_secs -> SIGXCPU, hard = limit_secs+1 -> SIGKILL
        if let Some(cpu_ms) = config.cpu_time_limit_ms {
            let cpu_secs = cpu_ms.div_ceil(1000).max(1);
            rlimits.push(RlimitValue {
                name: "RLIMIT_CPU",
                resource: Resource::RLIMIT_CPU,
                soft: cpu_secs,
                hard: cpu_secs + 1,
            });
        }

        if let Some(fd_limit) = config.fd_limit {
            rlimits.push(RlimitValue {
                name: "RLIMIT_NOFILE",
                resource: Resource::RLIMIT_NOFILE,
                soft: fd_limit,
                hard: fd_limit,
            });
        }

        if let Some(file_size_limit) = config.file_size_limit {
            rlimits.push(RlimitValue {
                name: "RLIMIT_FSIZE",
                resource: Resource::RLIMIT_FSIZE,
                soft: file_size_limit,
                hard: file_size_limit,
            });
        }

        if let Some(process_limit) = config.process_limit {
            rlimits.push(RlimitValue {
                name: "RLIMIT_NPROC",
                resource: Resource::RLIMIT_NPROC,
                soft: process_limit,
                hard: process_limit,
            });
        }

        rlimits.push(RlimitValue {
            name: "RLIMIT_CORE",
            resource: Resource::RLIMIT_CORE,
            soft: 0,
            hard: 0,
        });

        Self { rlimits }
    }

    pub fn rlimits(&self) -> &[RlimitValue] {
        &self.rlimits
    }

    pub fn get(&self, name: &str) -> Option<&RlimitValue> {
        self.rlimits.iter().find(|r| r.name == name)
    }

    /// Run the pre-exec sequence. Must only be called in the forked child.
    pub fn apply_in_child(&self) -> io::Result<()> {
        nix::unistd::setsid().map_err(io::Error::from)?;
        setup_parent_death_signal()?;

        for limit in &self.rlimits {
            setrlimit(
                limit.resource,
                limit.soft as libc::rlim_t,
                limit.hard as libc::rlim_t,
            )
            .map_err(io::Error::from)?;
        }
        Ok(())
    }
}

/// Worker receives SIGKILL if the spawning thread goes away
fn setup_parent_death_signal() -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        let rc = unsafe { libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_from_default_config() {
        let limits = WorkerLimits::from_config(&ReviewConfig::default());
        let as_limit = limits.get("RLIMIT_AS").unwrap();
        assert_eq!(as_limit.soft, 256 * 1024 * 1024);
        assert_eq!(as_limit.soft, as_limit.hard);

        let cpu = limits.get("RLIMIT_CPU").unwrap();
        assert_eq!(cpu.soft, 3);
        assert_eq!(cpu.hard, 4);

        assert_eq!(limits.get("RLIMIT_FSIZE").unwrap().soft, 0);
        assert_eq!(limits.get("RLIMIT_CORE").unwrap().hard, 0);
    }

    #[test]
    fn test_cpu_limit_rounds_up() {
        let config = ReviewConfig {
            cpu_time_limit_ms: Some(1500),
            ..ReviewConfig::default()
        };
        let limits = WorkerLimits::from_config(&config);
        assert_eq!(limits.get("RLIMIT_CPU").unwrap().soft, 2);

        let config = ReviewConfig {
            cpu_time_limit_ms: Some(10),
            ..ReviewConfig::default()
        };
        let limits = WorkerLimits::from_config(&config);
        assert_eq!(limits.get("RLIMIT_CPU").unwrap().soft, 1);
    }

    #[test]
    fn test_unset_limits_are_skipped() {
        let config = ReviewConfig {
            memory_limit: None,
            cpu_time_limit_ms: None,
            fd_limit: None,
            file_size_limit: None,
            process_limit: None,
            ..ReviewConfig::default()
        };
        let limits = WorkerLimits::from_config(&config);
        assert_eq!(limits.rlimits().len(), 1);
        assert_eq!(limits.rlimits()[0].name, "RLIMIT_CORE");
    }
}
