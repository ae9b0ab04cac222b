use crate::config::types::{ReviewError, Result};
use crate::core::types::{KillReport, WorkerOutcome, WorkerProfile};
use crate::utils::output::{OutputCollector, OutputLimits};
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use std::io::Write;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// How long to keep draining pipes after the worker is gone
const OUTPUT_GRACE: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn to_process_error(prefix: &str, err: impl std::fmt::Display) -> ReviewError {
    ReviewError::Process(format!("{prefix}: {err}"))
}

/// Kill the worker's whole process group. The worker called setsid() before
/// exec, so its pid is also its group id.
fn terminate_worker_group(pid: Pid) -> KillReport {
    let mut report = KillReport::default();
    let start = Instant::now();

    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => report.kill_sent = true,
        Err(group_err) => {
            let _ = kill(pid, Signal::SIGKILL);
            report.kill_sent = true;
            report
                .notes
                .push(format!("group SIGKILL fallback used: {}", group_err));
        }
    }

    report.waited_ms = start.elapsed().as_millis() as u64;
    report
}

/// Launch one worker process, feed it stdin, and wait for it under the
/// profile's wall-clock limit. Resource limits are applied in the child
/// before exec.
pub fn launch_worker(profile: &WorkerProfile) -> Result<WorkerOutcome> {
    let Some((program, args)) = profile.command.split_first() else {
        return Err(ReviewError::Config("empty command".to_string()));
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env_clear()
        .envs(profile.environment.iter().map(|(k, v)| (k, v)))
        .current_dir(&profile.workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if profile.stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    let limits = profile.limits.clone();
    // SAFETY: apply_in_child only issues setsid/prctl/setrlimit syscalls and
    // touches no state shared with the parent.
    unsafe {
        cmd.pre_exec(move || limits.apply_in_child());
    }

    let started = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| to_process_error(&format!("spawn({})", program), e))?;
    let pid = Pid::from_raw(child.id() as i32);
    log::debug!("worker {} started: {}", pid, program);

    let collector = OutputCollector::new(OutputLimits::uniform(profile.output_limit_bytes));
    let pending = collector.start(child.stdout.take(), child.stderr.take());

    // Feed stdin from a helper thread so a worker that never reads cannot
    // block the watchdog.
    if let (Some(data), Some(mut stdin)) = (profile.stdin_data.clone(), child.stdin.take()) {
        std::thread::spawn(move || {
            let _ = stdin.write_all(data.as_bytes());
        });
    }

    let mut timed_out = false;
    let mut kill_report = None;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if started.elapsed() > profile.wall_time_limit {
                    timed_out = true;
                    kill_report = Some(terminate_worker_group(pid));
                    log::info!(
                        "worker {} exceeded wall limit of {}ms",
                        pid,
                        profile.wall_time_limit.as_millis()
                    );
                    match child.wait() {
                        Ok(status) => break status,
                        Err(e) => return Err(to_process_error("wait(worker)", e)),
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = terminate_worker_group(pid);
                let _ = child.wait();
                return Err(to_process_error("wait(worker)", e));
            }
        }
    };
    let wall_time_ms = started.elapsed().as_millis() as u64;

    let output = pending.finish(OUTPUT_GRACE);

    Ok(WorkerOutcome {
        pid: Some(pid.as_raw()),
        exit_code: status.code(),
        term_signal: status.signal(),
        timed_out,
        wall_time_ms,
        stdout: output.stdout_lossy(),
        stderr: output.stderr_lossy(),
        output_integrity: output.combined_integrity(),
        kill_report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ReviewConfig, WorkerStatus};
    use std::path::Path;

    fn sh_profile(script: &str, wall_ms: u64) -> WorkerProfile {
        WorkerProfile::from_config(
            &ReviewConfig::default(),
            vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()],
            Duration::from_millis(wall_ms),
        )
    }

    #[test]
    fn test_empty_command_rejected() {
        let profile = WorkerProfile::from_config(
            &ReviewConfig::default(),
            Vec::new(),
            Duration::from_secs(1),
        );
        assert!(matches!(
            launch_worker(&profile),
            Err(ReviewError::Config(_))
        ));
    }

    #[test]
    fn test_launch_collects_stdout_and_stdin() {
        if !Path::new("/bin/sh").exists() {
            println!("Skipping: /bin/sh not available");
            return;
        }
        let profile = sh_profile("read line; echo \"got $line\"", 5_000)
            .with_stdin("payload\n".to_string());
        let outcome = launch_worker(&profile).unwrap();
        assert_eq!(outcome.status(), WorkerStatus::Ok);
        assert_eq!(outcome.stdout.trim(), "got payload");
    }

    #[test]
    fn test_environment_is_cleared() {
        if !Path::new("/bin/sh").exists() {
            println!("Skipping: /bin/sh not available");
            return;
        }
        std::env::set_var("REVIEWBOX_LEAK_CHECK", "leaked");
        let outcome = launch_worker(&sh_profile("echo \"[$REVIEWBOX_LEAK_CHECK]\"", 5_000)).unwrap();
        assert_eq!(outcome.stdout.trim(), "[]");
    }

    #[test]
    fn test_wall_clock_timeout_kills_worker() {
        if !Path::new("/bin/sh").exists() {
            println!("Skipping: /bin/sh not available");
            return;
        }
        let started = Instant::now();
        let outcome = launch_worker(&sh_profile("while :; do :; done", 200)).unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.status(), WorkerStatus::TimeLimit);
        assert!(outcome.kill_report.map(|r| r.kill_sent).unwrap_or(false));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_nonzero_exit_is_runtime_error() {
        if !Path::new("/bin/sh").exists() {
            println!("Skipping: /bin/sh not available");
            return;
        }
        let outcome = launch_worker(&sh_profile("echo oops >&2; exit 3", 5_000)).unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.status(), WorkerStatus::RuntimeError);
        assert_eq!(outcome.stderr_tail(), "oops");
    }
}
