/// Output Boundaries and Collector Robustness
///
/// Worker stdout/stderr are drained on background threads while the supervisor
/// waits on the process. Each stream is capped; bytes past the cap are read and
/// discarded so a chatty worker never blocks on a full pipe.
use crate::config::types::OutputIntegrity;
use std::io::{BufReader, Read};
use std::process::{ChildStderr, ChildStdout};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Output limits configuration
#[derive(Debug, Clone)]
pub struct OutputLimits {
    /// Per-stream stdout limit (bytes)
    pub stdout_limit: usize,
    /// Per-stream stderr limit (bytes)
    pub stderr_limit: usize,
}

impl OutputLimits {
    /// Same cap on both streams
    pub fn uniform(limit: usize) -> Self {
        OutputLimits {
            stdout_limit: limit,
            stderr_limit: limit,
        }
    }
}

impl Default for OutputLimits {
    fn default() -> Self {
        OutputLimits {
            stdout_limit: 1024 * 1024,
            stderr_limit: 64 * 1024,
        }
    }
}

/// Output collection result
#[derive(Debug, Clone, Default)]
pub struct OutputResult {
    /// Collected stdout
    pub stdout: Vec<u8>,
    /// Collected stderr
    pub stderr: Vec<u8>,
    /// Stdout integrity state
    pub stdout_integrity: OutputIntegrity,
    /// Stderr integrity state
    pub stderr_integrity: OutputIntegrity,
}

impl OutputResult {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Worst integrity state across both streams
    pub fn combined_integrity(&self) -> OutputIntegrity {
        let states = [&self.stdout_integrity, &self.stderr_integrity];
        if states.iter().any(|s| **s == OutputIntegrity::WriteError) {
            OutputIntegrity::WriteError
        } else if states
            .iter()
            .any(|s| **s == OutputIntegrity::TruncatedByJudgeLimit)
        {
            OutputIntegrity::TruncatedByJudgeLimit
        } else if states
            .iter()
            .any(|s| **s == OutputIntegrity::TruncatedByProgramClose)
        {
            OutputIntegrity::TruncatedByProgramClose
        } else {
            OutputIntegrity::Complete
        }
    }
}

type StreamResult = (Vec<u8>, OutputIntegrity);

/// Output collector with bounded collection
pub struct OutputCollector {
    limits: OutputLimits,
}

impl OutputCollector {
    /// Create new output collector with limits
    pub fn new(limits: OutputLimits) -> Self {
        OutputCollector { limits }
    }

    /// Start draining both streams in the background
    pub fn start(&self, stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> PendingOutput {
        PendingOutput {
            stdout: stdout.map(|s| spawn_reader(s, self.limits.stdout_limit)),
            stderr: stderr.map(|s| spawn_reader(s, self.limits.stderr_limit)),
        }
    }
}

/// Streams still being drained
pub struct PendingOutput {
    stdout: Option<Receiver<StreamResult>>,
    stderr: Option<Receiver<StreamResult>>,
}

impl PendingOutput {
    /// Wait for both readers to reach EOF, at most `timeout` in total.
    /// A reader still running at the deadline is abandoned and its stream is
    /// reported as truncated.
    pub fn finish(self, timeout: Duration) -> OutputResult {
        let deadline = Instant::now() + timeout;
        let (stdout, stdout_integrity) = receive_until(self.stdout, deadline);
        let (stderr, stderr_integrity) = receive_until(self.stderr, deadline);
        OutputResult {
            stdout,
            stderr,
            stdout_integrity,
            stderr_integrity,
        }
    }
}

fn receive_until(rx: Option<Receiver<StreamResult>>, deadline: Instant) -> StreamResult {
    let Some(rx) = rx else {
        return (Vec::new(), OutputIntegrity::Complete);
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => (Vec::new(), OutputIntegrity::TruncatedByJudgeLimit),
        Err(RecvTimeoutError::Disconnected) => {
            (Vec::new(), OutputIntegrity::TruncatedByProgramClose)
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, limit: usize) -> Receiver<StreamResult> {
    let (tx, rx) = channel();
    thread::spawn(move || collect_stream(stream, limit, tx));
    rx
}

/// Collect from a single stream with limit
fn collect_stream<R: Read>(stream: R, limit: usize, tx: Sender<StreamResult>) {
    let mut reader = BufReader::new(stream);
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut integrity = OutputIntegrity::Complete;

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buffer.len());
                if n > room {
                    buffer.extend_from_slice(&chunk[..room]);
                    integrity = OutputIntegrity::TruncatedByJudgeLimit;
                } else {
                    buffer.extend_from_slice(&chunk[..n]);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                integrity = if e.kind() == std::io::ErrorKind::BrokenPipe {
                    OutputIntegrity::TruncatedByProgramClose
                } else {
                    OutputIntegrity::WriteError
                };
                break;
            }
        }
    }

    let _ = tx.send((buffer, integrity));
}
