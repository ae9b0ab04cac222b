// Worker cold-start benchmark
// Measures latency of a full load and a full call, each in a fresh interpreter
// Target: p50 < 100ms, p95 < 200ms for a trivial candidate

use reviewbox::config::presets::standard_policy;
use reviewbox::sandbox::{Invocation, Sandbox};
use reviewbox::{ReviewConfig, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const ITERATIONS: usize = 50;
const WARMUP_ITERATIONS: usize = 5;

const P50_TARGET: Duration = Duration::from_millis(100);
const P95_TARGET: Duration = Duration::from_millis(200);

const CANDIDATE: &str = "def square(n):\n    return n * n";

struct LatencyStats {
    p50: Duration,
    p95: Duration,
    min: Duration,
    max: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();
        let sum: Duration = samples.iter().sum();

        Self {
            p50: samples[len / 2],
            p95: samples[((len as f64 * 0.95) as usize).min(len - 1)],
            min: samples[0],
            max: samples[len - 1],
            mean: sum / len as u32,
        }
    }

    fn print(&self, label: &str) {
        println!("\n=== {} ===", label);
        println!("  p50:  {:?}", self.p50);
        println!("  p95:  {:?}", self.p95);
        println!("  min:  {:?}", self.min);
        println!("  max:  {:?}", self.max);
        println!("  mean: {:?}", self.mean);
        if self.p50 <= P50_TARGET && self.p95 <= P95_TARGET {
            println!("  PASS");
        } else {
            println!("  SLOW (targets p50 {:?}, p95 {:?})", P50_TARGET, P95_TARGET);
        }
    }
}

fn measure<F: FnMut()>(mut op: F) -> LatencyStats {
    for _ in 0..WARMUP_ITERATIONS {
        op();
    }
    let samples = (0..ITERATIONS)
        .map(|_| {
            let start = Instant::now();
            op();
            start.elapsed()
        })
        .collect();
    LatencyStats::from_samples(samples)
}

fn main() {
    let interpreter = PathBuf::from("/usr/bin/python3");
    if !interpreter.exists() {
        eprintln!("python3 not found at {}, skipping", interpreter.display());
        return;
    }
    let config = ReviewConfig {
        interpreter,
        ..ReviewConfig::default()
    };
    let sandbox = match Sandbox::new(config, standard_policy()) {
        Ok(sandbox) => sandbox,
        Err(e) => {
            eprintln!("cannot build sandbox: {}", e);
            return;
        }
    };

    println!("Worker cold start: {} iterations", ITERATIONS);

    measure(|| {
        let _ = sandbox.load(CANDIDATE);
    })
    .print("load");

    let callable = match sandbox
        .load(CANDIDATE)
        .and_then(|ns| sandbox.extract(&ns, "square"))
    {
        Ok(callable) => callable,
        Err(e) => {
            eprintln!("load failed: {}", e);
            return;
        }
    };
    measure(|| {
        let invocation = sandbox.invoke(&callable, vec![Value::Int(7)], Vec::new());
        debug_assert!(matches!(invocation, Invocation::Returned { .. }));
    })
    .print("call");
}
