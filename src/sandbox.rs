//! Out-of-process sandbox for candidate code.
//!
//! Every parse, every `load` and every invocation runs in a fresh worker process under the
//! configured rlimits and wall clock. The worker sees only the builtins of the
//! injected [`SandboxPolicy`]. Nothing survives between requests: a
//! [`Namespace`] is the symbol table a load reported, and a [`Callable`] is a
//! handle that re-executes the module in a new worker on each call.

use crate::config::presets::SandboxPolicy;
use crate::config::types::{
    OutputIntegrity, ReviewConfig, Result, SandboxError, SanitizationError, WorkerStatus,
};
use crate::config::validator::validate_policy;
use crate::core::supervisor::launch_worker;
use crate::core::types::{
    ParamInfo, ParamKind, SourceNode, SymbolInfo, WireValue, WorkerOutcome, WorkerProfile,
    WorkerRequest, WorkerResponse, WorkerStage,
};
use crate::judge::adapter::LanguageAdapter;
use crate::judge::registry::adapter_for;
use crate::sanitizer::SourceParser;
use crate::value::Value;
use std::sync::Arc;
use std::time::Duration;

/// Symbols defined by a successfully loaded module
#[derive(Clone, Debug)]
pub struct Namespace {
    source: Arc<str>,
    symbols: Vec<SymbolInfo>,
}

impl Namespace {
    /// Namespace for `source` with an already known symbol table
    pub fn from_symbols(source: &str, symbols: Vec<SymbolInfo>) -> Self {
        Self {
            source: Arc::from(source),
            symbols,
        }
    }

    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.symbols
    }

    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.iter().find(|s| s.name == name)
    }
}

/// A callable symbol of a loaded module
#[derive(Clone, Debug)]
pub struct Callable {
    name: String,
    source: Arc<str>,
    params: Vec<ParamInfo>,
}

impl Callable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Names of parameters that can be bound by keyword
    pub fn keyword_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| {
                matches!(
                    p.kind,
                    ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
                )
            })
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Parameters that must be supplied by the caller
    pub fn required_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| {
                !p.has_default
                    && !matches!(p.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
            })
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Parameters that are not `*args` / `**kwargs`
    pub fn arity(&self) -> usize {
        self.params
            .iter()
            .filter(|p| !matches!(p.kind, ParamKind::VarPositional | ParamKind::VarKeyword))
            .count()
    }
}

/// Result of invoking a callable in a worker
#[derive(Clone, Debug, PartialEq)]
pub enum Invocation {
    Returned {
        output: Value,
        output_type: String,
    },
    Raised {
        stage: WorkerStage,
        error_type: String,
        message: String,
    },
    TimedOut {
        limit_ms: u64,
    },
    LimitExceeded(String),
    WorkerFailure(String),
}

/// What came back from one worker round trip
enum Exchange {
    Response(WorkerResponse),
    TimedOut { limit_ms: u64 },
    LimitExceeded(String),
    Failure(String),
}

pub struct Sandbox {
    config: ReviewConfig,
    policy: Arc<SandboxPolicy>,
    adapter: Box<dyn LanguageAdapter>,
}

impl Sandbox {
    pub fn new(config: ReviewConfig, policy: Arc<SandboxPolicy>) -> Result<Self> {
        validate_policy(&policy)?;
        let adapter = adapter_for(&config.language)?;
        Ok(Self {
            config,
            policy,
            adapter,
        })
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn policy(&self) -> &Arc<SandboxPolicy> {
        &self.policy
    }

    /// Parse `code` in a fresh worker without executing any of it and report
    /// its top-level statements.
    pub fn parse(&self, code: &str) -> std::result::Result<Vec<SourceNode>, SanitizationError> {
        let request = WorkerRequest::parse(code);

        match self.exchange(&request, self.config.load_timeout()) {
            Exchange::Response(WorkerResponse::Ok { nodes, .. }) => Ok(nodes),
            Exchange::Response(WorkerResponse::Error {
                stage: WorkerStage::Compile,
                error_type,
                message,
                line,
            }) => Err(SanitizationError::InvalidSource {
                message: if message.is_empty() { error_type } else { message },
                line,
            }),
            Exchange::Response(WorkerResponse::Error {
                error_type,
                message,
                ..
            }) => Err(SanitizationError::Parser(WorkerResponse::error_text(
                &error_type,
                &message,
            ))),
            Exchange::TimedOut { limit_ms } => Err(SanitizationError::Parser(format!(
                "parsing timed out after {}ms",
                limit_ms
            ))),
            Exchange::LimitExceeded(message) | Exchange::Failure(message) => {
                Err(SanitizationError::Parser(message))
            }
        }
    }

    /// Compile and execute `code` in a fresh worker and report its symbols.
    pub fn load(&self, code: &str) -> std::result::Result<Namespace, SandboxError> {
        let request = WorkerRequest::load(code, self.policy.exposed_names());
        let limit = self.config.load_timeout();

        match self.exchange(&request, limit) {
            Exchange::Response(WorkerResponse::Ok { symbols, .. }) => {
                log::debug!("candidate loaded with {} symbols", symbols.len());
                Ok(Namespace {
                    source: Arc::from(code),
                    symbols,
                })
            }
            Exchange::Response(WorkerResponse::Error {
                error_type,
                message,
                ..
            }) => Err(SandboxError::Load(WorkerResponse::error_text(
                &error_type,
                &message,
            ))),
            Exchange::TimedOut { limit_ms } => Err(SandboxError::Timeout { limit_ms }),
            Exchange::LimitExceeded(message) => Err(SandboxError::Load(message)),
            Exchange::Failure(message) => Err(SandboxError::Worker(message)),
        }
    }

    /// Look up a callable symbol in a loaded namespace.
    pub fn extract(
        &self,
        namespace: &Namespace,
        name: &str,
    ) -> std::result::Result<Callable, SandboxError> {
        match namespace.get(name) {
            Some(symbol) if symbol.callable => Ok(Callable {
                name: symbol.name.clone(),
                source: Arc::clone(&namespace.source),
                params: symbol.params.clone(),
            }),
            _ => Err(SandboxError::MissingSymbol(name.to_string())),
        }
    }

    /// Call `callable` once in a fresh worker.
    pub fn invoke(
        &self,
        callable: &Callable,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Invocation {
        let request = WorkerRequest::call(
            &callable.source,
            self.policy.exposed_names(),
            &callable.name,
            args,
            kwargs,
        );

        match self.exchange(&request, self.config.call_timeout()) {
            Exchange::Response(WorkerResponse::Ok {
                output,
                output_type,
                ..
            }) => match Value::try_from(output.unwrap_or(WireValue::None)) {
                Ok(output) => {
                    let output_type =
                        output_type.unwrap_or_else(|| output.type_name().to_string());
                    Invocation::Returned {
                        output,
                        output_type,
                    }
                }
                Err(e) => Invocation::WorkerFailure(format!("malformed worker output: {}", e)),
            },
            Exchange::Response(WorkerResponse::Error {
                error_type,
                message,
                ..
            }) if error_type == "MemoryError" => {
                Invocation::LimitExceeded(WorkerResponse::error_text(&error_type, &message))
            }
            Exchange::Response(WorkerResponse::Error {
                stage,
                error_type,
                message,
                ..
            }) => Invocation::Raised {
                stage,
                error_type,
                message,
            },
            Exchange::TimedOut { limit_ms } => Invocation::TimedOut { limit_ms },
            Exchange::LimitExceeded(message) => Invocation::LimitExceeded(message),
            Exchange::Failure(message) => Invocation::WorkerFailure(message),
        }
    }

    /// Run the interpreter's version command
    pub fn interpreter_version(&self) -> Result<String> {
        let profile = WorkerProfile::from_config(
            &self.config,
            self.adapter.version_command(&self.config.interpreter),
            self.config.load_timeout(),
        );
        let outcome = launch_worker(&profile)?;
        let text = format!("{}{}", outcome.stdout, outcome.stderr);
        Ok(text.trim().to_string())
    }

    fn exchange(&self, request: &WorkerRequest, wall_limit: Duration) -> Exchange {
        let stdin = match serde_json::to_string(request) {
            Ok(json) => json,
            Err(e) => return Exchange::Failure(format!("cannot encode request: {}", e)),
        };
        let profile = WorkerProfile::from_config(
            &self.config,
            self.adapter.worker_command(&self.config.interpreter),
            wall_limit,
        )
        .with_stdin(stdin);

        match launch_worker(&profile) {
            Ok(outcome) => {
                log::debug!(
                    "worker {:?} {:?} request finished in {}ms",
                    outcome.pid,
                    request.op,
                    outcome.wall_time_ms
                );
                self.interpret(&outcome, wall_limit)
            }
            Err(e) => {
                log::warn!("worker launch failed: {}", e);
                Exchange::Failure(e.to_string())
            }
        }
    }

    fn interpret(&self, outcome: &WorkerOutcome, wall_limit: Duration) -> Exchange {
        match outcome.status() {
            WorkerStatus::TimeLimit => {
                if let Some(report) = &outcome.kill_report {
                    log::debug!(
                        "worker {:?} killed (sent: {}, {}ms) {}",
                        outcome.pid,
                        report.kill_sent,
                        report.waited_ms,
                        report.notes.join("; ")
                    );
                }
                let limit_ms = if outcome.timed_out {
                    wall_limit.as_millis() as u64
                } else {
                    self.config
                        .cpu_time_limit_ms
                        .unwrap_or(wall_limit.as_millis() as u64)
                };
                return Exchange::TimedOut { limit_ms };
            }
            WorkerStatus::MemoryLimit => {
                return Exchange::LimitExceeded(format!(
                    "Resource limit exceeded: worker killed by signal {}",
                    outcome.term_signal.unwrap_or_default()
                ));
            }
            _ => {}
        }

        // A capped stream may end inside the response line
        if outcome.output_integrity == OutputIntegrity::TruncatedByJudgeLimit {
            return Exchange::LimitExceeded(format!(
                "Output limit exceeded: worker wrote more than {} bytes",
                self.config.output_limit_bytes
            ));
        }

        if let Some(line) = outcome.response_line(self.adapter.response_marker()) {
            return match serde_json::from_str::<WorkerResponse>(line) {
                Ok(response) => Exchange::Response(response),
                Err(e) => Exchange::Failure(format!("malformed worker response: {}", e)),
            };
        }

        if outcome.stderr.contains("MemoryError") {
            return Exchange::LimitExceeded("MemoryError".to_string());
        }

        let status = outcome.status();
        let detail = outcome.stderr_tail();
        log::warn!(
            "worker {:?} ended with {:?} and no response (output {})",
            outcome.pid,
            status,
            outcome.output_integrity
        );
        Exchange::Failure(match outcome.term_signal {
            Some(sig) => format!("worker terminated by signal {}: {}", sig, detail),
            None => format!(
                "worker exited with code {} without a response: {}",
                outcome.exit_code.unwrap_or(-1),
                detail
            ),
        })
    }
}

impl SourceParser for Sandbox {
    fn parse_module(&self, source: &str) -> std::result::Result<Vec<SourceNode>, SanitizationError> {
        self.parse(source)
    }
}
