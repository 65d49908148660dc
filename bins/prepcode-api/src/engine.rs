/// Execution Engine - Dispatch to the Remote Sandbox
///
/// **Core Responsibility:**
/// Send source code and stdin to the external execution service and classify
/// the raw response into compile error, runtime error or success.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to reach the sandbox (Piston HTTP API)
/// - Engine does NOT know expected outputs or scoring
/// - Program failures are data (`ExecutionResult`), never `Err`
/// - Only infrastructure failures are `Err(EngineError)`

use crate::language_config::{
    runtime_for, COMPILE_TIMEOUT_MS, MEMORY_LIMIT_UNBOUNDED, RUN_TIMEOUT_MS,
};
use crate::metrics;
use async_trait::async_trait;
use prepcode_common::types::Language;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Classified outcome of one program execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    CompileError { message: String },
    RuntimeError { message: String, stdout: String },
    Success { stdout: String, stderr: String },
}

impl ExecutionResult {
    pub fn status_label(&self) -> &'static str {
        match self {
            ExecutionResult::CompileError { .. } => "compile_error",
            ExecutionResult::RuntimeError { .. } => "runtime_error",
            ExecutionResult::Success { .. } => "success",
        }
    }
}

/// Failure to talk to the execution service at all
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("engine returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
    #[error("engine did not answer within {0}ms")]
    Timeout(u64),
}

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(
        &self,
        source_code: &str,
        language: Language,
        stdin: &str,
    ) -> Result<ExecutionResult, EngineError>;
}

#[derive(Debug, Serialize)]
struct PistonFile<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct PistonRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<PistonFile<'a>>,
    stdin: &'a str,
    args: Vec<String>,
    compile_timeout: u64,
    run_timeout: u64,
    compile_memory_limit: i64,
    run_memory_limit: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PistonStage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    signal: Option<String>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PistonResponse {
    #[serde(default)]
    compile: Option<PistonStage>,
    #[serde(default)]
    run: Option<PistonStage>,
}

#[derive(Debug, Deserialize)]
struct PistonErrorBody {
    message: String,
}

fn first_non_empty(candidates: [Option<&String>; 2], fallback: &str) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Classify a raw engine response
///
/// Priority:
/// 1. Compile stage with a non-zero (or missing) exit code → CompileError
/// 2. Run stage with a non-zero exit code AND a signal → RuntimeError
/// 3. Anything else → Success, graded on stdout
///
/// A response without a run stage is malformed.
pub(crate) fn classify(response: PistonResponse) -> Result<ExecutionResult, EngineError> {
    if let Some(compile) = &response.compile {
        if compile.code != Some(0) {
            return Ok(ExecutionResult::CompileError {
                message: first_non_empty(
                    [compile.stderr.as_ref(), compile.output.as_ref()],
                    "Compilation failed",
                ),
            });
        }
    }

    let run = response
        .run
        .ok_or_else(|| EngineError::MalformedResponse("missing run stage".to_string()))?;

    let signalled = run.signal.as_deref().is_some_and(|s| !s.is_empty());
    if run.code != Some(0) && signalled {
        return Ok(ExecutionResult::RuntimeError {
            message: first_non_empty([run.stderr.as_ref(), run.stdout.as_ref()], "Runtime error"),
            stdout: run.stdout.unwrap_or_default(),
        });
    }

    Ok(ExecutionResult::Success {
        stdout: run.stdout.or(run.output).unwrap_or_default(),
        stderr: run.stderr.unwrap_or_default(),
    })
}

/// Client for a Piston-compatible execution service
pub struct PistonEngine {
    client: reqwest::Client,
    execute_url: String,
    timeout: Duration,
}

impl PistonEngine {
    /// `base_url` is the API root, e.g. `https://emkc.org/api/v2/piston`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            execute_url: format!("{}/execute", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    async fn send(&self, request: &PistonRequest<'_>) -> Result<PistonResponse, EngineError> {
        let response = self
            .client
            .post(&self.execute_url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<PistonErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(EngineError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| EngineError::MalformedResponse(e.to_string()))
    }

    fn map_transport(&self, err: reqwest::Error) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout(self.timeout.as_millis() as u64)
        } else {
            EngineError::Transport(err)
        }
    }
}

#[async_trait]
impl ExecutionEngine for PistonEngine {
    async fn execute(
        &self,
        source_code: &str,
        language: Language,
        stdin: &str,
    ) -> Result<ExecutionResult, EngineError> {
        let runtime = runtime_for(language);
        let request = PistonRequest {
            language: runtime.runtime,
            version: runtime.version,
            files: vec![PistonFile {
                name: runtime.file_name,
                content: source_code,
            }],
            stdin,
            args: Vec::new(),
            compile_timeout: COMPILE_TIMEOUT_MS,
            run_timeout: RUN_TIMEOUT_MS,
            compile_memory_limit: MEMORY_LIMIT_UNBOUNDED,
            run_memory_limit: MEMORY_LIMIT_UNBOUNDED,
        };

        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.send(&request)).await {
            Ok(response) => response.and_then(classify),
            Err(_) => Err(EngineError::Timeout(self.timeout.as_millis() as u64)),
        };
        let elapsed = start.elapsed();

        metrics::ENGINE_LATENCY
            .with_label_values(&[language.as_str()])
            .observe(elapsed.as_secs_f64());

        match &outcome {
            Ok(result) => {
                metrics::ENGINE_EXECUTIONS
                    .with_label_values(&[language.as_str(), result.status_label()])
                    .inc();
                debug!(
                    language = %language,
                    status = result.status_label(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Engine execution finished"
                );
            }
            Err(e) => {
                metrics::ENGINE_EXECUTIONS
                    .with_label_values(&[language.as_str(), "engine_error"])
                    .inc();
                warn!(language = %language, error = %e, "Engine execution failed");
            }
        }

        outcome
    }
}
