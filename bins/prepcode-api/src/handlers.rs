// HTTP route handlers for the code execution API

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use prepcode_common::types::{Language, SubmissionOutcome, TestCase, UserProgress};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthUser;
use crate::engine::ExecutionResult;
use crate::error::ApiError;
use crate::executor::{self, Submission, DRY_RUN_CASE_LIMIT};
use crate::language_config::{supported_runtimes, LanguageRuntime};
use crate::metrics;
use crate::AppState;

/// Largest accepted source file
pub const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub test_cases: Option<Vec<TestCase>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub question_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub success: bool,
    pub languages: Vec<LanguageRuntime>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub progress: UserProgress,
}

fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

/// Validate the fields every code route shares
fn source_and_language(
    code: Option<String>,
    language: Option<String>,
) -> Result<(String, Language), ApiError> {
    let code = required(code, "Code is required")?;
    let language = required(language, "Language is required")?;

    if code.len() > MAX_SOURCE_CODE_BYTES {
        return Err(ApiError::bad_request(format!(
            "Source code exceeds maximum size of {} bytes",
            MAX_SOURCE_CODE_BYTES
        )));
    }

    let language: Language = language.parse()?;
    Ok((code, language))
}

/// POST /code/execute - Run code once against raw stdin, no grading
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let Json(payload) = payload?;
    let (code, language) = source_and_language(payload.code, payload.language)?;
    let stdin = payload.input.unwrap_or_default();

    let execution = state.engine.execute(&code, language, &stdin).await?;
    info!(language = %language, status = execution.status_label(), "Ad-hoc execution finished");

    let status = execution.status_label();
    let response = match execution {
        ExecutionResult::Success { stdout, stderr } => ExecuteResponse {
            success: true,
            output: stdout,
            error: Some(stderr).filter(|s| !s.is_empty()),
            status,
        },
        ExecutionResult::CompileError { message } => ExecuteResponse {
            success: false,
            output: String::new(),
            error: Some(message),
            status,
        },
        ExecutionResult::RuntimeError { message, stdout } => ExecuteResponse {
            success: false,
            output: stdout,
            error: Some(message),
            status,
        },
    };

    Ok(Json(response))
}

/// POST /code/test - Dry run against the first few supplied test cases
pub async fn test_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let (code, language) = source_and_language(payload.code, payload.language)?;
    let test_cases = payload
        .test_cases
        .ok_or_else(|| ApiError::bad_request("Test cases are required"))?;

    let limit = test_cases.len().min(DRY_RUN_CASE_LIMIT);
    let results =
        executor::run_tests(state.engine.as_ref(), &code, language, &test_cases[..limit]).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "results": results,
    })))
}

/// POST /code/submit - Grade against every stored test case of a question
pub async fn submit_code(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(payload) = payload?;
    let (code, language) = source_and_language(payload.code, payload.language)?;
    let question_id = required(payload.question_id, "Question ID is required")?;

    let outcome = executor::submit(
        state.engine.as_ref(),
        state.questions.as_ref(),
        state.progress.as_ref(),
        Submission {
            source_code: &code,
            language,
            question_id: &question_id,
            user_id: Some(&user_id),
        },
    )
    .await?;

    Ok(Json(SubmitResponse {
        success: true,
        outcome,
    }))
}

/// GET /code/languages - Supported languages and their pinned runtimes
pub async fn list_languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        success: true,
        languages: supported_runtimes(),
    })
}

/// GET /code/progress - Solved questions and counters for the caller
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state
        .progress
        .progress(&user_id)
        .await?
        .unwrap_or_else(|| UserProgress::empty(&user_id));

    Ok(Json(ProgressResponse {
        success: true,
        progress,
    }))
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn export_metrics() -> Result<impl IntoResponse, ApiError> {
    let body = metrics::render().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
