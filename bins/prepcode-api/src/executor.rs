/// Grading Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Run test cases through the engine in order, judge each with the evaluator,
/// and for authoritative submissions record progress.
///
/// **Rules:**
/// - Test cases run sequentially, results keep test-case order
/// - The first compile or runtime error stops the run; it would repeat on
///   every remaining case
/// - Wrong answers do not stop the run
/// - Engine failures abort the whole run and propagate
/// - A question counts as solved for a user at most once

use crate::engine::{EngineError, ExecutionEngine};
use crate::evaluator::{evaluate_case, normalize_input};
use crate::metrics;
use crate::store::{ProgressStore, QuestionStore, StoreError};
use prepcode_common::types::{Language, SubmissionOutcome, TestCase, TestCaseResult};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Cases executed by a dry run
pub const DRY_RUN_CASE_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum GradeError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("question not found: {0}")]
    QuestionNotFound(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// One authoritative submission
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub source_code: &'a str,
    pub language: Language,
    pub question_id: &'a str,
    pub user_id: Option<&'a str>,
}

fn run_label(results: &[TestCaseResult]) -> &'static str {
    if results.iter().any(TestCaseResult::is_error) {
        "error"
    } else if results.iter().all(|r| r.passed) {
        "passed"
    } else {
        "failed"
    }
}

/// Per-case loop shared by dry runs and submissions
async fn grade_cases(
    engine: &dyn ExecutionEngine,
    source_code: &str,
    language: Language,
    test_cases: &[TestCase],
    run_id: Uuid,
) -> Result<Vec<TestCaseResult>, EngineError> {
    let mut results = Vec::with_capacity(test_cases.len());

    for (idx, test_case) in test_cases.iter().enumerate() {
        let stdin = normalize_input(&test_case.input);
        let execution = engine.execute(source_code, language, &stdin).await?;
        let result = evaluate_case(test_case, &execution);

        debug!(
            run_id = %run_id,
            test_num = idx + 1,
            status = execution.status_label(),
            passed = result.passed,
            "Test result"
        );

        let halt = result.is_error();
        results.push(result);

        if halt {
            warn!(
                run_id = %run_id,
                test_num = idx + 1,
                status = execution.status_label(),
                skipped = test_cases.len() - idx - 1,
                "Execution failed; skipping remaining test cases"
            );
            break;
        }
    }

    Ok(results)
}

/// Dry run against caller-supplied test cases. Never touches persisted state.
///
/// The caller decides how many cases to pass; the HTTP layer caps at
/// [`DRY_RUN_CASE_LIMIT`].
pub async fn run_tests(
    engine: &dyn ExecutionEngine,
    source_code: &str,
    language: Language,
    test_cases: &[TestCase],
) -> Result<Vec<TestCaseResult>, EngineError> {
    let run_id = Uuid::new_v4();
    info!(
        run_id = %run_id,
        language = %language,
        test_cases = test_cases.len(),
        source_size = source_code.len(),
        "Starting dry run"
    );

    let results = match grade_cases(engine, source_code, language, test_cases, run_id).await {
        Ok(results) => results,
        Err(e) => {
            metrics::GRADING_RUNS.with_label_values(&["test", "engine_error"]).inc();
            return Err(e);
        }
    };

    let label = run_label(&results);
    metrics::GRADING_RUNS.with_label_values(&["test", label]).inc();
    info!(run_id = %run_id, executed = results.len(), result = label, "Dry run completed");

    Ok(results)
}

/// Grade a submission against every test case of a question
///
/// When all cases pass and a user is present, the question is recorded as
/// solved for that user. Repeat solves leave the counters untouched.
pub async fn submit(
    engine: &dyn ExecutionEngine,
    questions: &dyn QuestionStore,
    progress: &dyn ProgressStore,
    submission: Submission<'_>,
) -> Result<SubmissionOutcome, GradeError> {
    let run_id = Uuid::new_v4();

    let question = questions
        .find_question(submission.question_id)
        .await?
        .ok_or_else(|| GradeError::QuestionNotFound(submission.question_id.to_string()))?;

    info!(
        run_id = %run_id,
        question_id = submission.question_id,
        language = %submission.language,
        test_cases = question.test_cases.len(),
        source_size = submission.source_code.len(),
        "Starting submission"
    );

    let results = match grade_cases(
        engine,
        submission.source_code,
        submission.language,
        &question.test_cases,
        run_id,
    )
    .await
    {
        Ok(results) => results,
        Err(e) => {
            metrics::GRADING_RUNS.with_label_values(&["submit", "engine_error"]).inc();
            return Err(e.into());
        }
    };

    // An early exit leaves fewer results than cases, and an empty question
    // has nothing to pass.
    let all_passed = !results.is_empty()
        && results.len() == question.test_cases.len()
        && results.iter().all(|r| r.passed);
    let passed_count = results.iter().filter(|r| r.passed).count();
    let total_count = results.len();

    metrics::GRADING_RUNS
        .with_label_values(&["submit", run_label(&results)])
        .inc();

    if all_passed {
        match submission.user_id {
            Some(user_id) => {
                let newly_solved = progress
                    .record_solved(user_id, submission.question_id, question.difficulty)
                    .await?;
                if newly_solved {
                    metrics::QUESTIONS_SOLVED
                        .with_label_values(&[question.difficulty.as_str()])
                        .inc();
                    info!(
                        run_id = %run_id,
                        user_id,
                        question_id = submission.question_id,
                        difficulty = question.difficulty.as_str(),
                        "Question recorded as solved"
                    );
                } else {
                    debug!(run_id = %run_id, user_id, "Question already solved; progress unchanged");
                }
            }
            None => {
                debug!(run_id = %run_id, "No user context; progress not recorded");
            }
        }
    }

    info!(
        run_id = %run_id,
        all_passed,
        passed = passed_count,
        executed = total_count,
        "Submission graded"
    );

    Ok(SubmissionOutcome {
        all_passed,
        passed_count,
        total_count,
        results,
    })
}
