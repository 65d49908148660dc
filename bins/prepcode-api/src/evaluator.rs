/// Test Evaluator - Input Normalization and Output Comparison
///
/// **Core Responsibility:**
/// Turn stored test-case input into program stdin, and judge a classified
/// execution result against the expected output.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or the execution engine transport
/// - Knows nothing about Redis
/// - Pure functions only
///
/// **Input Rules:**
/// - A bracket-wrapped JSON array becomes `"<len>\n<space-joined elements>"`
/// - Anything else, including bracket-wrapped text that is not valid JSON,
///   is passed through untouched
///
/// **Comparison Rules:**
/// - Trim leading and trailing whitespace on both sides: YES
/// - Internal whitespace and case: preserved (exact match)

use crate::engine::ExecutionResult;
use prepcode_common::types::{ErrorKind, TestCase, TestCaseResult};
use serde_json::Value;

/// Convert a test-case input into the stdin fed to the program
///
/// Solutions on this platform read an array as its length followed by the
/// elements, so `"[1,2,3]"` becomes `"3\n1 2 3"`. String elements are written
/// without quotes; other elements use their JSON text.
///
/// Never fails: unparseable input is returned as-is.
pub fn normalize_input(input: &str) -> String {
    let trimmed = input.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return input.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => {
            let elements: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            format!("{}\n{}", items.len(), elements.join(" "))
        }
        _ => input.to_string(),
    }
}

/// Normalize output string for comparison
fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Trim-insensitive equality
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

/// Evaluate a single test case against its execution result
///
/// Compile and runtime errors produce a failed result flagged with `error`
/// and carrying the error message as output. Successful runs are graded on
/// stdout only; stderr noise does not affect the verdict.
pub fn evaluate_case(test_case: &TestCase, execution: &ExecutionResult) -> TestCaseResult {
    let (output, passed, error_kind) = match execution {
        ExecutionResult::CompileError { message } => {
            (message.clone(), false, Some(ErrorKind::CompileError))
        }
        ExecutionResult::RuntimeError { message, .. } => {
            (message.clone(), false, Some(ErrorKind::RuntimeError))
        }
        ExecutionResult::Success { stdout, .. } => (
            stdout.clone(),
            outputs_match(stdout, &test_case.expected_output),
            None,
        ),
    };

    TestCaseResult {
        input: test_case.input.clone(),
        expected: test_case.expected_output.clone(),
        output,
        passed,
        error: error_kind.map(|_| true),
        error_kind,
    }
}
