use crate::types::{Difficulty, Question, SolvedQuestion, UserProgress};
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, RedisResult};
use std::collections::HashMap;

/// Redis key semantics for questions and per-user progress.
/// Keys are deterministic so every API replica agrees on layout.

pub const QUESTION_PREFIX: &str = "prepcode:question";
pub const PROGRESS_PREFIX: &str = "prepcode:progress";
pub const SOLVED_PREFIX: &str = "prepcode:solved";

/// Adds the question to the solved hash and bumps counters only when the
/// question was not there yet. Runs atomically inside Redis.
const RECORD_SOLVED_SCRIPT: &str = r#"
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 1 then
    redis.call('HINCRBY', KEYS[2], 'totalSolved', 1)
    redis.call('HINCRBY', KEYS[2], ARGV[3], 1)
    return 1
end
return 0
"#;

pub fn question_key(question_id: &str) -> String {
    format!("{}:{}", QUESTION_PREFIX, question_id)
}

pub fn progress_key(user_id: &str) -> String {
    format!("{}:{}", PROGRESS_PREFIX, user_id)
}

pub fn solved_key(user_id: &str) -> String {
    format!("{}:{}", SOLVED_PREFIX, user_id)
}

fn type_error(what: &'static str, detail: String) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::TypeError, what, detail))
}

/// Fetch a question by id
pub async fn get_question(
    conn: &mut redis::aio::ConnectionManager,
    question_id: &str,
) -> RedisResult<Option<Question>> {
    let payload: Option<String> = conn.get(question_key(question_id)).await?;

    match payload {
        Some(data) => {
            let question: Question = serde_json::from_str(&data)
                .map_err(|e| type_error("deserialization error", e.to_string()))?;
            Ok(Some(question))
        }
        None => Ok(None),
    }
}

/// Record a solved question for a user.
///
/// Returns `true` when the question was newly added; re-solving is a no-op.
pub async fn record_solved(
    conn: &mut redis::aio::ConnectionManager,
    user_id: &str,
    question_id: &str,
    difficulty: Difficulty,
    solved_at: DateTime<Utc>,
) -> RedisResult<bool> {
    let added: i64 = redis::Script::new(RECORD_SOLVED_SCRIPT)
        .key(solved_key(user_id))
        .key(progress_key(user_id))
        .arg(question_id)
        .arg(solved_at.to_rfc3339())
        .arg(difficulty.counter_field())
        .invoke_async(conn)
        .await?;

    Ok(added == 1)
}

/// Load a user's progress. `None` until the first solve.
pub async fn get_progress(
    conn: &mut redis::aio::ConnectionManager,
    user_id: &str,
) -> RedisResult<Option<UserProgress>> {
    let counters: HashMap<String, u64> = conn.hgetall(progress_key(user_id)).await?;
    if counters.is_empty() {
        return Ok(None);
    }

    let solved: HashMap<String, String> = conn.hgetall(solved_key(user_id)).await?;
    let mut solved_questions = solved
        .into_iter()
        .map(|(question_id, stamp)| {
            let solved_at = DateTime::parse_from_rfc3339(&stamp)
                .map_err(|e| type_error("invalid solve timestamp", e.to_string()))?
                .with_timezone(&Utc);
            Ok(SolvedQuestion {
                question_id,
                solved_at,
            })
        })
        .collect::<RedisResult<Vec<_>>>()?;
    solved_questions.sort_by(|a, b| a.solved_at.cmp(&b.solved_at));

    let counter = |field: &str| counters.get(field).copied().unwrap_or(0);

    Ok(Some(UserProgress {
        user_id: user_id.to_string(),
        solved_questions,
        total_solved: counter("totalSolved"),
        easy_count: counter(Difficulty::Easy.counter_field()),
        medium_count: counter(Difficulty::Medium.counter_field()),
        hard_count: counter(Difficulty::Hard.counter_field()),
    }))
}
