// Persistence seams for the grader: question lookup and per-user progress

use async_trait::async_trait;
use chrono::Utc;
use prepcode_common::redis as db;
use prepcode_common::types::{Difficulty, Question, UserProgress};
use redis::aio::ConnectionManager;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn find_question(&self, question_id: &str) -> Result<Option<Question>, StoreError>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Mark a question solved. Returns `true` only the first time for a
    /// given (user, question); concurrent callers never both see `true`.
    async fn record_solved(
        &self,
        user_id: &str,
        question_id: &str,
        difficulty: Difficulty,
    ) -> Result<bool, StoreError>;

    async fn progress(&self, user_id: &str) -> Result<Option<UserProgress>, StoreError>;
}

/// Redis-backed store. The connection manager reconnects on its own, so
/// one instance is cloned into every request.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl QuestionStore for RedisStore {
    async fn find_question(&self, question_id: &str) -> Result<Option<Question>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(db::get_question(&mut conn, question_id).await?)
    }
}

#[async_trait]
impl ProgressStore for RedisStore {
    async fn record_solved(
        &self,
        user_id: &str,
        question_id: &str,
        difficulty: Difficulty,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        Ok(db::record_solved(&mut conn, user_id, question_id, difficulty, Utc::now()).await?)
    }

    async fn progress(&self, user_id: &str) -> Result<Option<UserProgress>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(db::get_progress(&mut conn, user_id).await?)
    }
}
