// In-process doubles for the engine and stores, used by unit and router tests

use crate::engine::{EngineError, ExecutionEngine, ExecutionResult};
use crate::store::{ProgressStore, QuestionStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use prepcode_common::types::{Difficulty, Language, Question, SolvedQuestion, UserProgress};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub enum Step {
    /// Succeed with stdin echoed to stdout
    Echo,
    Reply(ExecutionResult),
    /// Infrastructure failure
    Fail,
}

/// Engine that plays back scripted steps, then echoes once they run out
#[derive(Default)]
pub struct ScriptedEngine {
    steps: Mutex<VecDeque<Step>>,
    stdins: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            stdins: Mutex::new(Vec::new()),
        }
    }

    /// Stdin of every call, in call order
    pub fn stdins(&self) -> Vec<String> {
        self.stdins.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    async fn execute(
        &self,
        _source_code: &str,
        _language: Language,
        stdin: &str,
    ) -> Result<ExecutionResult, EngineError> {
        self.stdins.lock().unwrap().push(stdin.to_string());
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Echo);

        match step {
            Step::Echo => Ok(ExecutionResult::Success {
                stdout: format!("{}\n", stdin),
                stderr: String::new(),
            }),
            Step::Reply(result) => Ok(result),
            Step::Fail => Err(EngineError::Status {
                status: 502,
                message: "sandbox unavailable".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryQuestionStore {
    questions: HashMap<String, Question>,
}

impl MemoryQuestionStore {
    pub fn with(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into_iter().map(|q| (q.id.clone(), q)).collect(),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn find_question(&self, question_id: &str) -> Result<Option<Question>, StoreError> {
        Ok(self.questions.get(question_id).cloned())
    }
}

/// Progress store serialized behind one lock, matching the atomicity of the
/// Redis script
#[derive(Default)]
pub struct MemoryProgressStore {
    users: Mutex<HashMap<String, UserProgress>>,
}

impl MemoryProgressStore {
    pub fn snapshot(&self, user_id: &str) -> Option<UserProgress> {
        self.users.lock().unwrap().get(user_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn record_solved(
        &self,
        user_id: &str,
        question_id: &str,
        difficulty: Difficulty,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        let progress = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::empty(user_id));

        if progress.has_solved(question_id) {
            return Ok(false);
        }

        progress.solved_questions.push(SolvedQuestion {
            question_id: question_id.to_string(),
            solved_at: Utc::now(),
        });
        progress.total_solved += 1;
        match difficulty {
            Difficulty::Easy => progress.easy_count += 1,
            Difficulty::Medium => progress.medium_count += 1,
            Difficulty::Hard => progress.hard_count += 1,
        }
        Ok(true)
    }

    async fn progress(&self, user_id: &str) -> Result<Option<UserProgress>, StoreError> {
        Ok(self.snapshot(user_id))
    }
}
