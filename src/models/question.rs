// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// One selectable option of a question.
/// Exactly one option per question is expected to carry `is_correct = true`,
/// though the data model does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table in the database.
///
/// Rows are immutable once imported; the bank only changes through a full
/// re-seed (delete + reinsert).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Stable external identifier, survives re-imports.
    pub question_id: String,

    pub subject: String,

    /// Course codes the question belongs to.
    /// Stored as a JSON array in the database.
    pub course_codes: Json<Vec<String>>,

    pub grade_level: String,

    /// Study-line tag carried over from the source data set.
    pub line: String,

    /// Grouping key used to assemble quizzes.
    pub category: String,

    pub topic: String,

    pub difficulty: f64,

    pub suitable_for_oral_practice: bool,

    /// The question prompt.
    pub question_text: String,

    /// Options with their correctness flags, stored as a JSON array.
    pub options: Json<Vec<AnswerOption>>,

    /// Explanation of the correct answer.
    pub explanation: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
