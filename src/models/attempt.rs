// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_attempts' table in the database.
/// Append-only log of graded submissions; rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_profile_id: i64,
    pub category: String,
    pub score: i64,
    pub total_questions: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One answer of a quiz submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    /// Database id of the question being answered.
    pub question_id: i64,
    /// Display text of the option the user picked.
    pub selected_option: String,
}

/// DTO for submitting a completed quiz.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub category: String,
    pub answers: Vec<SubmittedAnswer>,
}

/// One row of the leaderboard, joined from `user_profiles` and `users`.
/// `name` is null when the user never set a display name.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub name: Option<String>,
    pub points: i64,
}
