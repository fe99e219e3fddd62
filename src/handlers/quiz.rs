// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, types::Json as SqlJson};

use crate::{
    config::{DEFAULT_QUIZ_SIZE, LEADERBOARD_SIZE},
    error::AppError,
    models::{
        attempt::{LeaderboardEntry, SubmitQuizRequest, SubmittedAnswer},
        question::{AnswerOption, Question},
    },
    utils::jwt::Claims,
};

/// Query parameters for quiz assembly.
#[derive(Debug, Deserialize)]
pub struct QuizParams {
    pub category: String,
    pub num_questions: Option<i64>,
}

/// Helper struct for fetching answer keys from the database.
#[derive(sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    options: SqlJson<Vec<AnswerOption>>,
}

/// Counts how many submitted answers match the stored correct option.
///
/// Comparison is by option display text against the first option flagged
/// correct on the question. Answers referencing unknown question ids,
/// questions with no flagged-correct option, or mismatched text score 0.
fn score_answers(
    answers: &[SubmittedAnswer],
    options_by_id: &HashMap<i64, Vec<AnswerOption>>,
) -> i64 {
    let mut score = 0;

    for answer in answers {
        let correct = options_by_id
            .get(&answer.question_id)
            .and_then(|options| options.iter().find(|o| o.is_correct));

        if let Some(correct) = correct {
            if correct.text == answer.selected_option {
                score += 1;
            }
        }
    }

    score
}

/// Assembles a random quiz for a category.
///
/// Returns min(requested, available) questions whose category matches
/// exactly; the default size is 10. An unknown category yields an empty
/// list, never an error.
/// Note: the full rows go out as-is, correctness flags included. A DTO
/// hiding `options[].is_correct` would be needed for an untrusted client.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Query(params): Query<QuizParams>,
) -> Result<impl IntoResponse, AppError> {
    let num_questions = params.num_questions.unwrap_or(DEFAULT_QUIZ_SIZE).max(0);

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT
            id, question_id, subject, course_codes, grade_level, line,
            category, topic, difficulty, suitable_for_oral_practice,
            question_text, options, explanation, created_at
        FROM questions
        WHERE category = ?
        ORDER BY RANDOM()
        LIMIT ?
        "#,
    )
    .bind(&params.category)
    .bind(num_questions)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Grades a submitted quiz and records the result.
///
/// * Requires an authenticated user with an already provisioned profile;
///   submission does not auto-provision.
/// * Score = count of answers whose selected text matches the stored
///   correct option.
/// * The points increment and the attempt record commit in one
///   transaction, so no partial state is observable.
/// * Resubmissions are not deduplicated; identical answers score again.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::InvalidIdentity("Invalid user id".to_string()))?;

    let profile_id = sqlx::query_scalar::<_, i64>("SELECT id FROM user_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::ProfileNotFound)?;

    let question_ids: Vec<i64> = req.answers.iter().map(|a| a.question_id).collect();

    // Dynamic IN clause to fetch the referenced questions. Ids that resolve
    // to nothing simply cannot match during grading.
    let options_by_id: HashMap<i64, Vec<AnswerOption>> = if question_ids.is_empty() {
        HashMap::new()
    } else {
        let mut query_builder =
            sqlx::QueryBuilder::<Sqlite>::new("SELECT id, options FROM questions WHERE id IN (");

        let mut separated = query_builder.separated(",");
        for id in &question_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let keys: Vec<AnswerKey> = query_builder
            .build_query_as()
            .fetch_all(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        keys.into_iter().map(|k| (k.id, k.options.0)).collect()
    };

    let score = score_answers(&req.answers, &options_by_id);
    let total_questions = req.answers.len() as i64;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    sqlx::query("UPDATE user_profiles SET points = points + ? WHERE id = ?")
        .bind(score)
        .bind(profile_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO quiz_attempts (user_profile_id, category, score, total_questions)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(profile_id)
    .bind(&req.category)
    .bind(score)
    .bind(total_questions)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(serde_json::json!({ "score": score })))
}

/// Retrieves the top 20 profiles by points.
///
/// Ties break on profile id ascending so the ordering is deterministic.
/// Users without a display name appear with `name: null`.
pub async fn get_leaderboard(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT u.display_name AS name, p.points
        FROM user_profiles p
        JOIN users u ON p.user_id = u.id
        ORDER BY p.points DESC, p.id ASC
        LIMIT ?
        "#,
    )
    .bind(LEADERBOARD_SIZE)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}
