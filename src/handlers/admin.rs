// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction, types::Json as SqlJson};

use crate::{error::AppError, models::question::AnswerOption};

/// One option as emitted by the external data pipeline (camelCase).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedOption {
    pub text: String,
    pub is_correct: bool,
}

impl From<ImportedOption> for AnswerOption {
    fn from(opt: ImportedOption) -> Self {
        AnswerOption {
            text: opt.text,
            is_correct: opt.is_correct,
        }
    }
}

/// A top-level import record carrying a single question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandaloneQuestion {
    pub question_id: String,
    pub subject: String,
    #[serde(default)]
    pub course_codes: Vec<String>,
    pub grade_level: String,
    pub line: String,
    pub category: String,
    pub topic: String,
    pub difficulty: f64,
    #[serde(default)]
    pub suitable_for_oral_practice: bool,
    pub question_text: String,
    pub options: Vec<ImportedOption>,
    pub explanation: String,
}

/// The question-specific part of a passage record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageQuestion {
    pub question_id: String,
    pub question_text: String,
    pub options: Vec<ImportedOption>,
    pub explanation: String,
}

/// A top-level import record bundling shared metadata with a nested list
/// of sub-questions. Each sub-question is merged with this metadata on
/// insert.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageRecord {
    pub passage_id: String,
    pub subject: String,
    #[serde(default)]
    pub course_codes: Vec<String>,
    pub grade_level: String,
    pub line: String,
    pub category: String,
    pub topic: String,
    pub difficulty: f64,
    #[serde(default)]
    pub suitable_for_oral_practice: bool,
    pub questions: Vec<serde_json::Value>,
}

/// The two record shapes the import source mixes in one array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImportRecord {
    Standalone(StandaloneQuestion),
    Passage(PassageRecord),
}

async fn insert_question(
    tx: &mut Transaction<'_, Sqlite>,
    q: StandaloneQuestion,
) -> Result<(), AppError> {
    let options: Vec<AnswerOption> = q.options.into_iter().map(AnswerOption::from).collect();

    sqlx::query(
        r#"
        INSERT INTO questions
        (question_id, subject, course_codes, grade_level, line, category,
         topic, difficulty, suitable_for_oral_practice, question_text,
         options, explanation)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&q.question_id)
    .bind(&q.subject)
    .bind(SqlJson(&q.course_codes))
    .bind(&q.grade_level)
    .bind(&q.line)
    .bind(&q.category)
    .bind(&q.topic)
    .bind(q.difficulty)
    .bind(q.suitable_for_oral_practice)
    .bind(&q.question_text)
    .bind(SqlJson(&options))
    .bind(&q.explanation)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert question {}: {:?}", q.question_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(())
}

/// Clears the question bank and repopulates it from a heterogeneous JSON
/// array of standalone question records and passage records.
/// Admin only.
///
/// Top-level items matching neither shape, and passage sub-questions that
/// fail to parse, are skipped with a warning rather than failing the
/// import. The delete and all inserts commit in one transaction.
pub async fn import_questions(
    State(pool): State<SqlitePool>,
    Json(payload): Json<Vec<serde_json::Value>>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let deleted = sqlx::query("DELETE FROM questions")
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .rows_affected();

    tracing::info!("Re-seeding question bank: {} existing questions deleted", deleted);

    let mut imported: u64 = 0;
    let mut skipped: u64 = 0;

    for item in payload {
        match serde_json::from_value::<ImportRecord>(item) {
            Ok(ImportRecord::Standalone(question)) => {
                insert_question(&mut tx, question).await?;
                imported += 1;
            }
            Ok(ImportRecord::Passage(passage)) => {
                for nested in passage.questions {
                    let sub = match serde_json::from_value::<PassageQuestion>(nested) {
                        Ok(sub) => sub,
                        Err(e) => {
                            tracing::warn!(
                                "Skipping malformed question in passage {}: {}",
                                passage.passage_id,
                                e
                            );
                            skipped += 1;
                            continue;
                        }
                    };

                    // Merge question-specific fields with the metadata
                    // inherited from the parent passage.
                    let merged = StandaloneQuestion {
                        question_id: sub.question_id,
                        subject: passage.subject.clone(),
                        course_codes: passage.course_codes.clone(),
                        grade_level: passage.grade_level.clone(),
                        line: passage.line.clone(),
                        category: passage.category.clone(),
                        topic: passage.topic.clone(),
                        difficulty: passage.difficulty,
                        suitable_for_oral_practice: passage.suitable_for_oral_practice,
                        question_text: sub.question_text,
                        options: sub.options,
                        explanation: sub.explanation,
                    };

                    insert_question(&mut tx, merged).await?;
                    imported += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Skipping import record with unrecognized structure: {}", e);
                skipped += 1;
            }
        }
    }

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    tracing::info!("Import complete: {} questions imported, {} skipped", imported, skipped);

    Ok(Json(serde_json::json!({
        "deleted": deleted,
        "imported": imported,
        "skipped": skipped
    })))
}
