// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::{
        attempt::QuizAttempt,
        profile::{MeResponse, UserProfile},
        user::PublicUser,
    },
    utils::jwt::{Claims, bearer_claims},
};

/// Resolves the claims subject to an existing user id.
/// The identity context is present but unusable otherwise.
async fn resolve_user_id(pool: &SqlitePool, claims: &Claims) -> Result<i64, AppError> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::InvalidIdentity("Invalid user id".to_string()))?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::InvalidIdentity("Unknown user".to_string()))
}

/// Idempotently guarantees a game profile exists for the current user.
///
/// Provisioning is a single conditional insert keyed on the unique
/// user_id index, so concurrent first-time calls cannot create
/// duplicates. Repeated calls return the same profile id and perform
/// no further writes. New profiles start at points 0, level 1, no badges.
pub async fn ensure_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = resolve_user_id(&pool, &claims).await?;

    sqlx::query("INSERT INTO user_profiles (user_id) VALUES (?) ON CONFLICT(user_id) DO NOTHING")
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to provision profile: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    let profile_id =
        sqlx::query_scalar::<_, i64>("SELECT id FROM user_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(serde_json::json!({ "profile_id": profile_id })))
}

/// Lists the current user's past quiz attempts, newest first.
/// A user without a provisioned profile simply has no attempts.
pub async fn list_my_attempts(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = resolve_user_id(&pool, &claims).await?;

    let attempts = sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT a.id, a.user_profile_id, a.category, a.score, a.total_questions, a.created_at
        FROM quiz_attempts a
        JOIN user_profiles p ON a.user_profile_id = p.id
        WHERE p.user_id = ?
        ORDER BY a.created_at DESC, a.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}

/// Returns the current user record together with its game profile.
///
/// Authentication is optional here: a missing or invalid token, or a
/// token whose subject no longer resolves to a user, yields JSON null
/// rather than an error. A user without a provisioned profile gets
/// `profile: null`.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let claims = match bearer_claims(&headers, &config.jwt_secret) {
        Some(claims) => claims,
        None => return Ok(Json(serde_json::Value::Null)),
    };

    let user_id = match claims.sub.parse::<i64>() {
        Ok(id) => id,
        Err(_) => return Ok(Json(serde_json::Value::Null)),
    };

    let user = sqlx::query_as::<_, PublicUser>(
        "SELECT id, username, display_name, role, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => return Ok(Json(serde_json::Value::Null)),
    };

    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT id, user_id, points, level, unlocked_badges, created_at
        FROM user_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    let me = MeResponse { user, profile };
    Ok(Json(serde_json::to_value(me).map_err(|e| {
        AppError::InternalServerError(e.to_string())
    })?))
}
