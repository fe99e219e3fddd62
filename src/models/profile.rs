// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::models::user::PublicUser;

/// Represents the 'user_profiles' table in the database.
///
/// One row per user (UNIQUE on user_id). Points only grow through quiz
/// submissions; level and badges are set at creation and left untouched
/// by the grading flow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub points: i64,
    pub level: i64,

    /// Identifiers of unlocked badges, stored as a JSON array.
    pub unlocked_badges: Json<Vec<String>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated response for the current user: identity record plus the
/// game profile, which may not be provisioned yet.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
    pub profile: Option<UserProfile>,
}
