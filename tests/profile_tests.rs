// tests/profile_tests.rs

use quiz_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "profile_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn register_and_login(address: &str, client: &reqwest::Client) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn ensure_profile_is_idempotent() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;

    // Act: provision twice
    let first: serde_json::Value = client
        .post(&format!("{}/api/profile/ensure", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let second: serde_json::Value = client
        .post(&format!("{}/api/profile/ensure", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert: same reference both times, one row total
    let profile_id = first["profile_id"].as_i64().unwrap();
    assert_eq!(second["profile_id"].as_i64().unwrap(), profile_id);

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_profiles")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Fresh profiles start at points 0, level 1, no badges
    let (points, level, badges): (i64, i64, String) = sqlx::query_as(
        "SELECT points, level, unlocked_badges FROM user_profiles WHERE id = ?",
    )
    .bind(profile_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(points, 0);
    assert_eq!(level, 1);
    assert_eq!(badges, "[]");
}

#[tokio::test]
async fn get_me_unauthenticated_returns_null() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: no token at all
    let response = client
        .get(&format!("{}/api/profile/me", address))
        .send()
        .await
        .unwrap();

    // Assert: null body, not an error status
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn get_me_with_garbage_token_returns_null() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/api/profile/me", address))
        .header("Authorization", "Bearer not.a.jwt")
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn get_me_reports_profile_before_and_after_provisioning() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&address, &client).await;

    // Act: before provisioning
    let before: serde_json::Value = client
        .get(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert: user present, profile absent
    assert!(before["user"]["username"].as_str().is_some());
    assert!(before["profile"].is_null());

    // Act: provision, then fetch again
    client
        .post(&format!("{}/api/profile/ensure", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    let after: serde_json::Value = client
        .get(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(after["profile"]["points"], 0);
    assert_eq!(after["profile"]["level"], 1);
    assert_eq!(after["user"]["username"], before["user"]["username"]);
}
