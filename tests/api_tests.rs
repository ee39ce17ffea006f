// tests/api_tests.rs

use quizdesk::{config::Config, routes, state::AppState};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Each app gets its own in-memory SQLite database, so tests are fully
/// isolated and need no external services. The single connection keeps every
/// query on the same in-memory database.
async fn spawn_app() -> String {
    // 1. Create a pool
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState { pool, config };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background. Connect info is required by the
    // rate limiter on the auth routes.
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

fn unique_email() -> String {
    format!("u{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works_and_hides_password() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "carol",
            "email": unique_email(),
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["role"], "student");
    assert!(body.get("password").is_none(), "password must not be serialized");
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: username too short and email malformed
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "email": "not-an-email",
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_rejects_unknown_role() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "mallory",
            "email": unique_email(),
            "password": "password123",
            "role": "superuser"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();
    let payload = serde_json::json!({
        "username": "dave",
        "email": email,
        "password": "password123",
        "role": "student"
    });

    // Act
    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_returns_token_and_role() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "erin",
            "email": email,
            "password": "password123",
            "role": "admin"
        }))
        .send()
        .await
        .expect("Register failed");

    // Act
    let login_resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    // Assert
    let token = login_resp["token"].as_str().expect("Token not found");
    assert!(!token.is_empty());
    assert_eq!(login_resp["type"], "Bearer");
    assert_eq!(login_resp["role"], "admin");

    // The token works against /me
    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Fetch /me failed")
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], email);
    assert_eq!(me["username"], "erin");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "frank",
            "email": email,
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .expect("Register failed");

    // Act
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn protected_routes_require_token() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: no Authorization header at all
    let no_header = client
        .get(format!("{}/api/subjects", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Act: garbage token
    let bad_token = client
        .get(format!("{}/api/subjects", address))
        .header("Authorization", "Bearer not.a.jwt")
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(no_header.status().as_u16(), 401);
    assert_eq!(bad_token.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_forbid_students() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "grace",
            "email": email,
            "password": "password123",
            "role": "student"
        }))
        .send()
        .await
        .expect("Register failed");

    let login_resp: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .unwrap();
    let token = login_resp["token"].as_str().unwrap();

    // Act
    let response = client
        .post(format!("{}/api/admin/subjects", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": "Forbidden Science"}))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn auth_routes_are_rate_limited() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: hammer the login endpoint well past the burst allowance
    let mut statuses = Vec::new();
    for _ in 0..12 {
        let response = client
            .post(format!("{}/api/auth/login", address))
            .json(&serde_json::json!({
                "email": "nobody@example.com",
                "password": "irrelevant"
            }))
            .send()
            .await
            .expect("Failed to execute request");
        statuses.push(response.status().as_u16());
    }

    // Assert: early requests pass through (as 401s), later ones are throttled
    assert!(statuses.contains(&401));
    assert!(statuses.contains(&429));
}

#[tokio::test]
async fn openapi_document_is_served() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/api-docs/openapi.json", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let doc: serde_json::Value = response.json().await.unwrap();
    assert!(doc["paths"]["/api/quizzes/{id}/submit"].is_object());
}
