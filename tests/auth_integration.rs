use std::net::TcpListener;

use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool, Row};

use bookshelf::cache::RedisCache;
use bookshelf::configuration::{get_configuration, DatabaseSettings};
use bookshelf::email_client::{EmailClient, SenderEmail};
use bookshelf::startup::run;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let cache = RedisCache::connect(&configuration.redis)
        .await
        .expect("Failed to connect to Redis");
    let sender = SenderEmail::parse(configuration.email.sender.clone())
        .expect("Invalid sender address in configuration");
    let email_client = EmailClient::new(
        configuration.email.base_url.clone(),
        sender,
        reqwest::Client::new(),
    );

    let server = run(
        listener,
        connection_pool.clone(),
        cache,
        email_client,
        configuration,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

const PASSWORD: &str = "SecurePass123";

async fn register_user(app: &TestApp, client: &reqwest::Client, email: &str) {
    let body = json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "John",
        "last_name": "Doe"
    });

    let response = client
        .post(&format!("{}/auth/register", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
}

fn extract_refresh_cookie(response: &reqwest::Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("No Set-Cookie header on response")
        .to_str()
        .expect("Set-Cookie is not valid UTF-8");

    let pair = header.split(';').next().unwrap();
    pair.strip_prefix("refresh_token=")
        .expect("Cookie is not the refresh token")
        .to_string()
}

/// Returns (access_token, refresh_cookie_value).
async fn login_user(app: &TestApp, client: &reqwest::Client, email: &str) -> (String, String) {
    let body = json!({ "email": email, "password": PASSWORD });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let refresh_cookie = extract_refresh_cookie(&response);
    let body: Value = response.json().await.expect("Failed to parse response");
    let access_token = body["access_token"]
        .as_str()
        .expect("No access token in response")
        .to_string();

    (access_token, refresh_cookie)
}

// --- Registration Tests ---

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn register_returns_201_and_stores_the_user() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = json!({
        "email": "john@example.com",
        "password": PASSWORD,
        "first_name": "John",
        "last_name": "Doe",
        "phone_number": "+49 170 1234567"
    });

    let response = client
        .post(&format!("{}/auth/register", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());

    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["email"], "john@example.com");
    assert_eq!(response_body["is_active"], true);
    assert!(response_body.get("password_hash").is_none());

    // Verify the user landed with the default role
    let user = sqlx::query(
        "SELECT u.first_name, r.role_type FROM users u \
         JOIN roles r ON r.id = u.role_id WHERE u.email = 'john@example.com'",
    )
    .fetch_one(&app.db_pool)
    .await
    .expect("Failed to fetch created user");

    assert_eq!(user.get::<String, _>("first_name"), "John");
    assert_eq!(user.get::<String, _>("role_type"), "user");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn register_returns_400_for_invalid_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let invalid_emails = vec!["notanemail", "user@", "@example.com", "user@@example.com"];

    for invalid_email in invalid_emails {
        let body = json!({
            "email": invalid_email,
            "password": PASSWORD,
            "first_name": "Test",
            "last_name": "User"
        });

        let response = client
            .post(&format!("{}/auth/register", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject invalid email: {}",
            invalid_email
        );
    }
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn register_returns_400_for_weak_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let long_password = format!("Aa1{}", "a".repeat(126));
    let weak_passwords = vec![
        ("short", "password too short"),
        ("nouppercase123", "no uppercase"),
        ("NOLOWERCASE123", "no lowercase"),
        ("NoDigitsHere", "no digits"),
        (long_password.as_str(), "password too long"),
    ];

    for (weak_password, reason) in weak_passwords {
        let body = json!({
            "email": "test@example.com",
            "password": weak_password,
            "first_name": "Test",
            "last_name": "User"
        });

        let response = client
            .post(&format!("{}/auth/register", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject weak password: {}",
            reason
        );
    }
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;

    let body = json!({
        "email": "john@example.com",
        "password": PASSWORD,
        "first_name": "John",
        "last_name": "Doe"
    });

    let response = client
        .post(&format!("{}/auth/register", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(409, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn register_returns_400_for_missing_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let test_cases = vec![
        (
            json!({"email": "a@b.com", "password": PASSWORD, "first_name": "A"}),
            "missing last name",
        ),
        (
            json!({"password": PASSWORD, "first_name": "A", "last_name": "B"}),
            "missing email",
        ),
        (
            json!({"email": "a@b.com", "first_name": "A", "last_name": "B"}),
            "missing password",
        ),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = client
            .post(&format!("{}/auth/register", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject request: {}",
            reason
        );
    }
}

// --- Login Tests ---

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn login_returns_200_and_sets_refresh_cookie() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;

    let login_body = json!({
        "email": "john@example.com",
        "password": PASSWORD
    });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&login_body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let cookie_header = response
        .headers()
        .get(SET_COOKIE)
        .expect("No Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie_header.starts_with("refresh_token="));
    assert!(cookie_header.contains("HttpOnly"));

    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert!(!response_body["access_token"].as_str().unwrap().is_empty());
    assert_eq!(response_body["token_type"], "Bearer");
    assert_eq!(response_body["expires_in"], 1800);
    // The refresh token lives in the cookie only
    assert!(response_body.get("refresh_token").is_none());
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn login_returns_401_for_wrong_password() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;

    let login_body = json!({
        "email": "john@example.com",
        "password": "WrongPassword123"
    });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&login_body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert!(response.headers().get(SET_COOKIE).is_none());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "BAD_CREDENTIALS");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn login_returns_401_for_unknown_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let login_body = json!({
        "email": "nobody@example.com",
        "password": PASSWORD
    });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&login_body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "BAD_CREDENTIALS");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn login_returns_403_for_inactive_account() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;

    sqlx::query("UPDATE users SET is_active = false WHERE email = 'john@example.com'")
        .execute(&app.db_pool)
        .await
        .expect("Failed to deactivate user");

    let login_body = json!({
        "email": "john@example.com",
        "password": PASSWORD
    });

    let response = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&login_body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "USER_NOT_ACTIVE");
}

// --- Protected Route Tests ---

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn protected_route_returns_401_without_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "UNAUTHORIZED");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn protected_route_returns_401_with_invalid_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", "Bearer invalid.token.here")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "TOKEN_INVALID");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn protected_route_rejects_malformed_authorization_header() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let malformed_headers = vec![
        "Bearer",             // missing token
        "Basic dXNlcjpwYXNz", // not Bearer
        "BearerToken",        // missing space
        "",                   // empty
    ];

    for header in malformed_headers {
        let response = client
            .get(&format!("{}/auth/me", &app.address))
            .header("Authorization", header)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            401,
            response.status().as_u16(),
            "Should reject malformed header: {}",
            header
        );
    }
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn me_returns_the_current_user() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;
    let (access_token, _) = login_user(&app, &client, "john@example.com").await;

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());

    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["user"]["email"], "john@example.com");
    assert_eq!(response_body["user"]["first_name"], "John");
    assert_eq!(response_body["role"], "user");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn token_of_deleted_user_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;
    let (access_token, _) = login_user(&app, &client, "john@example.com").await;

    sqlx::query("DELETE FROM users WHERE email = 'john@example.com'")
        .execute(&app.db_pool)
        .await
        .expect("Failed to delete user");

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn token_of_deactivated_user_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;
    let (access_token, _) = login_user(&app, &client, "john@example.com").await;

    sqlx::query("UPDATE users SET is_active = false WHERE email = 'john@example.com'")
        .execute(&app.db_pool)
        .await
        .expect("Failed to deactivate user");

    let response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(403, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "USER_NOT_ACTIVE");
}

// --- Token Refresh Tests ---

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn refresh_returns_a_working_access_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;
    let (_, refresh_cookie) = login_user(&app, &client, "john@example.com").await;

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .header(COOKIE, format!("refresh_token={}", refresh_cookie))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    // The refresh token is not rotated, so no new cookie is set
    assert!(response.headers().get(SET_COOKIE).is_none());

    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["token_type"], "Bearer");
    assert_eq!(response_body["expires_in"], 1800);
    let new_access_token = response_body["access_token"]
        .as_str()
        .expect("No access token in response");

    let me_response = client
        .get(&format!("{}/auth/me", &app.address))
        .header("Authorization", format!("Bearer {}", new_access_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, me_response.status().as_u16());
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn refresh_without_cookie_returns_401() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "UNAUTHORIZED");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn refresh_with_garbage_cookie_returns_401() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .header(COOKIE, "refresh_token=definitely.not.ajwt")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "TOKEN_INVALID");
}

// --- Logout Tests ---

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn logout_revokes_the_refresh_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;
    let (_, refresh_cookie) = login_user(&app, &client, "john@example.com").await;

    let logout_response = client
        .post(&format!("{}/auth/logout", &app.address))
        .header(COOKIE, format!("refresh_token={}", refresh_cookie))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, logout_response.status().as_u16());
    let clear_header = logout_response
        .headers()
        .get(SET_COOKIE)
        .expect("Logout did not clear the cookie")
        .to_str()
        .unwrap();
    assert!(clear_header.contains("Max-Age=0"));

    // The cookie value the client still holds must no longer refresh
    let response = client
        .post(&format!("{}/auth/refresh", &app.address))
        .header(COOKIE, format!("refresh_token={}", refresh_cookie))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "TOKEN_REVOKED");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn logout_without_cookie_still_succeeds() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

// --- Password Recovery Tests ---

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn forgot_password_returns_400_for_unknown_email() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let body = json!({ "email": "nobody@example.com" });

    let response = client
        .post(&format!("{}/auth/password/forgot", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "EMAIL_NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires running Postgres and Redis"]
async fn reset_password_returns_400_when_no_code_was_requested() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_user(&app, &client, "john@example.com").await;

    let body = json!({
        "email": "john@example.com",
        "code": "123456",
        "new_password": "NewSecurePass123"
    });

    let response = client
        .post(&format!("{}/auth/password/reset", &app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let response_body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(response_body["code"], "RECOVERY_CODE_EXPIRED");
}
