// tests/common/mod.rs

#![allow(dead_code)]

use course_quiz_backend::{
    config::Config, routes, state::AppState, utils::hash::hash_password, utils::jwt::sign_jwt,
};
use sqlx::{PgPool, postgres::PgPoolOptions};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        server_port: 0,
        admin_username: None,
        admin_password: None,
    }
}

/// Connects to `DATABASE_URL` and migrates it. `None` when the variable is
/// not set, so database-backed tests can be skipped.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

/// Spawns the app on a random port and returns its base URL.
pub async fn spawn_app(pool: PgPool) -> String {
    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();
    let app = routes::create_router(AppState::new(pool, test_config(&database_url)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

pub fn bearer(user_id: i64, role: &str) -> String {
    format!("Bearer {}", sign_jwt(user_id, role, JWT_SECRET, 600).unwrap())
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

pub async fn insert_user(pool: &PgPool, role: &str, password: &str) -> (i64, String) {
    let username = unique(&role[..3]);
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&username)
    .bind(hash_password(password).unwrap())
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();
    (id, username)
}

pub async fn insert_course(pool: &PgPool, instructor_id: Option<i64>) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO courses (title, instructor_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(unique("course"))
    .bind(instructor_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_section(pool: &PgPool, course_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO course_sections (course_id, title, sort_order) VALUES ($1, $2, 1) RETURNING id",
    )
    .bind(course_id)
    .bind(unique("section"))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn enroll(pool: &PgPool, course_id: i64, user_id: i64) {
    sqlx::query("INSERT INTO course_enrollments (course_id, user_id) VALUES ($1, $2)")
        .bind(course_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn count_attempts(pool: &PgPool, user_id: i64, section_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM course_quiz_attempts WHERE user_id = $1 AND course_section_id = $2",
    )
    .bind(user_id)
    .bind(section_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
