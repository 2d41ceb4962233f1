// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, authoring, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, instructor_middleware, student_middleware},
};

/// Quiz authoring routes, shared by the admin and instructor trees.
fn authoring_routes() -> Router<AppState> {
    Router::new()
        .route("/sections/{section_id}/quizzes", post(authoring::create_quiz))
        .route(
            "/sections/{section_id}/quizzes/{quiz_id}",
            get(authoring::get_quiz)
                .put(authoring::update_quiz)
                .delete(authoring::delete_quiz),
        )
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, admin, instructor, student).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    // Layers run bottom-up: auth first, then the role check.
    let admin_routes = Router::new()
        .route("/courses", post(admin::create_course))
        .route("/courses/{course_id}/sections", post(admin::create_section))
        .route("/courses/{course_id}/enrollments", post(admin::enroll_student))
        .route("/sections/{section_id}", delete(admin::delete_section))
        .merge(authoring_routes())
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let instructor_routes = authoring_routes()
        .layer(middleware::from_fn(instructor_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route("/sections/{section_id}/quizzes", get(quiz::get_section_quizzes))
        .route(
            "/sections/{section_id}/quiz-attempts",
            post(quiz::submit_section_quiz),
        )
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/instructor", instructor_routes)
        .nest("/api/student", student_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
