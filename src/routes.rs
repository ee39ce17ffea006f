// src/routes.rs

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    handlers::{admin, auth, quiz, subject},
    models::{
        question::{AnswerChoice, FullQuestion, PublicChoice, PublicQuestion},
        quiz::{
            ChoiceInput, CreateQuizRequest, PublishQuizRequest, QuestionInput, Quiz, QuizDetail,
            QuizWithKey, ReplaceQuizRequest,
        },
        result::{
            QuizReviewEntry, StudentResult, SubjectReview, SubmitQuizRequest, SubmitQuizResponse,
        },
        subject::{CreateSubjectRequest, Subject},
        user::{LoginRequest, RegisterRequest, User},
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::me,
        subject::list_subjects,
        subject::get_subject,
        subject::list_subject_quizzes,
        subject::subject_review,
        quiz::get_quiz,
        quiz::submit_quiz,
        admin::create_subject,
        admin::delete_subject,
        admin::create_quiz,
        admin::get_quiz_full,
        admin::replace_quiz,
        admin::publish_quiz,
        admin::delete_quiz,
        admin::quiz_results,
    ),
    components(schemas(
        User,
        RegisterRequest,
        LoginRequest,
        Subject,
        CreateSubjectRequest,
        Quiz,
        QuizDetail,
        QuizWithKey,
        CreateQuizRequest,
        ReplaceQuizRequest,
        PublishQuizRequest,
        QuestionInput,
        ChoiceInput,
        PublicQuestion,
        PublicChoice,
        FullQuestion,
        AnswerChoice,
        SubmitQuizRequest,
        SubmitQuizResponse,
        SubjectReview,
        QuizReviewEntry,
        StudentResult,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, subjects, quizzes, admin).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins: [HeaderValue; 2] = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Brute-force protection on credential endpoints. Requires the server to
    // be started with connect info so the peer IP is extractable.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        .merge(
            Router::new().route("/me", get(auth::me)).layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let subject_routes = Router::new()
        .route("/", get(subject::list_subjects))
        .route("/{id}", get(subject::get_subject))
        .route("/{id}/quizzes", get(subject::list_subject_quizzes))
        .route("/{id}/review", get(subject::subject_review))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/submit", post(quiz::submit_quiz))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/subjects", post(admin::create_subject))
        .route("/subjects/{id}", delete(admin::delete_subject))
        .route("/quizzes", post(admin::create_quiz))
        .route(
            "/quizzes/{id}",
            put(admin::replace_quiz).delete(admin::delete_quiz),
        )
        .route("/quizzes/{id}/full", get(admin::get_quiz_full))
        .route("/quizzes/{id}/publish", post(admin::publish_quiz))
        .route("/quizzes/{id}/results", get(admin::quiz_results))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/subjects", subject_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/admin", admin_routes)
        .route("/api-docs/openapi.json", get(openapi_json))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
