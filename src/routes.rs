use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::UploadLimits;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Headroom for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.server.cors_origin.as_deref());

    Router::new()
        .route("/", get(public::health::root))
        .route("/health", get(public::health::health))
        .merge(auth_routes())
        .merge(user_routes())
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/register", post(auth::register_post))
}

fn user_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/users", get(users::users_get).post(users::user_post))
        .route(
            "/users/:id",
            get(users::user_get)
                .put(users::user_put)
                .delete(users::user_delete),
        )
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{activations, upload};

    let body_limit = upload_body_limit(&state.config.upload);

    Router::new()
        .route(
            "/activaciones",
            get(activations::activations_get).post(activations::activation_post),
        )
        .route("/activaciones/:id", get(activations::activation_get))
        .route(
            "/upload",
            post(upload::upload_post).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

/// Largest multipart body a full batch can produce, saturating at `usize::MAX`
fn upload_body_limit(limits: &UploadLimits) -> usize {
    let max_file_bytes = usize::try_from(limits.max_file_bytes).unwrap_or(usize::MAX);
    limits
        .max_files
        .saturating_mul(max_file_bytes)
        .saturating_add(MULTIPART_OVERHEAD)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Ignoring unparseable CORS_ORIGIN, falling back to permissive CORS");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };
    tracing::error!(details = %details, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Internal server error",
            "details": details,
        })),
    )
        .into_response()
}
