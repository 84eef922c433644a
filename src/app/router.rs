use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    api::http::comments as comments_http,
    app::{middleware as app_middleware, state::AppState},
    telemetry,
};

pub fn build_router(state: AppState, cors_allowed_origin: &str) -> Router {
    Router::new()
        .route(
            "/comments",
            post(comments_http::create_comment_handle).get(comments_http::get_thread_handle),
        )
        .route(
            "/comments/search",
            get(comments_http::search_comments_handle),
        )
        .route(
            "/comments/{id}",
            delete(comments_http::delete_thread_handle),
        )
        .layer(middleware::from_fn(telemetry::request_logging_middleware))
        .layer(middleware::from_fn(app_middleware::security_headers))
        .layer(cors_layer(cors_allowed_origin))
        .with_state(state)
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if allowed_origin == "*" {
        return cors.allow_origin(Any);
    }

    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin = %allowed_origin, "Unparseable CORS origin, allowing any");
            cors.allow_origin(Any)
        }
    }
}
