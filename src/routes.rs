// routes.rs
use axum::routing::{get, post};
use axum::Router;
use http::Method;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;

pub fn create_routes(pool: PgPool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]);

    Router::new()
        .route(
            "/api/polls",
            get(handlers::list_polls).post(handlers::create_poll),
        )
        .route(
            "/api/polls/{id}",
            get(handlers::poll_detail)
                .put(handlers::update_poll)
                .patch(handlers::update_poll)
                .delete(handlers::delete_poll),
        )
        .route("/api/polls/{id}/vote", post(handlers::cast_vote))
        .route("/api/polls/{id}/results", get(handlers::poll_results))
        .layer(cors)
        .with_state(pool)
}
