// handlers.rs
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{
    CreatePollRequest, PollDetail, PollSummary, ResultsView, UpdatePollRequest, VoteReceipt,
    VoteRequest,
};
use crate::{polls, results, votes};

/// List all active polls, newest first. Open to anonymous callers.
pub async fn list_polls(State(pool): State<PgPool>) -> Result<Json<Vec<PollSummary>>, ApiError> {
    Ok(Json(polls::list_active(&pool).await?))
}

/// Create a poll with its choices. Authenticated only.
pub async fn create_poll(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Json(req): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollDetail>), ApiError> {
    let poll = polls::create_poll(&pool, &user, req).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Poll detail with choices and counts. Open to anonymous callers.
pub async fn poll_detail(
    State(pool): State<PgPool>,
    Path(poll_id): Path<i64>,
) -> Result<Json<PollDetail>, ApiError> {
    Ok(Json(polls::detail(&pool, poll_id).await?))
}

/// Update title, description or expiry. Owner only.
pub async fn update_poll(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(poll_id): Path<i64>,
    Json(req): Json<UpdatePollRequest>,
) -> Result<Json<PollDetail>, ApiError> {
    Ok(Json(polls::update_poll(&pool, &user, poll_id, req).await?))
}

/// Delete a poll and, via cascade, its choices and votes. Owner only.
pub async fn delete_poll(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(poll_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    polls::delete_poll(&pool, &user, poll_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cast a vote for one choice. Authenticated only.
pub async fn cast_vote(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(poll_id): Path<i64>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<VoteRequest>,
) -> Result<(StatusCode, Json<VoteReceipt>), ApiError> {
    let ip = client_ip(&headers, addr);
    let receipt = votes::cast_vote(&pool, &user, poll_id, req.choice, Some(ip)).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Tallied results with percentages. Open to anonymous callers.
pub async fn poll_results(
    State(pool): State<PgPool>,
    Path(poll_id): Path<i64>,
) -> Result<Json<ResultsView>, ApiError> {
    Ok(Json(results::results(&pool, poll_id).await?))
}

/// First hop of X-Forwarded-For when present, else the socket peer.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "10.0.0.1:4242".parse().unwrap()
    }

    #[test]
    fn falls_back_to_socket_peer() {
        assert_eq!(client_ip(&HeaderMap::new(), addr()), "10.0.0.1");
    }

    #[test]
    fn prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.2"),
        );
        assert_eq!(client_ip(&headers, addr()), "203.0.113.9");
    }

    #[test]
    fn empty_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_ip(&headers, addr()), "10.0.0.1");
    }
}
