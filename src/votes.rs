// src/votes.rs
//
// The vote ledger. One vote per user per poll, with the vote row and both
// denormalized counters written as a single transaction.
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{Choice, Poll, VoteReceipt};

/// A poll accepts votes only while active and unexpired.
fn check_poll_open(poll: &Poll, now: DateTime<Utc>) -> Result<(), ApiError> {
    if !poll.is_active {
        return Err(ApiError::PollInactive);
    }
    if poll.is_expired_at(now) {
        return Err(ApiError::PollExpired);
    }
    Ok(())
}

/// Record one user's vote.
///
/// Preconditions are checked in order: poll exists, poll open, choice belongs
/// to the poll, no prior vote. The (user_id, poll_id) unique index backs the
/// last check: if a concurrent request slips past it, the insert fails and
/// the whole transaction rolls back, so the counters never drift from the
/// vote rows. A unique violation is a definitive rejection, not retried.
pub async fn cast_vote(
    pool: &PgPool,
    voter: &CurrentUser,
    poll_id: i64,
    choice_id: i64,
    client_ip: Option<String>,
) -> Result<VoteReceipt, ApiError> {
    let mut tx = pool.begin().await?;

    let poll: Poll = sqlx::query_as("SELECT * FROM polls WHERE id = $1")
        .bind(poll_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::PollNotFound)?;
    check_poll_open(&poll, Utc::now())?;

    let choice: Choice =
        sqlx::query_as("SELECT id, poll_id, text, votes_count FROM choices WHERE id = $1")
            .bind(choice_id)
            .fetch_optional(&mut *tx)
            .await?
            .filter(|c: &Choice| c.poll_id == poll.id)
            .ok_or(ApiError::ChoiceMismatch)?;

    let prior: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM votes WHERE user_id = $1 AND poll_id = $2")
            .bind(voter.id)
            .bind(poll.id)
            .fetch_optional(&mut *tx)
            .await?;
    if prior.is_some() {
        return Err(ApiError::DuplicateVote);
    }

    let receipt: VoteReceipt = sqlx::query_as(
        "INSERT INTO votes (user_id, choice_id, poll_id, ip_address) \
         VALUES ($1, $2, $3, $4) RETURNING id, poll_id, choice_id, voted_at",
    )
    .bind(voter.id)
    .bind(choice.id)
    .bind(poll.id)
    .bind(client_ip)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::DuplicateVote,
        _ => ApiError::from(e),
    })?;

    sqlx::query("UPDATE choices SET votes_count = votes_count + 1 WHERE id = $1")
        .bind(choice.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE polls SET total_votes = total_votes + 1 WHERE id = $1")
        .bind(poll.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE users SET votes_cast = votes_cast + 1 WHERE id = $1")
        .bind(voter.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(poll_id, choice_id, voter = %voter.username, "vote recorded");

    Ok(receipt)
}
