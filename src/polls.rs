// src/polls.rs
//
// Poll lifecycle: creation with its choices as one unit, open reads,
// owner-gated update and delete.
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{
    ChoiceView, CreatePollRequest, Poll, PollDetail, PollSummary, UpdatePollRequest,
};

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 10;
pub const MAX_TEXT_LEN: usize = 200;

/// Poll joined with its author's username for presentation.
#[derive(sqlx::FromRow)]
struct PollWithAuthor {
    id: i64,
    title: String,
    description: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    total_votes: i32,
}

impl PollWithAuthor {
    fn into_summary(self, now: DateTime<Utc>) -> PollSummary {
        PollSummary {
            id: self.id,
            title: self.title,
            description: self.description,
            created_by: self.created_by,
            created_at: self.created_at,
            total_votes: self.total_votes,
            is_active: self.is_active,
            is_expired: crate::models::is_expired(self.expires_at, now),
        }
    }

    fn into_detail(self, choices: Vec<ChoiceView>, now: DateTime<Utc>) -> PollDetail {
        PollDetail {
            id: self.id,
            title: self.title,
            description: self.description,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
            total_votes: self.total_votes,
            is_active: self.is_active,
            is_expired: crate::models::is_expired(self.expires_at, now),
            choices,
        }
    }
}

const POLL_WITH_AUTHOR: &str = "SELECT p.id, p.title, p.description, u.username AS created_by, \
     p.created_at, p.updated_at, p.expires_at, p.is_active, p.total_votes \
     FROM polls p JOIN users u ON u.id = p.created_by";

fn field(name: &str, value: &str) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{name} must not be blank")));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ApiError::Validation(format!(
            "{name} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_create(req: &CreatePollRequest) -> Result<(), ApiError> {
    field("title", &req.title)?;
    if req.choices.len() < MIN_CHOICES || req.choices.len() > MAX_CHOICES {
        return Err(ApiError::Validation(format!(
            "a poll needs between {MIN_CHOICES} and {MAX_CHOICES} choices"
        )));
    }
    for text in &req.choices {
        field("choice text", text)?;
    }
    Ok(())
}

pub fn validate_update(req: &UpdatePollRequest) -> Result<(), ApiError> {
    if let Some(title) = &req.title {
        field("title", title)?;
    }
    Ok(())
}

/// Create a poll and all its choices in one transaction. If any choice
/// insert fails, no poll is persisted.
pub async fn create_poll(
    pool: &PgPool,
    owner: &CurrentUser,
    req: CreatePollRequest,
) -> Result<PollDetail, ApiError> {
    validate_create(&req)?;

    let mut tx = pool.begin().await?;

    let poll: Poll = sqlx::query_as(
        "INSERT INTO polls (title, description, created_by, expires_at) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(req.title.trim())
    .bind(req.description.as_deref().unwrap_or("").trim())
    .bind(owner.id)
    .bind(req.expires_at)
    .fetch_one(&mut *tx)
    .await?;

    for text in &req.choices {
        sqlx::query("INSERT INTO choices (poll_id, text) VALUES ($1, $2)")
            .bind(poll.id)
            .bind(text.trim())
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("UPDATE users SET polls_created = polls_created + 1 WHERE id = $1")
        .bind(owner.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(poll_id = poll.id, owner = %owner.username, "poll created");

    detail(pool, poll.id).await
}

/// Active polls only, newest first.
pub async fn list_active(pool: &PgPool) -> Result<Vec<PollSummary>, ApiError> {
    let rows: Vec<PollWithAuthor> =
        sqlx::query_as(&format!("{POLL_WITH_AUTHOR} WHERE p.is_active ORDER BY p.created_at DESC"))
            .fetch_all(pool)
            .await?;

    let now = Utc::now();
    Ok(rows.into_iter().map(|r| r.into_summary(now)).collect())
}

/// Detail with choices. Inactive polls are hidden, not reported as such.
pub async fn detail(pool: &PgPool, poll_id: i64) -> Result<PollDetail, ApiError> {
    let row: PollWithAuthor =
        sqlx::query_as(&format!("{POLL_WITH_AUTHOR} WHERE p.id = $1 AND p.is_active"))
            .bind(poll_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::PollNotFound)?;

    let choices: Vec<ChoiceView> = sqlx::query_as(
        "SELECT id, text, votes_count FROM choices WHERE poll_id = $1 ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(row.into_detail(choices, Utc::now()))
}

async fn fetch_owned(pool: &PgPool, requester: &CurrentUser, poll_id: i64) -> Result<Poll, ApiError> {
    let poll: Poll = sqlx::query_as("SELECT * FROM polls WHERE id = $1 AND is_active")
        .bind(poll_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::PollNotFound)?;

    if poll.created_by != requester.id {
        return Err(ApiError::Forbidden);
    }
    Ok(poll)
}

/// Partial update of title, description or expiry. Owner only.
pub async fn update_poll(
    pool: &PgPool,
    requester: &CurrentUser,
    poll_id: i64,
    req: UpdatePollRequest,
) -> Result<PollDetail, ApiError> {
    validate_update(&req)?;
    fetch_owned(pool, requester, poll_id).await?;

    sqlx::query(
        "UPDATE polls SET title = COALESCE($2, title), \
         description = COALESCE($3, description), \
         expires_at = COALESCE($4, expires_at), \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(poll_id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(req.description.as_deref().map(str::trim))
    .bind(req.expires_at)
    .execute(pool)
    .await?;

    detail(pool, poll_id).await
}

/// Hard delete. Choices and votes go with the poll via cascade.
pub async fn delete_poll(
    pool: &PgPool,
    requester: &CurrentUser,
    poll_id: i64,
) -> Result<(), ApiError> {
    fetch_owned(pool, requester, poll_id).await?;

    sqlx::query("DELETE FROM polls WHERE id = $1")
        .bind(poll_id)
        .execute(pool)
        .await?;

    tracing::info!(poll_id, requester = %requester.username, "poll deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(choices: Vec<&str>) -> CreatePollRequest {
        CreatePollRequest {
            title: "Best color?".to_string(),
            description: None,
            expires_at: None,
            choices: choices.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn one_choice_is_rejected() {
        assert!(validate_create(&request(vec!["Red"])).is_err());
    }

    #[test]
    fn eleven_choices_are_rejected() {
        let texts = vec!["a"; 11];
        assert!(validate_create(&request(texts)).is_err());
    }

    #[test]
    fn two_and_ten_choices_are_accepted() {
        assert!(validate_create(&request(vec!["Red", "Blue"])).is_ok());
        assert!(validate_create(&request(vec!["x"; 10])).is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut req = request(vec!["Red", "Blue"]);
        req.title = "   ".to_string();
        assert!(validate_create(&req).is_err());
    }

    #[test]
    fn overlong_title_is_rejected() {
        let mut req = request(vec!["Red", "Blue"]);
        req.title = "t".repeat(201);
        assert!(validate_create(&req).is_err());
    }

    #[test]
    fn overlong_choice_text_is_rejected() {
        let long = "c".repeat(201);
        assert!(validate_create(&request(vec!["Red", &long])).is_err());
    }

    #[test]
    fn blank_choice_text_is_rejected() {
        assert!(validate_create(&request(vec!["Red", " "])).is_err());
    }

    #[test]
    fn update_with_no_fields_is_valid() {
        let req = UpdatePollRequest {
            title: None,
            description: None,
            expires_at: None,
        };
        assert!(validate_update(&req).is_ok());
    }

    #[test]
    fn update_with_blank_title_is_rejected() {
        let req = UpdatePollRequest {
            title: Some(String::new()),
            description: None,
            expires_at: None,
        };
        assert!(validate_update(&req).is_err());
    }
}
