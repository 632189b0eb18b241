// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A poll row as stored. `total_votes` is denormalized and kept in lockstep
/// with the per-choice counters by the vote transaction.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub total_votes: i32,
}

impl Poll {
    /// Expiration is derived at read time, never stored.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }
}

pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(t) if now > t)
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub poll_id: i64,
    pub text: String,
    pub votes_count: i32,
}

/// Confirmation returned to a voter. The vote row itself is immutable.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct VoteReceipt {
    pub id: i64,
    pub poll_id: i64,
    pub choice_id: i64,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub title: String,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePollRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub choice: i64,
}

/// List entry, without choices.
#[derive(Debug, Serialize)]
pub struct PollSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub total_votes: i32,
    pub is_active: bool,
    pub is_expired: bool,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ChoiceView {
    pub id: i64,
    pub text: String,
    pub votes_count: i32,
}

/// Detail view, with choices in insertion order.
#[derive(Debug, Serialize)]
pub struct PollDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub total_votes: i32,
    pub is_active: bool,
    pub is_expired: bool,
    pub choices: Vec<ChoiceView>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceResult {
    pub choice: String,
    pub votes: i32,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub poll: String,
    pub total_votes: i32,
    pub results: Vec<ChoiceResult>,
}
