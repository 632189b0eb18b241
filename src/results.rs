// src/results.rs
//
// Tallied results for presentation. Pure read over the denormalized counters.
use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::{Choice, ChoiceResult, Poll, ResultsView};

/// Share of the total, rounded to one decimal. Zero totals give 0.0 for
/// every choice rather than a division error.
pub fn percentage(votes: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (f64::from(votes) / f64::from(total) * 1000.0).round() / 10.0
}

fn project(title: &str, total_votes: i32, choices: &[Choice]) -> ResultsView {
    ResultsView {
        poll: title.to_string(),
        total_votes,
        results: choices
            .iter()
            .map(|c| ChoiceResult {
                choice: c.text.clone(),
                votes: c.votes_count,
                percentage: percentage(c.votes_count, total_votes),
            })
            .collect(),
    }
}

/// Results for one poll, choices in insertion order. Open to anonymous
/// callers; inactive polls are hidden.
pub async fn results(pool: &PgPool, poll_id: i64) -> Result<ResultsView, ApiError> {
    let poll: Poll = sqlx::query_as("SELECT * FROM polls WHERE id = $1 AND is_active")
        .bind(poll_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::PollNotFound)?;

    let choices: Vec<Choice> = sqlx::query_as(
        "SELECT id, poll_id, text, votes_count FROM choices WHERE poll_id = $1 ORDER BY id",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(project(&poll.title, poll.total_votes, &choices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(id: i64, text: &str, votes: i32) -> Choice {
        Choice {
            id,
            poll_id: 1,
            text: text.to_string(),
            votes_count: votes,
        }
    }

    #[test]
    fn even_split_is_fifty_fifty() {
        let view = project("Best color?", 2, &[choice(1, "Red", 1), choice(2, "Blue", 1)]);
        assert_eq!(view.total_votes, 2);
        assert_eq!(view.results[0].percentage, 50.0);
        assert_eq!(view.results[1].percentage, 50.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 6), 16.7);
    }

    #[test]
    fn zero_votes_give_zero_percentages() {
        let view = project("Best color?", 0, &[choice(1, "Red", 0), choice(2, "Blue", 0)]);
        assert!(view.results.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn keeps_choice_insertion_order() {
        let view = project("Q", 3, &[choice(1, "a", 1), choice(2, "b", 2)]);
        let texts: Vec<&str> = view.results.iter().map(|r| r.choice.as_str()).collect();
        assert_eq!(texts, ["a", "b"]);
    }
}
