use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::caption_votes_repo;
use crate::error::AppError;
use crate::services::feed_session::{FeedSession, VoteOutcome, VoteValue};

/// Writes one vote for `(caption_id, profile_id)`:
/// no vote yet inserts, the same value again retracts, the opposite value updates in place.
pub async fn cast_vote(
    pool: &SqlitePool,
    caption_id: &str,
    value: VoteValue,
    profile_id: &str,
) -> sqlx::Result<VoteOutcome> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let existing = caption_votes_repo::find_vote(pool, caption_id, profile_id).await?;

    let outcome = match existing {
        None => {
            let id = Uuid::new_v4().to_string();
            caption_votes_repo::insert_vote(
                pool,
                caption_votes_repo::NewCaptionVote {
                    id: &id,
                    caption_id,
                    profile_id,
                    vote_value: value.as_i64(),
                    created_at: &now,
                },
            )
            .await?;
            VoteOutcome::Inserted
        }
        Some(vote) if vote.vote_value == value.as_i64() => {
            caption_votes_repo::delete_vote(pool, &vote.id).await?;
            VoteOutcome::Retracted
        }
        Some(vote) => {
            caption_votes_repo::update_vote_value(pool, &vote.id, value.as_i64(), &now).await?;
            VoteOutcome::Updated
        }
    };

    debug!(caption_id = %caption_id, profile_id = %profile_id, ?outcome, "vote stored");
    Ok(outcome)
}

/// Casts a vote from the feed. On success the session moves to the next item;
/// on failure it is left exactly as it was so the same vote can be retried.
pub async fn vote(
    pool: &SqlitePool,
    session: &mut FeedSession,
    caption_id: &str,
    value: VoteValue,
    profile_id: &str,
) -> Result<VoteOutcome, AppError> {
    match cast_vote(pool, caption_id, value, profile_id).await {
        Ok(outcome) => {
            session.complete_vote(caption_id, value, outcome);
            Ok(outcome)
        }
        Err(e) => {
            warn!(caption_id = %caption_id, error = %e, "Vote failed");
            Err(AppError::Mutation(format!("vote was not saved: {}", e)))
        }
    }
}
