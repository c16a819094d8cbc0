use rand::Rng;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::database::{caption_votes_repo, captions_repo};
use crate::error::AppError;
use crate::models::{CaptionVotesRow, FeedCandidateRow};
use crate::services::feed_session::{
    build_session, CandidateImage, CandidateVote, FeedCandidate, FeedPolicy, FeedSession,
};

/// Samples a window of public captions at a random offset, joined with
/// their images and votes, in store order.
pub async fn load_candidates<R>(
    pool: &SqlitePool,
    pool_size: i64,
    rng: &mut R,
) -> sqlx::Result<Vec<FeedCandidate>>
where
    R: Rng,
{
    let pool_size = pool_size.max(1);
    let total = captions_repo::count_public_captions(pool).await?;
    let max_offset = (total - pool_size).max(0);
    let offset = if max_offset > 0 {
        rng.gen_range(0..=max_offset)
    } else {
        0
    };

    let rows = captions_repo::load_feed_candidates(pool, pool_size, offset).await?;
    let caption_ids: Vec<String> = rows.iter().map(|r| r.caption_id.clone()).collect();
    let votes = caption_votes_repo::load_votes_for_captions(pool, &caption_ids).await?;
    debug!(total, offset, rows = rows.len(), votes = votes.len(), "feed candidates loaded");

    Ok(assemble_candidates(rows, votes))
}

fn assemble_candidates(rows: Vec<FeedCandidateRow>, votes: Vec<CaptionVotesRow>) -> Vec<FeedCandidate> {
    let mut votes_by_caption: HashMap<String, Vec<CandidateVote>> = HashMap::new();
    for vote in votes {
        votes_by_caption
            .entry(vote.caption_id)
            .or_default()
            .push(CandidateVote {
                profile_id: vote.profile_id,
                vote_value: vote.vote_value,
            });
    }

    rows.into_iter()
        .filter(|row| row.is_public == 1)
        .map(|row| FeedCandidate {
            votes: votes_by_caption.remove(&row.caption_id).unwrap_or_default(),
            image: row.image_id.map(|id| CandidateImage {
                id,
                url: row.image_url,
                description: row.image_description,
            }),
            caption_id: row.caption_id,
            content: row.content,
        })
        .collect()
}

/// Fresh session for a page load.
pub async fn build_feed<R>(
    pool: &SqlitePool,
    policy: &FeedPolicy,
    candidate_pool: i64,
    profile_id: &str,
    rng: &mut R,
) -> Result<FeedSession, AppError>
where
    R: Rng,
{
    let candidates = load_candidates(pool, candidate_pool, rng).await.map_err(|e| {
        error!("Feed candidates load failed: {}", e);
        AppError::from(e)
    })?;
    Ok(build_session(candidates, policy, profile_id, rng))
}
