use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::CaptionVotesRow;

const SQL_SELECT_VOTE_COLUMNS: &str = r#"
SELECT
    id,
    caption_id,
    profile_id,
    vote_value,
    created_at,
    modified_at
FROM caption_votes
"#;

const SQL_INSERT_VOTE: &str = r#"
INSERT INTO caption_votes (
  id,
  caption_id,
  profile_id,
  vote_value,
  created_at,
  modified_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
"#;

const SQL_UPDATE_VOTE_VALUE: &str = r#"
UPDATE caption_votes
SET vote_value = ?2,
    modified_at = ?3
WHERE id = ?1
"#;

const SQL_DELETE_VOTE: &str = r#"
DELETE FROM caption_votes
WHERE id = ?1
"#;

pub struct NewCaptionVote<'a> {
    pub id: &'a str,
    pub caption_id: &'a str,
    pub profile_id: &'a str,
    pub vote_value: i64, // 1|-1
    pub created_at: &'a str,
}

pub async fn find_vote(
    pool: &SqlitePool,
    caption_id: &str,
    profile_id: &str,
) -> sqlx::Result<Option<CaptionVotesRow>> {
    let sql = format!(
        "{} WHERE caption_id = ?1 AND profile_id = ?2 LIMIT 1",
        SQL_SELECT_VOTE_COLUMNS
    );
    sqlx::query_as::<_, CaptionVotesRow>(&sql)
        .bind(caption_id)
        .bind(profile_id)
        .fetch_optional(pool)
        .await
}

/// All votes on the given captions, in one round trip.
pub async fn load_votes_for_captions(
    pool: &SqlitePool,
    caption_ids: &[String],
) -> sqlx::Result<Vec<CaptionVotesRow>> {
    if caption_ids.is_empty() {
        return Ok(vec![]);
    }

    let mut sql = String::from(SQL_SELECT_VOTE_COLUMNS);
    let mut args = SqliteArguments::default();
    let placeholders = vec!["?"; caption_ids.len()].join(", ");
    sql.push_str(&format!(" WHERE caption_id IN ({})", placeholders));
    for id in caption_ids {
        args.add(id.as_str()).map_err(sqlx::Error::Encode)?;
    }

    sqlx::query_as_with::<_, CaptionVotesRow, _>(&sql, args)
        .fetch_all(pool)
        .await
}

pub async fn insert_vote(pool: &SqlitePool, vote: NewCaptionVote<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_VOTE)
        .bind(vote.id)
        .bind(vote.caption_id)
        .bind(vote.profile_id)
        .bind(vote.vote_value)
        .bind(vote.created_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn update_vote_value(
    pool: &SqlitePool,
    id: &str,
    vote_value: i64,
    modified_at: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_VOTE_VALUE)
        .bind(id)
        .bind(vote_value)
        .bind(modified_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_vote(pool: &SqlitePool, id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_VOTE)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
