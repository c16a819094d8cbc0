use sqlx::SqlitePool;

use crate::models::FeedCandidateRow;

pub const SQL_COUNT_PUBLIC_CAPTIONS: &str = r#"
SELECT COUNT(*)
FROM captions
WHERE is_public = 1
"#;

pub const SQL_LOAD_FEED_CANDIDATES: &str = r#"
SELECT
    c.id AS caption_id,
    c.content,
    c.is_public,
    i.id AS image_id,
    i.url AS image_url,
    i.description AS image_description
FROM captions c
LEFT JOIN images i ON i.id = c.image_id
WHERE c.is_public = 1
ORDER BY c.rowid
LIMIT ?1 OFFSET ?2
"#;

pub async fn count_public_captions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_PUBLIC_CAPTIONS)
        .fetch_one(pool)
        .await
}

pub async fn load_feed_candidates(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<FeedCandidateRow>> {
    sqlx::query_as::<_, FeedCandidateRow>(SQL_LOAD_FEED_CANDIDATES)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}
