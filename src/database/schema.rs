//! Table definitions for a local copy of the data store.
//!
//! Production points `DATABASE_URL` at a store that already has these tables;
//! `ensure_schema` exists for local development (`DB_ENSURE_SCHEMA=true`) and tests.
//! Every statement is idempotent.

use sqlx::SqlitePool;
use tracing::info;

const SQL_CREATE_IMAGES: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY,
    url TEXT,
    description TEXT
)
"#;

const SQL_CREATE_CAPTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS captions (
    id TEXT PRIMARY KEY,
    image_id TEXT,
    content TEXT NOT NULL,
    is_public INTEGER NOT NULL DEFAULT 1
)
"#;

const SQL_CREATE_PROFILES: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE
)
"#;

const SQL_CREATE_CAPTION_VOTES: &str = r#"
CREATE TABLE IF NOT EXISTS caption_votes (
    id TEXT PRIMARY KEY,
    caption_id TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    vote_value INTEGER NOT NULL CHECK (vote_value IN (-1, 1)),
    created_at TEXT NOT NULL,
    modified_at TEXT NOT NULL,
    UNIQUE (caption_id, profile_id)
)
"#;

const SQL_CREATE_CAPTIONS_PUBLIC_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_captions_public ON captions (is_public)
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for sql in [
        SQL_CREATE_IMAGES,
        SQL_CREATE_CAPTIONS,
        SQL_CREATE_PROFILES,
        SQL_CREATE_CAPTION_VOTES,
        SQL_CREATE_CAPTIONS_PUBLIC_INDEX,
    ] {
        sqlx::query(sql).execute(pool).await?;
    }
    info!("Schema ensured (images, captions, profiles, caption_votes)");
    Ok(())
}
