#![allow(dead_code)]

use axum::body::Body;
use base64::{engine::general_purpose, Engine as _};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use captionswipe::database::schema;
use captionswipe::Config;

/// Single-connection in-memory store with the tables created.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    schema::ensure_schema(&pool).await.expect("schema");
    pool
}

/// On-disk store, so a second connection can hold the write lock against the pool.
pub async fn file_pool() -> (SqlitePool, String) {
    let path = std::env::temp_dir().join(format!("captionswipe-{}.db", uuid::Uuid::new_v4()));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("file sqlite");
    schema::ensure_schema(&pool).await.expect("schema");
    (pool, url)
}

pub async fn seed_image(pool: &SqlitePool, id: &str, url: Option<&str>) {
    sqlx::query("INSERT INTO images (id, url, description) VALUES (?1, ?2, ?3)")
        .bind(id)
        .bind(url)
        .bind(format!("description of {id}"))
        .execute(pool)
        .await
        .expect("insert image");
}

pub async fn seed_caption(pool: &SqlitePool, id: &str, image_id: &str, is_public: bool) {
    sqlx::query("INSERT INTO captions (id, image_id, content, is_public) VALUES (?1, ?2, ?3, ?4)")
        .bind(id)
        .bind(image_id)
        .bind(format!("caption text {id}"))
        .bind(is_public as i64)
        .execute(pool)
        .await
        .expect("insert caption");
}

pub async fn seed_vote(pool: &SqlitePool, caption_id: &str, profile_id: &str, value: i64) {
    sqlx::query(
        "INSERT INTO caption_votes (id, caption_id, profile_id, vote_value, created_at, modified_at) \
         VALUES (?1, ?2, ?3, ?4, '2024-01-01T00:00:00.000Z', '2024-01-01T00:00:00.000Z')",
    )
    .bind(format!("{caption_id}:{profile_id}"))
    .bind(caption_id)
    .bind(profile_id)
    .bind(value)
    .execute(pool)
    .await
    .expect("insert vote");
}

/// `count` images, one public caption each (`c0`, `c1`, ...) on image `img0`, `img1`, ...
pub async fn seed_feed(pool: &SqlitePool, count: usize) {
    for i in 0..count {
        let image = format!("img{i}");
        seed_image(pool, &image, Some(&format!("https://cdn.test/{image}.jpg"))).await;
        seed_caption(pool, &format!("c{i}"), &image, true).await;
    }
}

pub async fn stored_votes(pool: &SqlitePool, caption_id: &str) -> Vec<(String, i64)> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT profile_id, vote_value FROM caption_votes WHERE caption_id = ?1",
    )
    .bind(caption_id)
    .fetch_all(pool)
    .await
    .expect("select votes")
}

pub fn test_config(pipeline_api_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        site_url: "http://site.test".to_string(),
        // Nothing listens here; sign-out is best effort and must not hang tests.
        auth_api_url: "http://127.0.0.1:9/auth/v1".to_string(),
        auth_provider: "google".to_string(),
        pipeline_api_url: pipeline_api_url.to_string(),
        feed_max_items: 30,
        feed_max_per_image: 1,
        feed_shuffle: false,
        feed_candidate_pool: 100,
        ensure_schema: true,
    }
}

/// Unsigned JWT carrying `sub` and `email`, as the auth middleware reads it.
pub fn session_token(user_id: &str) -> String {
    let payload = serde_json::json!({ "sub": user_id, "email": format!("{user_id}@example.test") });
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.signature",
        general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub fn session_cookie(user_id: &str) -> String {
    format!("access_token={}", session_token(user_id))
}

pub async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
