use sqlx::SqlitePool;

use crate::models::ProfilesRow;

pub const SQL_LOAD_PROFILE_BY_USER: &str = r#"
SELECT id, user_id
FROM profiles
WHERE user_id = ?1
LIMIT 1
"#;

const SQL_INSERT_PROFILE: &str = r#"
INSERT INTO profiles (id, user_id)
VALUES (?1, ?2)
ON CONFLICT (user_id) DO NOTHING
"#;

pub async fn load_profile_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Option<ProfilesRow>> {
    sqlx::query_as::<_, ProfilesRow>(SQL_LOAD_PROFILE_BY_USER)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_profile(pool: &SqlitePool, id: &str, user_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_PROFILE)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
