use sqlx::SqlitePool;

use crate::models::ImagesRow;

pub const SQL_LIST_IMAGES: &str = r#"
SELECT
    id,
    url,
    description
FROM images
ORDER BY rowid
"#;

pub async fn list_images(pool: &SqlitePool) -> sqlx::Result<Vec<ImagesRow>> {
    sqlx::query_as::<_, ImagesRow>(SQL_LIST_IMAGES)
        .fetch_all(pool)
        .await
}
