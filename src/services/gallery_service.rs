use sqlx::SqlitePool;

use crate::database::images_repo;

pub struct GalleryImageView {
    pub id: String,
    /// None when the row has no usable URL; the tile shows a placeholder.
    pub url: Option<String>,
    pub description: String,
    pub alt: String,
}

pub async fn load_gallery(pool: &SqlitePool) -> sqlx::Result<Vec<GalleryImageView>> {
    let rows = images_repo::list_images(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let url = row.url.filter(|u| !u.trim().is_empty());
            let description = row.description.unwrap_or_default();
            let alt = if description.trim().is_empty() {
                "Image".to_string()
            } else {
                description.clone()
            };
            GalleryImageView {
                id: row.id,
                url,
                description,
                alt,
            }
        })
        .collect())
}
