use askama::Template;
use axum::{extract::State, response::Response, Extension};
use sqlx::SqlitePool;
use tracing::error;

use crate::error::AppError;
use crate::services::gallery_service::{self, GalleryImageView};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;

#[derive(Template)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate {
    pub email: String,
    pub images: Vec<GalleryImageView>,
}

pub async fn gallery_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(pool): State<SqlitePool>,
) -> Result<Response, AppError> {
    let images = gallery_service::load_gallery(&pool).await.map_err(|e| {
        error!("Gallery load failed: {}", e);
        AppError::from(e)
    })?;

    Ok(render(&GalleryTemplate {
        email: user.email.unwrap_or_default(),
        images,
    }))
}
