use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::profiles_repo;

/// Voter id for an authenticated user, creating the profile on first visit.
pub async fn ensure_profile_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<String> {
    if let Some(profile) = profiles_repo::load_profile_by_user(pool, user_id).await? {
        return Ok(profile.id);
    }

    let id = Uuid::new_v4().to_string();
    profiles_repo::insert_profile(pool, &id, user_id).await?;
    info!(user_id = %user_id, "Created voter profile");

    // A concurrent first visit may have won the insert; read back whichever row exists.
    let profile = profiles_repo::load_profile_by_user(pool, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(profile.id)
}
