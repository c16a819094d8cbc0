#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfilesRow {
    pub id: String,
    pub user_id: String,
}
