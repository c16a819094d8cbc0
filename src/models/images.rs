#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImagesRow {
    pub id: String,
    pub url: Option<String>,
    pub description: Option<String>,
}
