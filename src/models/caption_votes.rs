#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaptionVotesRow {
    pub id: String,
    pub caption_id: String,
    pub profile_id: String,
    pub vote_value: i64,
    pub created_at: String,
    pub modified_at: String,
}
