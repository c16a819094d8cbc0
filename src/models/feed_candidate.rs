// Public caption LEFT JOIN images; image columns are NULL when the caption's
// image reference is dangling.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedCandidateRow {
    pub caption_id: String,
    pub content: String,
    pub is_public: i64,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    pub image_description: Option<String>,
}
