pub mod caption_votes_repo;
pub mod captions_repo;
pub mod images_repo;
pub mod profiles_repo;
pub mod schema;
