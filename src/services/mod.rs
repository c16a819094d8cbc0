pub mod caption_pipeline_service;
pub mod feed_service;
pub mod feed_session;
pub mod gallery_service;
pub mod identity_service;
pub mod profile_service;
pub mod vote_service;
