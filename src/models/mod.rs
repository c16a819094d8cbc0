pub mod caption_votes;
pub mod feed_candidate;
pub mod images;
pub mod profiles;

pub use caption_votes::CaptionVotesRow;
pub use feed_candidate::FeedCandidateRow;
pub use images::ImagesRow;
pub use profiles::ProfilesRow;
