//! The swipe queue behind the feed page.
//!
//! A [`FeedSession`] is built once per page load from a pool of candidate
//! captions, then advanced one position per vote. Nothing here touches the
//! store; callers pass the session in and get it back mutated.

use std::collections::HashMap;

use rand::{seq::SliceRandom, Rng};

pub const DEFAULT_MAX_ITEMS: usize = 30;
pub const DEFAULT_MAX_PER_IMAGE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPolicy {
    pub max_items: usize,
    /// How many captions of the same image may appear in one session.
    pub max_per_image: usize,
    pub shuffle: bool,
}

impl FeedPolicy {
    pub fn new(max_items: usize, max_per_image: usize, shuffle: bool) -> Self {
        Self {
            max_items: max_items.max(1),
            max_per_image: max_per_image.max(1),
            shuffle,
        }
    }
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS, DEFAULT_MAX_PER_IMAGE, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i64(self) -> i64 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(VoteValue::Up),
            -1 => Some(VoteValue::Down),
            _ => None,
        }
    }
}

/// Which of the three store mutations a vote turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Inserted,
    Updated,
    Retracted,
}

#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub id: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CandidateVote {
    pub profile_id: String,
    pub vote_value: i64,
}

/// One caption from the sampled pool, joined with its image and every vote on it.
#[derive(Debug, Clone)]
pub struct FeedCandidate {
    pub caption_id: String,
    pub content: String,
    pub image: Option<CandidateImage>,
    pub votes: Vec<CandidateVote>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub image_id: String,
    pub image_url: String,
    pub image_description: Option<String>,
    pub caption_id: String,
    pub caption_content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub my_vote: Option<VoteValue>,
}

impl FeedItem {
    fn from_candidate(candidate: FeedCandidate, image_url: String, voter_id: &str) -> Option<Self> {
        let image = candidate.image?;
        let upvotes = candidate.votes.iter().filter(|v| v.vote_value == 1).count() as i64;
        let downvotes = candidate.votes.iter().filter(|v| v.vote_value == -1).count() as i64;
        let my_vote = candidate
            .votes
            .iter()
            .find(|v| v.profile_id == voter_id)
            .and_then(|v| VoteValue::from_i64(v.vote_value));

        Some(FeedItem {
            image_id: image.id,
            image_url,
            image_description: image.description,
            caption_id: candidate.caption_id,
            caption_content: candidate.content,
            upvotes,
            downvotes,
            my_vote,
        })
    }

    /// Item for content that was just generated: no votes yet.
    pub fn fresh(
        image_id: String,
        image_url: String,
        caption_id: String,
        caption_content: String,
    ) -> Self {
        FeedItem {
            image_id,
            image_url,
            image_description: None,
            caption_id,
            caption_content,
            upvotes: 0,
            downvotes: 0,
            my_vote: None,
        }
    }

    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    fn apply_vote(&mut self, value: VoteValue, outcome: VoteOutcome) {
        match outcome {
            VoteOutcome::Inserted => {
                self.bump(value, 1);
                self.my_vote = Some(value);
            }
            VoteOutcome::Updated => {
                if let Some(previous) = self.my_vote.filter(|v| *v != value) {
                    self.bump(previous, -1);
                }
                self.bump(value, 1);
                self.my_vote = Some(value);
            }
            VoteOutcome::Retracted => {
                self.bump(value, -1);
                self.my_vote = None;
            }
        }
    }

    fn bump(&mut self, value: VoteValue, delta: i64) {
        let counter = match value {
            VoteValue::Up => &mut self.upvotes,
            VoteValue::Down => &mut self.downvotes,
        };
        *counter = (*counter + delta).max(0);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSession {
    items: Vec<FeedItem>,
    cursor: usize,
}

impl FeedSession {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The item on screen, or `None` once every item has been swiped.
    pub fn current(&self) -> Option<&FeedItem> {
        self.items.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    fn unseen_start(&self) -> usize {
        self.cursor.min(self.items.len())
    }

    /// Items not yet swiped, starting with the one on screen.
    pub fn remaining(&self) -> &[FeedItem] {
        &self.items[self.unseen_start()..]
    }

    /// Moves to the next item. Stops at the end of the queue.
    pub fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
    }

    /// Records a vote the store has accepted and moves on, whichever branch fired.
    pub fn complete_vote(&mut self, caption_id: &str, value: VoteValue, outcome: VoteOutcome) {
        let start = self.unseen_start();
        if let Some(item) = self.items[start..]
            .iter_mut()
            .find(|item| item.caption_id == caption_id)
        {
            item.apply_vote(value, outcome);
        }
        self.advance();
    }

    /// Puts freshly generated content at the head of the unseen part of the
    /// queue. Swiped items stay where they are and the cursor lands on the
    /// new item, so an exhausted session comes back to life.
    ///
    /// "Index 0, cursor 0" of the spliced sequence is `remaining()[0]`; absolute
    /// indices keep counting the swiped items in front of it.
    pub fn insert_front(&mut self, item: FeedItem) {
        let at = self.unseen_start();
        self.items.insert(at, item);
        self.cursor = at;
    }
}

/// Greedily accepts candidates in the order received until `max_items` are
/// taken, skipping captions without a displayable image and images already
/// used `max_per_image` times.
pub fn build_session<R>(
    candidates: Vec<FeedCandidate>,
    policy: &FeedPolicy,
    voter_id: &str,
    rng: &mut R,
) -> FeedSession
where
    R: Rng + ?Sized,
{
    let mut per_image: HashMap<String, usize> = HashMap::new();
    let mut items = Vec::with_capacity(policy.max_items.min(candidates.len()));

    for candidate in candidates {
        if items.len() >= policy.max_items {
            break;
        }
        let Some(image) = candidate.image.as_ref() else {
            continue;
        };
        let Some(url) = image.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        let used = per_image.entry(image.id.clone()).or_insert(0);
        if *used >= policy.max_per_image {
            continue;
        }
        *used += 1;

        let url = url.to_string();
        if let Some(item) = FeedItem::from_candidate(candidate, url, voter_id) {
            items.push(item);
        }
    }

    if policy.shuffle {
        items.shuffle(rng);
    }

    FeedSession::new(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn candidate(caption: &str, image: &str) -> FeedCandidate {
        FeedCandidate {
            caption_id: caption.to_string(),
            content: format!("caption {caption}"),
            image: Some(CandidateImage {
                id: image.to_string(),
                url: Some(format!("https://cdn.test/{image}.jpg")),
                description: None,
            }),
            votes: vec![],
        }
    }

    fn vote(profile: &str, value: i64) -> CandidateVote {
        CandidateVote {
            profile_id: profile.to_string(),
            vote_value: value,
        }
    }

    fn build(candidates: Vec<FeedCandidate>, policy: FeedPolicy) -> FeedSession {
        build_session(candidates, &policy, "me", &mut StdRng::seed_from_u64(7))
    }

    fn caption_ids(session: &FeedSession) -> Vec<&str> {
        session.items().iter().map(|i| i.caption_id.as_str()).collect()
    }

    #[test]
    fn keeps_first_caption_per_image_in_input_order() {
        let candidates = vec![
            candidate("c1", "a"),
            candidate("c2", "a"),
            candidate("c3", "b"),
            candidate("c4", "a"),
            candidate("c5", "b"),
        ];
        let session = build(candidates, FeedPolicy::new(30, 1, false));

        assert_eq!(caption_ids(&session), vec!["c1", "c3"]);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn allows_configured_repeats_per_image() {
        let candidates = vec![
            candidate("c1", "a"),
            candidate("c2", "a"),
            candidate("c3", "a"),
            candidate("c4", "b"),
        ];
        let session = build(candidates, FeedPolicy::new(30, 2, false));

        assert_eq!(caption_ids(&session), vec!["c1", "c2", "c4"]);
    }

    #[test]
    fn stops_at_max_items() {
        let candidates = (0..50)
            .map(|i| candidate(&format!("c{i}"), &format!("img{i}")))
            .collect();
        let session = build(candidates, FeedPolicy::new(30, 1, false));

        assert_eq!(session.len(), 30);
        assert_eq!(session.items()[29].caption_id, "c29");
    }

    #[test]
    fn skips_candidates_without_a_displayable_image() {
        let mut missing = candidate("c1", "a");
        missing.image = None;
        let mut no_url = candidate("c2", "b");
        no_url.image.as_mut().unwrap().url = None;
        let mut blank_url = candidate("c3", "c");
        blank_url.image.as_mut().unwrap().url = Some("  ".into());

        let session = build(
            vec![missing, no_url, blank_url, candidate("c4", "d")],
            FeedPolicy::default(),
        );

        assert_eq!(caption_ids(&session), vec!["c4"]);
    }

    #[test]
    fn skipped_image_does_not_use_up_its_quota() {
        let mut no_url = candidate("c1", "a");
        no_url.image.as_mut().unwrap().url = None;
        let session = build(vec![no_url, candidate("c2", "a")], FeedPolicy::default());

        assert_eq!(caption_ids(&session), vec!["c2"]);
    }

    #[test]
    fn empty_pool_yields_an_exhausted_session() {
        let session = build(vec![], FeedPolicy::default());

        assert!(session.is_empty());
        assert!(session.is_exhausted());
        assert!(session.current().is_none());
    }

    #[test]
    fn counts_votes_and_finds_the_voters_own() {
        let mut c = candidate("c1", "a");
        c.votes = vec![vote("x", 1), vote("y", 1), vote("me", -1), vote("z", -1), vote("w", 1)];
        let session = build(vec![c], FeedPolicy::default());
        let item = &session.items()[0];

        assert_eq!(item.upvotes, 3);
        assert_eq!(item.downvotes, 2);
        assert_eq!(item.my_vote, Some(VoteValue::Down));
        assert_eq!(item.score(), 1);
    }

    #[test]
    fn shuffle_keeps_the_accepted_set() {
        let candidates: Vec<_> = (0..20)
            .map(|i| candidate(&format!("c{i}"), &format!("img{}", i % 10)))
            .collect();
        let plain = build(candidates.clone(), FeedPolicy::new(30, 2, false));
        let shuffled = build(candidates, FeedPolicy::new(30, 2, true));

        let mut a = caption_ids(&plain);
        let mut b = caption_ids(&shuffled);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
        assert_eq!(shuffled.len(), 20);
    }

    #[test]
    fn build_bounds_hold_for_mixed_pools() {
        for max_per_image in 1..=3 {
            let candidates = (0..100)
                .map(|i| candidate(&format!("c{i}"), &format!("img{}", i % 7)))
                .collect();
            let policy = FeedPolicy::new(12, max_per_image, true);
            let session = build(candidates, policy);

            assert!(session.len() <= 12);
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for item in session.items() {
                *seen.entry(item.image_id.as_str()).or_default() += 1;
            }
            assert!(seen.values().all(|n| *n <= max_per_image));
        }
    }

    #[test]
    fn policy_clamps_zero_caps() {
        let policy = FeedPolicy::new(0, 0, false);
        assert_eq!(policy.max_items, 1);
        assert_eq!(policy.max_per_image, 1);
    }

    #[test]
    fn completed_votes_advance_and_adjust_counts() {
        let mut session = build(
            vec![candidate("c1", "a"), candidate("c2", "b"), candidate("c3", "c")],
            FeedPolicy::default(),
        );

        session.complete_vote("c1", VoteValue::Up, VoteOutcome::Inserted);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.current().unwrap().caption_id, "c2");
        assert_eq!(session.items()[0].upvotes, 1);
        assert_eq!(session.items()[0].my_vote, Some(VoteValue::Up));
    }

    #[test]
    fn updated_vote_moves_the_count_across() {
        let mut c = candidate("c1", "a");
        c.votes = vec![vote("me", 1)];
        let mut session = build(vec![c], FeedPolicy::default());

        session.complete_vote("c1", VoteValue::Down, VoteOutcome::Updated);
        let item = &session.items()[0];
        assert_eq!((item.upvotes, item.downvotes), (0, 1));
        assert_eq!(item.my_vote, Some(VoteValue::Down));
    }

    #[test]
    fn retracted_vote_clears_own_vote_and_still_advances() {
        let mut c = candidate("c1", "a");
        c.votes = vec![vote("me", 1)];
        let mut session = build(vec![c, candidate("c2", "b")], FeedPolicy::default());

        session.complete_vote("c1", VoteValue::Up, VoteOutcome::Retracted);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.items()[0].upvotes, 0);
        assert_eq!(session.items()[0].my_vote, None);
    }

    #[test]
    fn cursor_never_passes_the_end() {
        let mut session = build(vec![candidate("c1", "a")], FeedPolicy::default());
        session.advance();
        session.advance();
        session.complete_vote("c1", VoteValue::Up, VoteOutcome::Inserted);

        assert_eq!(session.cursor(), session.len());
        assert!(session.is_exhausted());
        assert!(session.remaining().is_empty());
    }

    #[test]
    fn inserted_item_leads_the_unseen_part() {
        let candidates = (0..5)
            .map(|i| candidate(&format!("c{i}"), &format!("img{i}")))
            .collect();
        let mut session = build(candidates, FeedPolicy::default());
        session.advance();
        session.advance();

        let fresh = FeedItem::fresh("new-img".into(), "https://cdn.test/new.jpg".into(), "new".into(), "hi".into());
        session.insert_front(fresh.clone());

        assert_eq!(session.len(), 6);
        assert_eq!(session.current(), Some(&fresh));
        assert_eq!(session.remaining()[0], fresh);
        let remaining: Vec<_> = session.remaining().iter().map(|i| i.caption_id.as_str()).collect();
        assert_eq!(remaining, vec!["new", "c2", "c3", "c4"]);
        assert_eq!(session.items()[0].caption_id, "c0");
        assert_eq!(session.items()[1].caption_id, "c1");
    }

    #[test]
    fn insertion_revives_an_exhausted_session() {
        let mut session = build(vec![candidate("c1", "a")], FeedPolicy::default());
        session.advance();
        assert!(session.is_exhausted());

        session.insert_front(FeedItem::fresh("i".into(), "u".into(), "new".into(), "hi".into()));
        assert!(!session.is_exhausted());
        assert_eq!(session.current().unwrap().caption_id, "new");
    }

    #[test]
    fn vote_values_round_trip_through_integers() {
        assert_eq!(VoteValue::from_i64(1), Some(VoteValue::Up));
        assert_eq!(VoteValue::from_i64(-1), Some(VoteValue::Down));
        assert_eq!(VoteValue::from_i64(0), None);
        assert_eq!(VoteValue::Down.as_i64(), -1);
    }
}
