use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::caption_pipeline_service::CaptionPipeline;
use crate::services::feed_session::FeedSession;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub pipeline: CaptionPipeline,
    pub sessions: FeedSessions,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let http = reqwest::Client::new();
        let pipeline = CaptionPipeline::new(http.clone(), config.pipeline_api_url.clone());
        Self {
            pool,
            config: Arc::new(config),
            http,
            pipeline,
            sessions: FeedSessions::default(),
        }
    }
}

enum Slot {
    Idle(FeedSession),
    /// Checked out by an in-flight request.
    Busy,
}

pub enum Checkout {
    Ready(SessionLease),
    Busy,
    Missing,
}

/// One feed session per signed-in user, held only in memory.
#[derive(Clone, Default)]
pub struct FeedSessions {
    inner: Arc<Mutex<HashMap<String, Slot>>>,
}

impl FeedSessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores a freshly built session, dropping whatever the user had before.
    pub fn replace(&self, user_id: &str, session: FeedSession) {
        self.lock().insert(user_id.to_string(), Slot::Idle(session));
    }

    /// Takes the session out for exclusive use. It goes back when the lease
    /// is dropped, including when the request is abandoned mid-flight.
    pub fn checkout(&self, user_id: &str) -> Checkout {
        let mut map = self.lock();
        match map.get_mut(user_id) {
            None => Checkout::Missing,
            Some(Slot::Busy) => Checkout::Busy,
            Some(slot) => match std::mem::replace(slot, Slot::Busy) {
                Slot::Idle(session) => Checkout::Ready(SessionLease {
                    sessions: self.clone(),
                    user_id: user_id.to_string(),
                    session,
                }),
                Slot::Busy => Checkout::Busy,
            },
        }
    }

    // Only fills a slot still marked busy: a rebuild or sign-out during the
    // lease wins over the leased copy.
    fn restore(&self, user_id: &str, session: FeedSession) {
        let mut map = self.lock();
        if let Some(slot @ Slot::Busy) = map.get_mut(user_id) {
            *slot = Slot::Idle(session);
        }
    }

    pub fn discard(&self, user_id: &str) {
        self.lock().remove(user_id);
    }

    pub fn is_busy(&self, user_id: &str) -> bool {
        matches!(self.lock().get(user_id), Some(Slot::Busy))
    }

    pub fn snapshot(&self, user_id: &str) -> Option<FeedSession> {
        match self.lock().get(user_id) {
            Some(Slot::Idle(session)) => Some(session.clone()),
            _ => None,
        }
    }
}

/// Exclusive access to one user's session; returns it to the registry on drop.
pub struct SessionLease {
    sessions: FeedSessions,
    user_id: String,
    session: FeedSession,
}

impl Deref for SessionLease {
    type Target = FeedSession;

    fn deref(&self) -> &FeedSession {
        &self.session
    }
}

impl DerefMut for SessionLease {
    fn deref_mut(&mut self) -> &mut FeedSession {
        &mut self.session
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let session = std::mem::take(&mut self.session);
        self.sessions.restore(&self.user_id, session);
    }
}
