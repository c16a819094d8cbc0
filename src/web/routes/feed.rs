use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::services::feed_session::{FeedItem, FeedSession, VoteOutcome, VoteValue};
use crate::services::{feed_service, profile_service, vote_service};
use crate::state::{AppState, Checkout};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;

pub const UPLOAD_FIELD: &str = "image";

pub struct FeedCardView {
    pub caption_id: String,
    pub caption: String,
    pub image_url: String,
    pub image_alt: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub score: i64,
    pub my_vote: &'static str, // up|down|""
}

impl From<&FeedItem> for FeedCardView {
    fn from(item: &FeedItem) -> Self {
        FeedCardView {
            caption_id: item.caption_id.clone(),
            caption: item.caption_content.clone(),
            image_url: item.image_url.clone(),
            image_alt: item
                .image_description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "Image".to_string()),
            upvotes: item.upvotes,
            downvotes: item.downvotes,
            score: item.score(),
            my_vote: match item.my_vote {
                Some(VoteValue::Up) => "up",
                Some(VoteValue::Down) => "down",
                None => "",
            },
        }
    }
}

#[derive(Template)]
#[template(path = "feed.html")]
pub struct FeedTemplate {
    pub email: String,
    pub card: Option<FeedCardView>,
    pub position: usize,
    pub total: usize,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl FeedTemplate {
    fn new(user: &AuthenticatedUser, session: &FeedSession) -> Self {
        FeedTemplate {
            email: user.email.clone().unwrap_or_default(),
            card: session.current().map(FeedCardView::from),
            position: session.cursor() + 1,
            total: session.len(),
            notice: None,
            error: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub caption_id: String,
    pub value: i64, // 1|-1
}

/// A page load always starts a new session.
pub async fn feed_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Response, AppError> {
    let profile_id = profile_service::ensure_profile_id(&state.pool, &user.id).await?;
    let session = feed_service::build_feed(
        &state.pool,
        &state.config.feed_policy(),
        state.config.feed_candidate_pool,
        &profile_id,
        &mut StdRng::from_entropy(),
    )
    .await?;
    info!(user_id = %user.id, items = session.len(), "Feed built");

    let page = FeedTemplate::new(&user, &session);
    state.sessions.replace(&user.id, session);
    Ok(render(&page))
}

pub async fn vote_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Form(form): Form<VoteForm>,
) -> Result<Response, AppError> {
    let Some(value) = VoteValue::from_i64(form.value) else {
        return Ok((StatusCode::BAD_REQUEST, "vote must be 1 or -1").into_response());
    };
    let profile_id = profile_service::ensure_profile_id(&state.pool, &user.id).await?;

    let mut lease = match state.sessions.checkout(&user.id) {
        Checkout::Ready(lease) => lease,
        Checkout::Busy => return Ok(busy_response()),
        Checkout::Missing => return Ok(Redirect::to("/feed").into_response()),
    };

    // Stale form (back button, double submit): show what is actually next.
    if lease.current().map(|item| item.caption_id.as_str()) != Some(form.caption_id.as_str()) {
        let mut page = FeedTemplate::new(&user, &lease);
        page.notice = Some("That caption was already handled.".to_string());
        return Ok(render(&page));
    }

    // The lease hands the session back even if this future is dropped here.
    let result =
        vote_service::vote(&state.pool, &mut lease, &form.caption_id, value, &profile_id).await;
    let mut page = FeedTemplate::new(&user, &lease);
    drop(lease);

    match result {
        Ok(outcome) => {
            page.notice = Some(
                match outcome {
                    VoteOutcome::Inserted => "Vote saved.",
                    VoteOutcome::Updated => "Vote changed.",
                    VoteOutcome::Retracted => "Vote removed.",
                }
                .to_string(),
            );
            Ok(render(&page))
        }
        Err(e) => {
            page.error = Some(e.to_string());
            let mut response = render(&page);
            *response.status_mut() = StatusCode::BAD_GATEWAY;
            Ok(response)
        }
    }
}

pub async fn upload_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Mutation(format!("upload was not readable: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Mutation(format!("upload was not readable: {}", e)))?;
        upload = Some((content_type, bytes.to_vec()));
        break;
    }
    let Some((content_type, bytes)) = upload else {
        return Ok((StatusCode::BAD_REQUEST, "choose an image to upload").into_response());
    };

    let generated = match state
        .pipeline
        .upload_and_caption(&user.access_token, &content_type, bytes)
        .await
    {
        Ok(generated) => generated,
        Err(e) => return Ok(feed_with_error(&state, &user, AppError::from(e))),
    };
    let Some(item) = generated.into_feed_item() else {
        warn!(user_id = %user.id, "Pipeline returned no captions");
        let err = AppError::Mutation("no captions were generated for this image".to_string());
        return Ok(feed_with_error(&state, &user, err));
    };

    let mut page = match state.sessions.checkout(&user.id) {
        Checkout::Ready(mut lease) => {
            lease.insert_front(item);
            FeedTemplate::new(&user, &lease)
        }
        Checkout::Busy => return Ok(busy_response()),
        Checkout::Missing => {
            let profile_id = profile_service::ensure_profile_id(&state.pool, &user.id).await?;
            let mut session = feed_service::build_feed(
                &state.pool,
                &state.config.feed_policy(),
                state.config.feed_candidate_pool,
                &profile_id,
                &mut StdRng::from_entropy(),
            )
            .await?;
            session.insert_front(item);
            let page = FeedTemplate::new(&user, &session);
            state.sessions.replace(&user.id, session);
            page
        }
    };
    info!(user_id = %user.id, "Uploaded image added to the feed");

    page.notice = Some("Your image is up next.".to_string());
    Ok(render(&page))
}

fn busy_response() -> Response {
    (StatusCode::CONFLICT, "A vote is already being saved").into_response()
}

/// Re-renders the untouched session with an inline error.
fn feed_with_error(state: &AppState, user: &AuthenticatedUser, err: AppError) -> Response {
    // A vote holds the session; an empty page would pass for "feed finished".
    if state.sessions.is_busy(&user.id) {
        warn!(user_id = %user.id, error = %err, "Upload failed while a vote was in flight");
        return busy_response();
    }
    let session = state.sessions.snapshot(&user.id).unwrap_or_default();
    let mut page = FeedTemplate::new(user, &session);
    page.error = Some(err.to_string());
    let mut response = render(&page);
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}
