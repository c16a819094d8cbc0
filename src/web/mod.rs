pub mod middleware;
pub mod routes;

use askama::Template;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn,
    response::{Html, IntoResponse, Response},
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;
use middleware::auth as auth_middleware;
use routes::{auth, feed, gallery};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!("Template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/feed", get(feed::feed_page))
        .route("/feed/vote", post(feed::vote_handler))
        .route(
            "/feed/upload",
            post(feed::upload_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/gallery", get(gallery::gallery_handler))
        .route("/logout", post(auth::logout_handler))
        .layer(from_fn(auth_middleware::require_auth));

    Router::new()
        .route("/", get(auth::root_handler))
        .route("/login", get(auth::login_page))
        .route("/auth/signin/:provider", get(auth::sign_in_handler))
        .route("/auth/callback", get(auth::callback_handler))
        .merge(protected_routes)
        .nest_service("/assets", get_service(ServeDir::new("assets")))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
