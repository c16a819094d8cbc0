use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use cookie::{time::Duration, Cookie, SameSite};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::services::identity_service;
use crate::state::AppState;
use crate::web::middleware::auth::{
    current_user, AuthenticatedUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::web::render;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub provider: String,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoginQuery {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Signed-in visitors go straight to the feed; everyone else is sent into sign-in.
pub async fn root_handler(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    if current_user(&headers).is_some() {
        return Redirect::to("/feed");
    }
    Redirect::to(&format!("/auth/signin/{}", state.config.auth_provider))
}

pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Response {
    render(&LoginTemplate {
        provider: state.config.auth_provider.clone(),
        message: query.message.filter(|m| !m.trim().is_empty()),
    })
}

pub async fn sign_in_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Response {
    match identity_service::sign_in_url(
        &state.config.auth_api_url,
        &provider,
        &state.config.site_url,
    ) {
        Some(url) => {
            info!(provider = %provider, "Starting sign-in");
            Redirect::to(&url).into_response()
        }
        None => (StatusCode::BAD_REQUEST, "Unknown sign-in provider").into_response(),
    }
}

pub async fn callback_handler(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(err) = query.error {
        let message = query.error_description.unwrap_or(err);
        warn!("Sign-in returned an error: {}", message);
        return login_with_message(&state, message);
    }
    let Some(code) = query.code.filter(|c| !c.trim().is_empty()) else {
        return login_with_message(&state, "Sign-in was not completed.".to_string());
    };

    let tokens =
        match identity_service::exchange_code(&state.http, &state.config.auth_api_url, &code).await
        {
            Ok(tokens) => tokens,
            Err(AppError::AuthRequired) => {
                return login_with_message(&state, "Sign-in link expired, try again.".to_string())
            }
            Err(e) => return e.into_response(),
        };

    let mut response = Redirect::to("/feed").into_response();
    append_cookie(&mut response, session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token));
    if let Some(refresh) = tokens.refresh_token {
        append_cookie(&mut response, session_cookie(REFRESH_TOKEN_COOKIE, refresh));
    }
    response
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Response {
    identity_service::sign_out(&state.http, &state.config.auth_api_url, &user.access_token).await;
    state.sessions.discard(&user.id);

    let mut response = Redirect::to("/login").into_response();
    append_cookie(&mut response, expired_cookie(ACCESS_TOKEN_COOKIE));
    append_cookie(&mut response, expired_cookie(REFRESH_TOKEN_COOKIE));
    response
}

fn login_with_message(state: &AppState, message: String) -> Response {
    let mut response = render(&LoginTemplate {
        provider: state.config.auth_provider.clone(),
        message: Some(message),
    });
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new());
    cookie.set_max_age(Duration::ZERO);
    cookie
}

fn append_cookie(response: &mut Response, cookie: Cookie<'static>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!("Cannot encode {} cookie: {}", cookie.name(), e),
    }
}
