use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn valid_provider(provider: &str) -> bool {
    !provider.is_empty() && provider.bytes().all(|b| b.is_ascii_lowercase())
}

/// Where to send the browser to start an OAuth sign-in; `None` for an unknown-looking provider.
pub fn sign_in_url(auth_api_url: &str, provider: &str, site_url: &str) -> Option<String> {
    if !valid_provider(provider) {
        return None;
    }
    let callback = format!("{}/auth/callback", site_url.trim_end_matches('/'));
    let authorize = format!("{}/authorize", auth_api_url.trim_end_matches('/'));
    Url::parse_with_params(&authorize, &[("provider", provider), ("redirect_to", &callback)])
        .map(|u| u.to_string())
        .map_err(|e| error!("Invalid AUTH_API_URL {}: {}", auth_api_url, e))
        .ok()
}

pub async fn exchange_code(
    client: &Client,
    auth_api_url: &str,
    code: &str,
) -> Result<SessionTokens, AppError> {
    let url = format!("{}/token?grant_type=pkce", auth_api_url.trim_end_matches('/'));
    let resp = client
        .post(&url)
        .json(&json!({ "auth_code": code }))
        .send()
        .await
        .map_err(|e| {
            error!("Request to identity provider failed: {}", e);
            AppError::DataFetch(format!("identity provider unreachable: {}", e))
        })?;

    let status = resp.status();
    if !status.is_success() {
        warn!(status = %status, "Code exchange rejected");
        return Err(AppError::AuthRequired);
    }

    let tokens = resp.json::<SessionTokens>().await.map_err(|e| {
        error!("Cannot parse identity provider response: {}", e);
        AppError::DataFetch(format!("unreadable sign-in response: {}", e))
    })?;
    info!("Sign-in code exchanged for session");
    Ok(tokens)
}

/// Best effort: the local cookies are cleared whatever the provider says.
pub async fn sign_out(client: &Client, auth_api_url: &str, access_token: &str) {
    let url = format!("{}/logout", auth_api_url.trim_end_matches('/'));
    match client.post(&url).bearer_auth(access_token).send().await {
        Ok(resp) if resp.status().is_success() => info!("Signed out at identity provider"),
        Ok(resp) => warn!(status = %resp.status(), "Identity provider sign-out rejected"),
        Err(e) => warn!("Identity provider sign-out failed: {}", e),
    }
}
