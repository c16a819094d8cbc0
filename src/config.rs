use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::services::feed_session::FeedPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Public origin of this site, used to build the OAuth callback URL.
    pub site_url: String,
    pub auth_api_url: String,
    pub auth_provider: String,
    pub pipeline_api_url: String,
    pub feed_max_items: usize,
    pub feed_max_per_image: usize,
    pub feed_shuffle: bool,
    /// How many public captions are sampled from the store per feed build.
    pub feed_candidate_pool: i64,
    pub ensure_schema: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            host: try_load("HOST", "127.0.0.1".to_string()),
            port: try_load("PORT", 3000),
            site_url: trimmed_url(try_load("SITE_URL", "http://localhost:3000".to_string())),
            auth_api_url: trimmed_url(try_load(
                "AUTH_API_URL",
                "http://auth.localhost:8080/auth/v1".to_string(),
            )),
            auth_provider: try_load("AUTH_PROVIDER", "google".to_string()),
            pipeline_api_url: trimmed_url(try_load(
                "PIPELINE_API_URL",
                "http://pipeline.localhost:8080".to_string(),
            )),
            feed_max_items: try_load("FEED_MAX_ITEMS", 30),
            feed_max_per_image: try_load("FEED_MAX_PER_IMAGE", 1),
            feed_shuffle: try_load("FEED_SHUFFLE", false),
            feed_candidate_pool: try_load("FEED_CANDIDATE_POOL", 100),
            ensure_schema: try_load("DB_ENSURE_SCHEMA", false),
        })
    }

    pub fn feed_policy(&self) -> FeedPolicy {
        FeedPolicy::new(self.feed_max_items, self.feed_max_per_image, self.feed_shuffle)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_or_default(key, &raw, default),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

fn parse_or_default<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

fn trimmed_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
