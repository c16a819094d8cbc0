use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use captionswipe::database::schema;
use captionswipe::web::build_router;
use captionswipe::{AppState, Config};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,captionswipe=debug")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Connecting to data store: {}", config.database_url);
    let pool = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await
        .expect("cannot connect to the data store");

    if config.ensure_schema {
        schema::ensure_schema(&pool)
            .await
            .expect("cannot create tables");
    }

    let addr = config.bind_addr();
    let app = build_router(AppState::new(pool, config));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!("Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(bound) => info!(
            build = env!("CAPTIONSWIPE_BUILD_ID"),
            "Listening on http://{}", bound
        ),
        Err(e) => warn!("Listening, but local address unknown: {}", e),
    }

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
