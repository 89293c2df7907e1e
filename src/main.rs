mod albums;
mod app;
mod artists;
mod auth;
mod config;
mod error;
mod genres;
mod media;
mod pagination;
mod playlists;
mod songs;
mod state;
#[cfg(test)]
mod test_support;
mod users;
mod validation;

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tunebox=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = config::AppConfig::from_env()?;
    tracing::info!(jwt = ?config.jwt, media = ?config.media, "configuration loaded");
    let bind_addr = config.bind_addr;

    let app_state = state::AppState::init(config).await?;

    sqlx::migrate!("./migrations")
        .run(&app_state.db)
        .await
        .context("run database migrations")?;

    app::serve(app::build_app(app_state), bind_addr).await
}
