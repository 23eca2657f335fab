use std::sync::Arc;

mod app;
mod config;
mod db;
mod error;
mod logging;
mod response;
mod state;
mod users;

use crate::{config::AppConfig, state::AppState, users::repo::PgUserRepo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let pool = db::connect(&config.database).await?;
    db::apply_schema(&pool).await;

    let state = AppState::from_parts(Arc::new(PgUserRepo::new(pool)));
    app::serve(app::build_app(state), &config.server).await
}
