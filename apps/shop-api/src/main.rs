//! Shop API - conversational product search server

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        url = %config.database.url,
        remote = config.database.is_remote(),
        "Connecting to libSQL catalog"
    );
    let db = database::libsql::connect_with_retry(&config.database, None).await?;
    info!("Successfully connected to libSQL catalog");

    let state = AppState::new(config, db);

    let api_routes = api::routes(&state)?;
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &state.config.server)?;
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.db.clone()));

    info!(
        "Starting {} v{} on port {}",
        state.config.app.name, state.config.app.version, state.config.server.port
    );

    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, async move {
        info!("Shutting down: closing libSQL catalog");
        drop(state);
        info!("libSQL catalog closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Shop API shutdown complete");
    Ok(())
}
