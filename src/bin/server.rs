//! Camp API server.
//!
//! Reads `.env`, then environment variables. Without `DATABASE_URL` everything is kept in memory.

use camp_api::{app, ensure_database_exists, ensure_sys_tables, load_catalog, AppState, Settings, SiteConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("camp_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let catalog = load_catalog(settings.catalog_path.as_deref()).await?;
    let site = SiteConfig::load(settings.site_config_path.as_deref()).await?;
    tracing::info!(routers = catalog.routers.len(), site = %site.name, "catalog loaded");

    let state = match settings.database_url.clone() {
        Some(database_url) => {
            ensure_database_exists(&database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;
            ensure_sys_tables(&pool, &settings.schema).await?;
            AppState::postgres(pool, settings, catalog, site)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            AppState::in_memory(settings, catalog, site)?
        }
    };

    let listener = TcpListener::bind(&state.settings.bind_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!("camp-server listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
