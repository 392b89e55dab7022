use std::sync::Arc;

use roster_api::config::AppConfig;
use roster_api::routes;
use roster_api::store::MongoUserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up MONGODB_URI and PORT.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let store = MongoUserStore::connect(&config).await?;

    let app = routes::app(Arc::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
