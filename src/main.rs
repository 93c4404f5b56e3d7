mod db;
mod error;
mod models;
mod notify;
mod pipeline;
mod rules;
mod settings;
mod store;
mod views;

use std::sync::Arc;

use anyhow::Result;

use poem::{
    get,
    listener::TcpListener,
    middleware::{Cors, Tracing},
    post, Endpoint, EndpointExt, Route, Server,
};

use crate::settings::Settings;
use crate::store::SharedStore;

fn setup_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();
}

async fn setup_db(settings: &Settings) -> Result<SharedStore> {
    let pool = db::init_pool(&settings.database_url).await?;
    if settings.run_migrations {
        db::migrate(pool).await?;
    }

    Ok(Arc::new(db::PgStore::new(pool.clone())))
}

fn routes(store: SharedStore) -> impl Endpoint {
    Route::new()
        .at(
            "/functions/v1/process-backlink-report",
            post(views::report::process_backlink_report),
        )
        .at("/health", get(views::health::health))
        .data(store)
        .with(Cors::new())
        .with(Tracing)
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let settings = Settings::from_env()?;
    let store = setup_db(&settings).await?;

    tracing::info!("Listening on {}", settings.listen_addr);
    Server::new(TcpListener::bind(settings.listen_addr.clone()))
        .run(routes(store))
        .await?;

    Ok(())
}
