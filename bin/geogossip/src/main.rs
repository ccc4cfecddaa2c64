//! # GeoGossip Binary
//!
//! Assembles the server from configuration and compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use gg_api::middleware::{cors_policy, standard_middleware};
use gg_api::{configure_routes, AppState};
use gg_config::{LogFormat, Settings};
use gg_core::clock::SystemClock;
use gg_core::traits::{FixedAuthor, GossipStore};
use gg_core::GossipService;
use gg_store_memory::MemoryGossipStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use gg_db_sqlite::SqliteGossipStore;

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn GossipStore>> {
    if settings.uses_memory_store() {
        info!("using in-memory gossip store; posts are lost on restart");
        return Ok(Arc::new(MemoryGossipStore::new()));
    }

    #[cfg(feature = "db-sqlite")]
    {
        let store = SqliteGossipStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .with_context(|| format!("failed to open {}", settings.database.url))?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "db-sqlite"))]
    {
        anyhow::bail!(
            "database.url {} needs the db-sqlite feature; use \"memory\" instead",
            settings.database.url
        )
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings);

    let store = build_store(&settings).await?;
    let service = GossipService::new(
        store,
        Arc::new(SystemClock),
        Arc::new(FixedAuthor::new(settings.author.id.clone())),
    );
    let state = web::Data::new(AppState { service });

    let (host, port) = settings.bind_address();
    info!(%host, port, "GeoGossip starting on http://{host}:{port}");

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .app_data(state.clone())
            .configure(configure_routes)
    });
    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    server
        .bind((host.as_str(), port))
        .with_context(|| format!("failed to bind {host}:{port}"))?
        .run()
        .await
        .context("server terminated")
}
