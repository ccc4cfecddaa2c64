//! Fixtures shared by the end-to-end tests: a real actix server on an
//! ephemeral port, backed by whichever store the test hands in.

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use chrono::{DateTime, TimeZone, Utc};
use gg_api::middleware::{cors_policy, standard_middleware};
use gg_api::{configure_routes, AppState};
use gg_client::{ClientSettings, HttpGossipApi, SyncController};
use gg_core::clock::ManualClock;
use gg_core::traits::{FixedAuthor, GossipStore};
use gg_core::GossipService;
use gg_store_memory::MemoryGossipStore;

pub struct TestServer {
    pub base_url: String,
    pub clock: Arc<ManualClock>,
}

impl TestServer {
    pub fn api(&self) -> HttpGossipApi {
        HttpGossipApi::new(self.base_url.clone())
    }

    /// A controller sharing the server's clock, so countdowns are exact.
    pub fn controller(&self) -> SyncController {
        SyncController::new(
            Arc::new(self.api()),
            self.clock.clone(),
            ClientSettings::for_base_url(self.base_url.clone()),
        )
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 14, 19, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Starts a single-worker server over an in-memory store.
pub fn spawn_memory_server() -> anyhow::Result<TestServer> {
    spawn_server(Arc::new(MemoryGossipStore::new()))
}

/// Starts a single-worker server on `127.0.0.1:0`.
///
/// Must be called from inside an actix system (`#[actix_web::test]`).
pub fn spawn_server(store: Arc<dyn GossipStore>) -> anyhow::Result<TestServer> {
    let clock = Arc::new(ManualClock::new(t0()));
    let service = GossipService::new(store, clock.clone(), Arc::new(FixedAuthor::default()));
    let state = web::Data::new(AppState { service });

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .workers(1)
    .listen(listener)?
    .run();
    actix_web::rt::spawn(server);

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        clock,
    })
}
