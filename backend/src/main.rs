//! Backend entry-point: loads settings, wires adapters and serves the
//! WebSocket endpoint.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use welp_backend::config::WelpSettings;
use welp_backend::domain::ports::{HistoryStore, IdentityProvider};
use welp_backend::domain::{SearchPipeline, SearchPipelinePorts};
use welp_backend::inbound::ws;
use welp_backend::inbound::ws::state::WsState;
use welp_backend::outbound::firebase::{FirebaseHistoryStore, FirebaseIdentityProvider};
use welp_backend::outbound::memory::{InMemoryHistoryStore, InMemoryIdentityProvider};
use welp_backend::outbound::zomato::ZomatoHttpSource;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = WelpSettings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    let ws_state = build_state(&settings)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    info!(%bind_addr, "starting server");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ws_state.clone()))
            .service(ws::ws_entry)
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn build_state(settings: &WelpSettings) -> std::io::Result<WsState> {
    let timeout = settings.request_timeout();
    let source = ZomatoHttpSource::new(
        settings.zomato_base_url().map_err(std::io::Error::other)?,
        settings.zomato_api_key().map_err(std::io::Error::other)?,
        timeout,
    )
    .map_err(std::io::Error::other)?;

    let (history, identity): (Arc<dyn HistoryStore>, Arc<dyn IdentityProvider>) =
        match settings.firebase().map_err(std::io::Error::other)? {
            Some(firebase) => (
                Arc::new(
                    FirebaseHistoryStore::new(firebase.database_url, timeout)
                        .map_err(std::io::Error::other)?,
                ),
                Arc::new(
                    FirebaseIdentityProvider::new(
                        firebase.identity_base_url,
                        firebase.api_key,
                        timeout,
                    )
                    .map_err(std::io::Error::other)?,
                ),
            ),
            None => {
                warn!("Firebase is not configured; history and accounts are kept in memory");
                (
                    Arc::new(InMemoryHistoryStore::new()),
                    Arc::new(InMemoryIdentityProvider::new()),
                )
            }
        };

    let pipeline = SearchPipeline::new(
        SearchPipelinePorts::new(Arc::new(source), history),
        Arc::new(DefaultClock),
    )
    .with_search_timeout(settings.search_timeout());

    Ok(WsState::new(
        Arc::new(pipeline),
        identity,
        settings.allowed_origins().map_err(std::io::Error::other)?,
    ))
}
