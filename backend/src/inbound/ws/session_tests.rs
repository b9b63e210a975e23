//! WebSocket session handler tests.

use super::*;
use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, RestaurantSource, RestaurantSourceError,
};
use crate::domain::{
    CityName, Coordinates, Credentials, Identity, LocationId, RestaurantRecord, SearchPipeline,
    SearchPipelinePorts,
};
use crate::inbound::ws;
use crate::inbound::ws::AllowedOrigins;
use crate::inbound::ws::state::WsState;
use crate::outbound::memory::{InMemoryHistoryStore, InMemoryIdentityProvider};
use actix_web::{App, HttpServer, dev::Server, dev::ServerHandle, http::header};
use async_trait::async_trait;
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use chrono::{DateTime, Local, Utc};
use futures_util::{SinkExt, StreamExt};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

struct SystemClock;

impl Clock for SystemClock {
    fn local(&self) -> DateTime<Local> {
        Local::now()
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Knows Austin only; every restaurant costs 10 per person more than the last.
struct AustinSource;

#[async_trait]
impl RestaurantSource for AustinSource {
    async fn resolve_city(
        &self,
        city: &CityName,
    ) -> Result<Option<LocationId>, RestaurantSourceError> {
        Ok((city.as_ref() == "Austin")
            .then(|| LocationId::new("278"))
            .flatten())
    }

    async fn search_restaurants(
        &self,
        _location: &LocationId,
    ) -> Result<Vec<RestaurantRecord>, RestaurantSourceError> {
        Ok((1..=4)
            .map(|index: u32| RestaurantRecord {
                name: format!("Restaurant {index}"),
                address: format!("{index} Congress Ave"),
                location: Coordinates::new(30.26, -97.74).expect("valid coordinates"),
                average_cost_for_two: f64::from(index) * 20.0,
                rating: Some(4.0),
            })
            .collect())
    }
}

/// Answers sign-in only after the client deadline has long passed.
struct StallingIdentityProvider;

#[async_trait]
impl IdentityProvider for StallingIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError> {
        tokio::time::sleep(CLIENT_TIMEOUT * 3).await;
        Ok(Identity::new("uid-ada", credentials.email(), "token"))
    }

    async fn register(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError> {
        self.sign_in(credentials).await
    }

    async fn sign_out(&self, _identity: &Identity) -> Result<(), IdentityProviderError> {
        Ok(())
    }
}

fn ws_state(identity_provider: Arc<dyn IdentityProvider>) -> WsState {
    let pipeline = SearchPipeline::new(
        SearchPipelinePorts::new(Arc::new(AustinSource), Arc::new(InMemoryHistoryStore::new())),
        Arc::new(SystemClock),
    );
    WsState::new(Arc::new(pipeline), identity_provider, AllowedOrigins::default())
}

fn serve(ws_state: WsState) -> (String, Server) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(ws_state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    let url = format!("http://{addr}");
    (url, server)
}

#[fixture]
async fn start_ws_server() -> (String, Server) {
    serve(ws_state(Arc::new(InMemoryIdentityProvider::new())))
}

async fn connect(url: &str, server: Server) -> (Socket, ServerHandle) {
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws"))
        .set_header(header::ORIGIN, "http://localhost:3000")
        .connect()
        .await
        .expect("websocket connect");

    (socket, handle)
}

#[fixture]
async fn ws_client(#[future] start_ws_server: (String, Server)) -> (Socket, ServerHandle) {
    let (url, server) = start_ws_server.await;
    connect(&url, server).await
}

async fn send(socket: &mut Socket, payload: Value) {
    socket
        .send(awc::ws::Message::Text(payload.to_string().into()))
        .await
        .expect("send text");
}

async fn next_message(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

fn message_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

#[rstest]
#[actix_rt::test]
async fn search_streams_started_then_rendered_results(
    #[future] ws_client: (Socket, ServerHandle),
) {
    let (mut socket, _server) = ws_client.await;
    send(
        &mut socket,
        json!({ "type": "submitSearch", "budget": "20", "city": "austin" }),
    )
    .await;

    let started = next_message(&mut socket).await;
    assert_eq!(message_type(&started), Some("searchStarted"));
    assert_eq!(started["criteria"]["city"], "Austin");

    let rendered = next_message(&mut socket).await;
    assert_eq!(message_type(&rendered), Some("resultsRendered"));
    assert_eq!(rendered["map"]["markers"].as_array().map(Vec::len), Some(2));
    assert_eq!(rendered["list"]["kind"], "entries");
    assert_eq!(rendered["list"]["items"][0]["name"], "Restaurant 1");
}

#[rstest]
#[actix_rt::test]
async fn unknown_city_yields_a_notice(#[future] ws_client: (Socket, ServerHandle)) {
    let (mut socket, _server) = ws_client.await;
    send(
        &mut socket,
        json!({ "type": "submitSearch", "budget": 20, "city": "atlantis" }),
    )
    .await;

    assert_eq!(
        message_type(&next_message(&mut socket).await),
        Some("searchStarted")
    );
    let notice = next_message(&mut socket).await;
    assert_eq!(message_type(&notice), Some("notice"));
    assert_eq!(notice["code"], "city_not_found");
}

#[rstest]
#[actix_rt::test]
async fn signed_in_search_reports_the_new_history_entry(
    #[future] ws_client: (Socket, ServerHandle),
) {
    let (mut socket, _server) = ws_client.await;
    send(
        &mut socket,
        json!({ "type": "signIn", "email": "ada@example.com", "password": "hunter22" }),
    )
    .await;
    let reset = next_message(&mut socket).await;
    assert_eq!(message_type(&reset), Some("sessionReset"));
    assert_eq!(reset["email"], "ada@example.com");

    send(
        &mut socket,
        json!({ "type": "submitSearch", "budget": "20", "city": "austin", "postalCode": "78701" }),
    )
    .await;

    let types: Vec<_> = [
        next_message(&mut socket).await,
        next_message(&mut socket).await,
        next_message(&mut socket).await,
    ]
    .iter()
    .map(|value| message_type(value).map(str::to_owned))
    .collect();
    assert_eq!(
        types,
        [
            Some("searchStarted".to_owned()),
            Some("historyEntryAdded".to_owned()),
            Some("resultsRendered".to_owned()),
        ]
    );
}

#[rstest]
#[actix_rt::test]
async fn invalid_budget_yields_an_invalid_request_notice(
    #[future] ws_client: (Socket, ServerHandle),
) {
    let (mut socket, _server) = ws_client.await;
    send(
        &mut socket,
        json!({ "type": "submitSearch", "budget": "cheap", "city": "austin" }),
    )
    .await;

    let notice = next_message(&mut socket).await;
    assert_eq!(notice["code"], "invalid_request");
}

#[rstest]
#[actix_rt::test]
async fn closes_on_malformed_json(#[future] ws_client: (Socket, ServerHandle)) {
    let (mut socket, _server) = ws_client.await;
    socket
        .send(awc::ws::Message::Text("not-json".into()))
        .await
        .expect("send text");

    let frame = socket.next().await.expect("response frame").expect("frame");
    match frame {
        Frame::Close(reason) => {
            assert_eq!(reason.expect("reason").code, CloseCode::Policy);
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages(
    #[future] ws_client: (Socket, ServerHandle),
) {
    let (mut socket, _server) = ws_client.await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = tokio::time::timeout(Duration::from_secs(2), async {
        let mut observed = None;
        while let Some(frame) = socket.next().await {
            let frame = frame.expect("frame");
            match frame {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(reason) => {
                    observed = reason;
                    break;
                }
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        observed
    })
    .await
    .expect("close frame missing within timeout")
    .expect("close frame missing after timeout");

    assert_eq!(observed_close.code, CloseCode::Normal);
    assert_eq!(
        observed_close.description.as_deref(),
        Some("heartbeat timeout")
    );
}

#[actix_rt::test]
async fn slow_sign_in_does_not_trip_the_heartbeat() {
    let (url, server) = serve(ws_state(Arc::new(StallingIdentityProvider)));
    let (mut socket, handle) = connect(&url, server).await;
    send(
        &mut socket,
        json!({ "type": "signIn", "email": "ada@example.com", "password": "hunter22" }),
    )
    .await;

    let reset = next_message(&mut socket).await;
    assert_eq!(message_type(&reset), Some("sessionReset"));
    assert_eq!(reset["email"], "ada@example.com");

    send(
        &mut socket,
        json!({ "type": "submitSearch", "budget": "cheap", "city": "austin" }),
    )
    .await;
    let notice = next_message(&mut socket).await;
    assert_eq!(notice["code"], "invalid_request");
    handle.stop(true).await;
}

#[rstest]
#[actix_rt::test]
async fn rejects_upgrades_from_unlisted_origins(#[future] start_ws_server: (String, Server)) {
    let (url, server) = start_ws_server.await;
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let result = awc::Client::default()
        .ws(format!("{url}/ws"))
        .set_header(header::ORIGIN, "https://evil.example")
        .connect()
        .await;

    assert!(result.is_err(), "upgrade from unlisted origin must fail");
    handle.stop(true).await;
}
