//! WebSocket push channel integration tests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use futures::{future::join_all, SinkExt, StreamExt};
use serde_json::Value;
use smartcity_monitor::{config::AppConfig, http_server, monitoring::Simulator, AppState};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    state: AppState,
    simulator: Simulator,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn connect(&self) -> Client {
        let (client, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .unwrap();
        client
    }
}

async fn start_server(config: AppConfig) -> TestServer {
    let shutdown = CancellationToken::new();
    let (state, simulator) = AppState::bootstrap(config, shutdown.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let token = shutdown.clone();
    let server_state = state.clone();
    let handle = tokio::spawn(async move {
        http_server::serve(listener, server_state, async move { token.cancelled().await })
            .await
            .unwrap();
    });

    TestServer {
        addr,
        state,
        simulator,
        shutdown,
        handle,
    }
}

fn seeded_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.seed = Some(77);
    config.simulation.max_step = 0.0;
    config
}

async fn next_event(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_initial_data_on_connect() {
    let server = start_server(seeded_config()).await;

    let mut client = server.connect().await;
    let frame = next_event(&mut client).await;

    assert_eq!(frame["event"], "initialData");
    assert_eq!(frame["data"]["infrastructure"].as_array().unwrap().len(), 8);
    assert!(frame["data"]["alerts"].is_array());
    assert_eq!(server.state.push.active_connections().await, 1);

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_tick_updates_are_pushed() {
    let mut server = start_server(seeded_config()).await;

    let mut client = server.connect().await;
    assert_eq!(next_event(&mut client).await["event"], "initialData");

    let state = server.state.clone();
    let bin_id = state
        .store
        .update(|city| {
            city.infrastructure[3].value = 99.0;
            city.infrastructure[3].id.clone()
        })
        .await;
    server.simulator.step(&state.store, &state.push).await;

    let update = next_event(&mut client).await;
    assert_eq!(update["event"], "infrastructureUpdate");
    let bin = update["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == bin_id.as_str())
        .unwrap()
        .clone();
    assert_eq!(bin["status"], "red");

    let alerts = next_event(&mut client).await;
    assert_eq!(alerts["event"], "alertsUpdate");
    assert!(alerts["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["infrastructureId"] == bin_id.as_str() && a["active"] == true));

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_maintenance_is_pushed_immediately() {
    let server = start_server(seeded_config()).await;

    let mut client = server.connect().await;
    next_event(&mut client).await;

    let id = server.state.store.infrastructure().await[5].id.clone();
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/maintenance/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = http_server::router(server.state.clone())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let update = next_event(&mut client).await;
    assert_eq!(update["event"], "infrastructureUpdate");
    let item = update["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == id.as_str())
        .unwrap()
        .clone();
    assert_eq!(item["status"], "yellow");
    assert_eq!(next_event(&mut client).await["event"], "alertsUpdate");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_shutdown_closes_clients() {
    let server = start_server(seeded_config()).await;
    let state = server.state.clone();

    let mut client = server.connect().await;
    next_event(&mut client).await;

    server.shutdown.cancel();

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "client should see the connection close");

    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server stops")
        .unwrap();

    // the socket task unregisters after the close frame is written
    for _ in 0..100 {
        if state.push.active_connections().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.push.active_connections().await, 0);
    assert_eq!(state.push.total_connections(), 1);
}

#[tokio::test]
async fn test_connection_limit() {
    let mut config = seeded_config();
    config.server.max_connections = 1;
    let server = start_server(config).await;

    let mut first = server.connect().await;
    next_event(&mut first).await;

    let second = connect_async(format!("ws://{}/ws", server.addr)).await;
    assert!(second.is_err(), "second client should be refused");

    server.shutdown.cancel();
}

#[tokio::test]
async fn test_concurrent_handshakes_respect_limit() {
    let mut config = seeded_config();
    config.server.max_connections = 1;
    let server = start_server(config).await;
    let url = format!("ws://{}/ws", server.addr);

    let results = join_all((0..20).map(|_| connect_async(url.clone()))).await;
    let accepted: Vec<_> = results.into_iter().filter_map(|r| r.ok()).collect();

    assert_eq!(accepted.len(), 1);
    server.shutdown.cancel();
}

#[tokio::test]
async fn test_lagging_client_skips_frames_and_stays_connected() {
    let mut config = seeded_config();
    config.server.push_buffer = 2;
    let mut server = start_server(config).await;
    let state = server.state.clone();

    let mut client = server.connect().await;
    assert_eq!(next_event(&mut client).await["event"], "initialData");

    // client text frames are ignored
    client.send(Message::Text("hello".into())).await.unwrap();

    let bin_id = state
        .store
        .update(|city| {
            city.infrastructure[3].value = 10.0;
            city.infrastructure[3].id.clone()
        })
        .await;
    for _ in 0..200 {
        server.simulator.step(&state.store, &state.push).await;
    }

    state
        .store
        .update(|city| city.infrastructure[3].value = 99.0)
        .await;
    server.simulator.step(&state.store, &state.push).await;

    // older frames were skipped; the latest snapshot still arrives
    let fresh = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let frame = next_event(&mut client).await;
            if frame["event"] != "infrastructureUpdate" {
                continue;
            }
            let bin = frame["data"]
                .as_array()
                .unwrap()
                .iter()
                .find(|item| item["id"] == bin_id.as_str())
                .unwrap()
                .clone();
            if bin["status"] == "red" {
                return bin;
            }
        }
    })
    .await
    .expect("fresh snapshot after the burst");
    assert_eq!(fresh["anomaly"], "Bin almost full");

    assert_eq!(state.push.active_connections().await, 1);
    assert_eq!(state.push.total_connections(), 1);

    server.shutdown.cancel();
}
