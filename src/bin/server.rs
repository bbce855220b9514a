use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_chase_server::config::EngineConfig;
use maze_chase_server::constants::TICK_MS;
use maze_chase_server::engine::GameEngine;
use maze_chase_server::error::Error;
use maze_chase_server::layout::MazeLayout;
use maze_chase_server::types::Intent;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone, Debug)]
enum ParsedClientMessage {
    Input { intent: Intent },
    Ping { t: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, mpsc::Sender<String>>,
    game: GameEngine,
    last_tick: Instant,
}

impl ServerState {
    fn new(game: GameEngine) -> Self {
        Self {
            clients: HashMap::new(),
            game,
            last_tick: Instant::now(),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let game = match build_game() {
        Ok(game) => game,
        Err(err) => {
            error!(error = %err, "failed to build game session");
            std::process::exit(1);
        }
    };

    let state = Arc::new(Mutex::new(ServerState::new(game)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/world", get(world_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static client");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static client root not found; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %bind_addr, "failed to bind server socket");
            std::process::exit(1);
        }
    };

    info!(port, "listening");
    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "server runtime failed");
        std::process::exit(1);
    }
}

fn build_game() -> Result<GameEngine, Error> {
    let layout = match std::env::var("MAZE_LAYOUT") {
        Ok(path) => MazeLayout::load(&PathBuf::from(path))?,
        Err(_) => MazeLayout::classic(),
    };
    let config = match std::env::var("ENGINE_CONFIG") {
        Ok(path) => EngineConfig::load(&PathBuf::from(path))?,
        Err(_) => EngineConfig::default(),
    };
    let seed = std::env::var("SEED")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(rand::random::<u32>);
    info!(seed, rows = layout.rows, cols = layout.cols, "game session ready");
    Ok(GameEngine::new(&layout, config, seed))
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn world_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.game.world_init())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(client_id.clone(), tx.clone());
        let welcome = json!({
            "type": "welcome",
            "clientId": client_id,
            "world": guard.game.world_init(),
            "snapshot": guard.game.build_snapshot(false),
        });
        send_to_client(&mut guard, &client_id, &welcome, QueuePolicy::DisconnectOnFull);
    }
    debug!(client = %client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => match std::str::from_utf8(&raw) {
                Ok(text) => handle_client_message(&state, &client_id, text).await,
                Err(_) => send_error_to_client(&state, &client_id, "invalid utf8 message").await,
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.lock().await.clients.remove(&client_id);
    debug!(client = %client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Input { intent } => guard.game.apply_intent(intent),
        ParsedClientMessage::Ping { t } => {
            let pong = json!({ "type": "pong", "t": t });
            send_to_client(&mut guard, client_id, &pong, QueuePolicy::DropOnFull);
        }
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    let now = Instant::now();
    let elapsed_ms = now.duration_since(state.last_tick).as_millis() as u64;
    state.last_tick = now;
    state.game.advance(elapsed_ms);

    let snapshot = state.game.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = state
        .clients
        .get(client_id)
        .map(|tx| tx.try_send(message.to_string()).is_err())
        .unwrap_or(false);
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        state.clients.remove(client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, tx) in &state.clients {
        if tx.try_send(payload.clone()).is_err() && policy == QueuePolicy::DisconnectOnFull {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        state.clients.remove(&client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DropOnFull,
    );
}

fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let intent = Intent::parse(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { intent })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_server::types::Direction;

    #[test]
    fn parse_input_message() {
        let parsed = parse_client_message(r#"{"type":"input","dir":"left"}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::Input {
                intent: Intent::Move(Direction::Left)
            })
        ));
    }

    #[test]
    fn parse_input_accepts_release_and_none() {
        for raw in [
            r#"{"type":"input","dir":"release"}"#,
            r#"{"type":"input","dir":"none"}"#,
        ] {
            assert!(matches!(
                parse_client_message(raw),
                Some(ParsedClientMessage::Input {
                    intent: Intent::Release
                })
            ));
        }
    }

    #[test]
    fn parse_input_rejects_invalid_direction() {
        assert!(parse_client_message(r#"{"type":"input","dir":"sideways"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input","dir":3}"#).is_none());
    }

    #[test]
    fn parse_ping_requires_number() {
        let parsed = parse_client_message(r#"{"type":"ping","t":12.5}"#);
        assert!(matches!(parsed, Some(ParsedClientMessage::Ping { .. })));
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        assert!(parse_client_message(r#"{"type":"hello","name":"A"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
    }

    #[test]
    fn make_id_is_unique_and_prefixed() {
        let a = make_id("client");
        let b = make_id("client");
        assert_ne!(a, b);
        assert!(a.starts_with("client_"));
    }
}
