//! Browser front end: the HUD posts actions and listens on an SSE stream.

mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc, oneshot},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    animal::AnimalSnapshot,
    config::FarmConfig,
    economy::{Action, Outcome},
    engine::GameLoopBuilder,
    farm::FarmSnapshot,
    registry::EntityId,
    state::{Observer, StateChange},
};

/// How many frames pass between full flock broadcasts.
const FLOCK_BROADCAST_FRAMES: u64 = 15;

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    kind: &'a str,
    sent_at: DateTime<Utc>,
    payload: T,
}

fn envelope<T: Serialize>(kind: &str, payload: T) -> Option<String> {
    serde_json::to_string(&Envelope {
        kind,
        sent_at: Utc::now(),
        payload,
    })
    .ok()
}

enum Command {
    Act(Action, oneshot::Sender<Outcome>),
    Inspect(Option<EntityId>),
}

struct BroadcastObserver {
    tx: broadcast::Sender<String>,
}

impl Observer for BroadcastObserver {
    fn state_changed(&mut self, change: &StateChange) {
        if let Some(payload) = envelope("state", change) {
            let _ = self.tx.send(payload);
        }
    }

    fn animal_changed(&mut self, snapshot: &AnimalSnapshot) {
        if let Some(payload) = envelope("animal", snapshot) {
            let _ = self.tx.send(payload);
        }
    }
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    commands: mpsc::UnboundedSender<Command>,
    latest: Arc<Mutex<Option<FarmSnapshot>>>,
}

pub struct WebServerConfig {
    pub farm: FarmConfig,
    pub fps: u32,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        farm,
        fps,
        host,
        port,
    } = config;

    let (tx, _) = broadcast::channel::<String>(512);
    let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
    let latest: Arc<Mutex<Option<FarmSnapshot>>> = Arc::new(Mutex::new(None));
    let stop = Arc::new(AtomicBool::new(false));

    let sim_handle = {
        let tx = tx.clone();
        let latest = latest.clone();
        let stop = stop.clone();
        tokio::task::spawn_blocking(move || simulate(farm, fps, tx, command_rx, latest, stop))
    };

    let state = Arc::new(AppState {
        broadcaster: tx,
        commands: command_tx,
        latest,
    });

    let router = Router::new()
        .route("/", get(index))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/action", post(submit_action))
        .route("/api/inspect", post(inspect))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    tracing::info!("farm UI live at http://{addr} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stop.store(true, Ordering::SeqCst);
    match sim_handle.await {
        Ok(()) => tracing::info!("simulation stopped"),
        Err(err) => tracing::error!("simulation task failed: {err:?}"),
    }
    Ok(())
}

/// Frame loop run on a blocking thread. Owns the whole game; the HTTP side
/// only talks to it through `commands`.
fn simulate(
    farm: FarmConfig,
    fps: u32,
    tx: broadcast::Sender<String>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    latest: Arc<Mutex<Option<FarmSnapshot>>>,
    stop: Arc<AtomicBool>,
) {
    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    let flock_tx = tx.clone();
    let mut game = GameLoopBuilder::new(farm)
        .with_observer(BroadcastObserver { tx })
        .build();
    while !stop.load(Ordering::SeqCst) {
        let frame_start = Instant::now();
        loop {
            match commands.try_recv() {
                Ok(Command::Act(action, reply)) => {
                    let _ = reply.send(game.on_action(action));
                }
                Ok(Command::Inspect(id)) => game.inspect(id),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }
        }

        let report = game.tick(frame_start);

        if report.frame % FLOCK_BROADCAST_FRAMES == 0 {
            let snapshot = game.farm().snapshot();
            if let Some(payload) = envelope("flock", &snapshot) {
                let _ = flock_tx.send(payload);
            }
            if let Ok(mut guard) = latest.lock() {
                *guard = Some(snapshot);
            }
        }

        if let Some(rest) = frame_budget.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down farm UI");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<Option<FarmSnapshot>> {
    let snapshot = state.latest.lock().ok().and_then(|guard| guard.clone());
    Json(snapshot)
}

async fn submit_action(
    State(state): State<Arc<AppState>>,
    Json(action): Json<Action>,
) -> Response {
    let (reply_tx, reply_rx) = oneshot::channel();
    if state.commands.send(Command::Act(action, reply_tx)).is_err() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match reply_rx.await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

#[derive(Deserialize)]
struct InspectRequest {
    entity: Option<EntityId>,
}

async fn inspect(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InspectRequest>,
) -> StatusCode {
    match state.commands.send(Command::Inspect(request.entity)) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
