//! HTTP control surface for a running town: JSON state, SSE tick feed,
//! and start/stop/step controls.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info};

use crate::{
    engine::{Engine, EngineBuilder, EngineSettings},
    scenario::Scenario,
    world::{World, WorldSnapshot},
};

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub tick_interval_ms: u64,
    pub running: bool,
    pub snapshot: WorldSnapshot,
}

struct Sim {
    engine: Engine,
    world: World,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    sim: Arc<Mutex<Sim>>,
    scenario_name: String,
    tick_interval_ms: u64,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub snapshot_interval: u64,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub tick_interval_ms: u64,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        snapshot_interval,
        snapshot_dir,
        host,
        port,
        tick_interval_ms,
    } = config;

    let scenario_name = scenario.name.clone();
    let world = scenario.build_world();
    let settings = EngineSettings {
        scenario_name: scenario_name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let engine = EngineBuilder::new(settings).with_mode(scenario.mode).build();

    let (tx, _) = broadcast::channel::<String>(512);
    let sim = Arc::new(Mutex::new(Sim { engine, world }));

    let state = Arc::new(AppState {
        broadcaster: tx.clone(),
        sim: sim.clone(),
        scenario_name: scenario_name.clone(),
        tick_interval_ms,
    });

    // Tick driver: while the town is running, advance it on a fixed cadence
    // and push every snapshot to SSE subscribers.
    let driver_sim = sim.clone();
    let driver_tx = tx.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(tick_interval_ms));
        loop {
            ticker.tick().await;
            let snapshot = {
                let mut guard = driver_sim.lock().expect("sim lock poisoned");
                if !guard.world.running {
                    continue;
                }
                let Sim { engine, world } = &mut *guard;
                match engine.step(world) {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        error!(error = %err, "tick failed, pausing the town");
                        world.running = false;
                        continue;
                    }
                }
            };
            if let Ok(payload) = serde_json::to_string(&snapshot) {
                let _ = driver_tx.send(payload);
            }
        }
    });

    let router = Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/events", get(stream_events))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/step", post(step_once))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(scenario = %scenario_name, %addr, "town server listening");
    println!("Town '{scenario_name}' live at http://{host}:{port} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("Shutting down town server...");
}

fn envelope(state: &AppState, sim: &Sim) -> StateEnvelope {
    StateEnvelope {
        scenario: state.scenario_name.clone(),
        tick_interval_ms: state.tick_interval_ms,
        running: sim.world.running,
        snapshot: sim.world.snapshot(),
    }
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let sim = state.sim.lock().expect("sim lock poisoned");
    Json(envelope(&state, &sim))
}

async fn start(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let mut sim = state.sim.lock().expect("sim lock poisoned");
    sim.world.running = true;
    Json(envelope(&state, &sim))
}

async fn stop(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let mut sim = state.sim.lock().expect("sim lock poisoned");
    sim.world.running = false;
    Json(envelope(&state, &sim))
}

/// Advances exactly one tick. Refused while the automatic driver is
/// running so ticks never interleave unpredictably.
async fn step_once(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = {
        let mut guard = state.sim.lock().expect("sim lock poisoned");
        if guard.world.running {
            return (
                StatusCode::CONFLICT,
                "town is running; stop it before stepping manually",
            )
                .into_response();
        }
        let Sim { engine, world } = &mut *guard;
        match engine.step(world) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(error = %err, "manual step failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "tick failed").into_response();
            }
        }
    };
    if let Ok(payload) = serde_json::to_string(&snapshot) {
        let _ = state.broadcaster.send(payload);
    }
    Json(snapshot).into_response()
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
