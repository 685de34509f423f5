//! Quiz backend entrypoint wiring the engine, controllers, lights, saves, and HTTP layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buzz_quiz_back::{
    config::AppConfig,
    dao::save_store::{FileSaveStore, SaveStore},
    hardware::{
        lights::{LightActuator, NoopLights},
        poller,
    },
    routes,
    services::{lights_service, save_service},
    state::{
        AppState, SharedState,
        clock::{Clock, SystemClock},
        engine::{GameEngine, GameProgress},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let questions = config.load_questions().context("loading question file")?;
    info!(
        questions = questions.regular().len(),
        tiebreaks = questions.tiebreak().len(),
        "question bank loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let settings = config.engine_settings();
    let save_store: Option<Arc<dyn SaveStore>> = config
        .saves_dir
        .clone()
        .map(|dir| Arc::new(FileSaveStore::new(dir)) as Arc<dyn SaveStore>);

    let resumed = match (&save_store, config.resume_last_save) {
        (Some(store), true) => resume_last_save(store.as_ref()).await,
        _ => None,
    };
    let engine = match resumed {
        Some(progress) => GameEngine::restore(progress, settings, clock.clone()),
        None => GameEngine::new(questions, settings, clock.clone()),
    };

    let (app_state, workers) = AppState::new(engine, clock, save_store.clone());

    tokio::spawn(lights_service::run(
        app_state.clone(),
        light_actuator(&config)?,
        workers.lights,
    ));
    if let Some(store) = save_store {
        tokio::spawn(save_service::run(store, workers.saves));
    }
    tokio::spawn(poller::run(
        app_state.clone(),
        workers.input,
        config.poll_interval,
    ));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Newest save, if any can be read. Failures fall back to a fresh game.
async fn resume_last_save(store: &dyn SaveStore) -> Option<GameProgress> {
    let last = match store.list().await {
        Ok(saves) => saves.into_iter().last()?,
        Err(err) => {
            warn!(error = %err, "failed to list saves; starting a fresh game");
            return None;
        }
    };
    let entity = match store.read(last.id).await {
        Ok(entity) => entity,
        Err(err) => {
            warn!(id = last.id, error = %err, "failed to read save; starting a fresh game");
            return None;
        }
    };
    match GameProgress::try_from(entity) {
        Ok(progress) => {
            info!(id = last.id, action = %last.action, "resuming saved game");
            Some(progress)
        }
        Err(err) => {
            warn!(id = last.id, error = %err, "invalid save; starting a fresh game");
            None
        }
    }
}

#[cfg(feature = "http-lights")]
fn light_actuator(config: &AppConfig) -> anyhow::Result<Arc<dyn LightActuator>> {
    use buzz_quiz_back::hardware::lights::HttpLights;

    Ok(match &config.lights_url {
        Some(url) => {
            info!(url = %url, "driving lights over HTTP");
            Arc::new(HttpLights::new(url).context("building light client")?)
        }
        None => Arc::new(NoopLights),
    })
}

#[cfg(not(feature = "http-lights"))]
fn light_actuator(config: &AppConfig) -> anyhow::Result<Arc<dyn LightActuator>> {
    if config.lights_url.is_some() {
        warn!("lights_url is set but the http-lights feature is disabled");
    }
    Ok(Arc::new(NoopLights))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
