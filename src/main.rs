//! Rota Switch - Entry Point
//!
//! Hosts the rotation engine behind the control API, with the health sweeper
//! running in the background and graceful shutdown on Ctrl+C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rota_switch::api::{ApiServer, AppState};
use rota_switch::config::{Config, LogConfig};
use rota_switch::engine::RotationEngine;
use rota_switch::models::RotationSettings;
use rota_switch::pool::{ConnectionLog, ProxyStore};
use rota_switch::proxy::{HttpProber, TimeoutProber};
use rota_switch::services::{
    HealthSweeper, HealthSweeperConfig, HealthSweeperHandle, ProbeValidator, ValidationOptions,
    ValidationService,
};

/// Slack on top of the HTTP probe's own timeout before the hard deadline
const PROBE_DEADLINE_SLACK: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> rota_switch::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log);

    info!("Starting Rota Switch");

    let store = Arc::new(ProxyStore::new());
    let connection_log = Arc::new(ConnectionLog::new(config.connection_log_capacity));

    let prober = TimeoutProber::new(
        HttpProber::new(config.probe.target_url.clone(), config.probe.timeout),
        config.probe.timeout + PROBE_DEADLINE_SLACK,
    );
    let engine = Arc::new(
        RotationEngine::new(store.clone(), Arc::new(prober), RotationSettings::default())
            .with_connection_log(connection_log),
    );

    let validation = Arc::new(ValidationService::new(
        store.clone(),
        Arc::new(ProbeValidator::new(config.probe.target_url.clone())),
        config.validation.workers,
    ));

    if !config.seed_proxies.is_empty() {
        info!("Validating {} seed proxies", config.seed_proxies.len());
        let options = ValidationOptions {
            timeout: config.probe.timeout,
            workers: None,
        };
        match validation
            .run_batch(config.seed_proxies.clone(), None, options)
            .await
        {
            Ok(summary) => info!(
                "Seed validation: {} valid of {}",
                summary.valid, summary.total
            ),
            Err(e) => warn!("Seed validation failed: {}", e),
        }
    }

    let (shutdown_tx, _) = watch::channel(false);

    // Start health sweeper
    let (sweeper_handle, sweeper_shutdown) = HealthSweeperHandle::new();
    let sweeper = HealthSweeper::new(
        engine.clone(),
        validation.clone(),
        HealthSweeperConfig {
            interval: config.sweep.interval,
            batch_size: config.sweep.batch_size,
        },
    );
    let sweeper_task = tokio::spawn(async move {
        sweeper.run(sweeper_shutdown).await;
    });

    // Start API server
    let api_server = ApiServer::new(
        config.api.clone(),
        AppState::new(engine.clone(), validation.clone()),
    );
    let api_shutdown = shutdown_tx.subscribe();
    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(api_shutdown).await {
            error!("API server error: {}", e);
        }
    });

    info!("Control API started on {}", config.api_addr());

    shutdown_signal().await;
    info!("Shutdown signal received");

    engine.stop();
    let _ = shutdown_tx.send(true);
    sweeper_handle.shutdown();

    let _ = tokio::join!(api_task, sweeper_task);

    info!("Rota Switch stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("rota_switch={},tower_http=debug", log.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if log.format.eq_ignore_ascii_case("pretty") {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
