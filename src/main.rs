use pwa_timer::lifecycle::Lifecycle;
use pwa_timer::{router, AppState, Config};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let port = config.port;
    let update_check_interval = config.update_check_interval;
    let state = AppState::build(config).await;
    spawn_update_watcher(Arc::clone(&state.lifecycle), update_check_interval);

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Checks the origin for a new version on an interval and, on unix, on
/// SIGHUP.
fn spawn_update_watcher(lifecycle: Arc<Lifecycle>, every: Option<Duration>) {
    tokio::spawn(async move {
        let mut ticker = every.map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker
        });
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }

        #[cfg(unix)]
        let mut hangup =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(signal) => Some(signal),
                Err(err) => {
                    warn!("SIGHUP update trigger unavailable: {err}");
                    None
                }
            };

        loop {
            let tick = async {
                match ticker.as_mut() {
                    Some(ticker) => {
                        ticker.tick().await;
                    }
                    None => std::future::pending().await,
                }
            };
            #[cfg(unix)]
            let hup = async {
                match hangup.as_mut() {
                    Some(signal) => {
                        signal.recv().await;
                    }
                    None => std::future::pending().await,
                }
            };
            #[cfg(not(unix))]
            let hup = std::future::pending::<()>();

            tokio::select! {
                _ = tick => {}
                _ = hup => info!("SIGHUP received, checking for update"),
            }

            if let Err(err) = lifecycle.check_for_update().await {
                warn!("update check failed: {err}");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
