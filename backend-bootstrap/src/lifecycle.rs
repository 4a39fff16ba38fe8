use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use backend_application::commands::{collect_commands, detection_commands};
use backend_application::AppState;
use backend_domain::ports::HealthCheckService;
use backend_infrastructure::{
    generate_daily_report, schedule_collection, schedule_detection, schedule_reports,
};
use backend_interfaces_http::build_router;

use crate::cli::Command;
use crate::context::AppContext;

fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
}

/// Serves the API and runs the collection, detection and report loops until
/// ctrl-c or SIGTERM.
pub async fn serve(context: AppContext) -> Result<()> {
    let state = context.state;
    log_health(context.health.as_ref()).await;

    tokio::spawn(schedule_collection(state.clone()));
    tokio::spawn(schedule_detection(state.clone()));
    tokio::spawn(schedule_reports(state.clone()));

    let app = build_router_with_layers(state.clone());
    let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shut down");
    Ok(())
}

/// Dispatches a CLI command. One-shot commands print their summary as JSON.
pub async fn run_command(context: AppContext, command: Command) -> Result<()> {
    if command == Command::Serve {
        return serve(context).await;
    }

    let state = context.state;
    match command {
        Command::Serve => {}
        Command::Collect => print_json(&collect_commands::collect_all(&state).await)?,
        Command::Detect => print_json(&detection_commands::run_detection(&state).await?)?,
        Command::RunOnce => {
            let collection = collect_commands::collect_all(&state).await;
            info!(inserted = collection.inserted(), "collection finished");
            print_json(&detection_commands::run_detection(&state).await?)?;
        }
        Command::Report => {
            let path = generate_daily_report(&state).await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn log_health(health: &dyn HealthCheckService) {
    match health.check_database().await {
        Ok(_) => info!("event store reachable"),
        Err(err) => warn!(error = %err, "event store not reachable at startup"),
    }
    match health.check_alert_target().await {
        Ok(true) => info!("alert webhook reachable"),
        Ok(false) => info!("alert webhook not configured"),
        Err(err) => warn!(error = %err, "alert webhook not reachable at startup"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
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
