use cafe_core::CafeConfig;
use cafe_server::{build_router, build_state, AppError};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    cafe_core::init_tracing();

    let config = CafeConfig::load("dev")?;
    let addr: String = config.get_or("server.address", "0.0.0.0:5000".to_string())?;

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, profile = config.profile(), "Cafe server listening");
    cafe_core::http::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cafe server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received, starting graceful shutdown");
}
