use std::{future::Future, sync::Arc};

use tokio::net::TcpListener;

use crate::{
    app::{config::AppConfig, router, state::AppState},
    error::AppError,
    repositories::PgCommentStore,
    telemetry,
    usecases::CommentService,
};

pub async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;

    let store = PgCommentStore::connect(&config.database).await?;
    let service = CommentService::new(Arc::new(store.clone()), config.store_deadline);
    let state = AppState::new(service);

    let app = router::build_router(state, &config.cors_allowed_origin);

    tracing::info!(addr = %config.http_addr, "Server listening");
    let listener = TcpListener::bind(config.http_addr)
        .await
        .map_err(|err| AppError::Internal(format!("bind failed: {}", err)))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {}", err)))?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM, whichever arrives first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "Ctrl-c handler install failed");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate_signal() => {},
    }
}

/// SIGTERM watcher. The handler is registered when this function is
/// called, not when the returned future is first polled.
#[cfg(unix)]
fn terminate_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{SignalKind, signal};

    let stream = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(error) => {
            tracing::error!(error = %error, "SIGTERM handler install failed");
            None
        }
    };

    async move {
        match stream {
            Some(mut stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(not(unix))]
fn terminate_signal() -> impl Future<Output = ()> {
    std::future::pending::<()>()
}
