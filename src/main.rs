mod api;
mod app;
mod dto;
mod error;
mod models;
mod repositories;
mod telemetry;
mod usecases;

#[tokio::main]
async fn main() {
    if let Err(error) = app::run().await {
        tracing::error!(error = %error, "Server exited with error");
        std::process::exit(1);
    }
}
