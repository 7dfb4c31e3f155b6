use dotenvy::dotenv;
use env_logger::Env;
use log::{error, info};
use std::{process::ExitCode, sync::Arc};
use wallet_provisioning::{
    backend::BackendClient,
    commands::CommandSurface,
    config::Config,
    flow::{SecureElementFlow, simulated::SimulatedFlow},
    http,
    notifier::Notifier,
    session_store::SessionStore,
    watchdog,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!("Invalid configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    let notifier = Notifier::new(config.event_channel_capacity);
    let store = SessionStore::spawn();
    let flow: Arc<dyn SecureElementFlow> =
        Arc::new(SimulatedFlow::new(config.simulated_flow.clone()));

    let surface = CommandSurface::new(
        store.clone(),
        notifier.clone(),
        flow.clone(),
        BackendClient::new(),
        config.default_backend_timeout,
    );

    match config.session_ttl {
        Some(session_ttl) => {
            watchdog::spawn(
                store,
                notifier,
                flow,
                session_ttl,
                config.watchdog_interval,
            );
        }
        None => info!("Session watchdog disabled"),
    }

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(error) => {
                error!("Could not listen for shutdown signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    if let Err(error) = http::listen(
        &config.http_bind,
        surface,
        config.allowed_origin.as_deref(),
        shutdown,
    )
    .await
    {
        error!("Could not bind HTTP command bridge: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
