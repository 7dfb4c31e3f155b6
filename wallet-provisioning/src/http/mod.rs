use crate::commands::CommandSurface;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use hyper::{Request, body::Incoming};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server,
};
use log::{debug, info, trace, warn};
use tokio::net::{TcpListener, TcpStream};
use tower_http::cors::CorsLayer;
use tower_service::Service;

mod events;
mod exec;

pub fn router(surface: CommandSurface, allowed_origin: Option<&str>) -> Router {
    let app = Router::new()
        .route("/exec/{action}", post(exec::exec))
        .route("/events", get(events::events))
        .with_state(surface);

    let Some(origin) = allowed_origin else {
        return app;
    };

    match origin.parse::<HeaderValue>() {
        Ok(origin) => app.layer(CorsLayer::new().allow_origin(origin)),
        Err(error) => {
            warn!("Ignoring ALLOWED_ORIGIN {origin}: {error}");
            app
        }
    }
}

/// Binds `bind` and serves the command bridge until `shutdown` resolves.
///
/// Only binding is fatal; failed accepts and broken connections are logged.
pub async fn listen(
    bind: &str,
    surface: CommandSurface,
    allowed_origin: Option<&str>,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    let app = router(surface, allowed_origin);
    let listener = TcpListener::bind(bind).await?;
    info!("HTTP command bridge listening on {}", listener.local_addr()?);

    tokio::pin!(shutdown);
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            () = &mut shutdown => {
                info!("HTTP command bridge stopped accepting connections");
                return Ok(());
            }
        };

        match accepted {
            Ok((socket, remote_addr)) => {
                trace!("HTTP connection from {remote_addr}");
                tokio::spawn(serve_connection(socket, app.clone()));
            }
            Err(error) => warn!("Could not accept HTTP connection: {error}"),
        }
    }
}

async fn serve_connection(socket: TcpStream, app: Router) {
    let service =
        hyper::service::service_fn(move |request: Request<Incoming>| app.clone().call(request));

    let builder = server::conn::auto::Builder::new(TokioExecutor::new());
    if let Err(error) = builder
        .serve_connection(TokioIo::new(socket), service)
        .await
    {
        debug!("HTTP connection ended with an error: {error:#}");
    }
}
