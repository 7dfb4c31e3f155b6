use crate::commands::CommandSurface;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::warn;
use serde::Deserialize;
use std::time::Duration;

const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventsQuery {
    #[serde(default)]
    after: u64,
}

/// Long-poll for events published after the `after` cursor (0 for everything still logged).
pub(crate) async fn events(
    State(surface): State<CommandSurface>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let batch = surface
        .notifier()
        .wait_after(query.after, LONG_POLL_TIMEOUT)
        .await;

    if batch.missed > 0 {
        warn!(
            "Event poller after {} missed {} events",
            query.after, batch.missed
        );
    }

    if batch.events.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    Json(batch).into_response()
}
