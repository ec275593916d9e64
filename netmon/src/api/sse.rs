//! Server-Sent Events endpoint
//!
//! `/sse` streams every published snapshot as a `message` event. The first
//! event is the current snapshot, so clients render immediately on connect.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

use crate::events::ObserverHandle;
use crate::AppState;

/// SSE keep-alive comment interval
const KEEP_ALIVE_SECS: u64 = 15;

/// GET /sse
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let observer = state.hub.subscribe();
    debug!(observer_id = observer.id(), "SSE client connected");

    Sse::new(snapshot_events(observer)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

/// Turn an observer into a stream of SSE events.
///
/// The stream owns the handle, so a dropped connection unsubscribes.
fn snapshot_events(observer: ObserverHandle) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(observer, |mut observer| async move {
        loop {
            let snapshot = observer.recv().await?;
            match Event::default().event("message").json_data(&*snapshot) {
                Ok(event) => return Some((Ok(event), observer)),
                Err(e) => {
                    warn!(error = %e, "Failed to serialize snapshot for SSE");
                    continue;
                }
            }
        }
    })
}
