//! Polling loop feeding inbound events to the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::chat::EventSource;
use crate::metrics::TRANSPORT_ERRORS;

use super::runner::BotOrchestrator;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Poll `source` until `shutdown` fires, handling each event on its own task.
pub async fn run_event_loop(
    source: Arc<dyn EventSource>,
    orchestrator: Arc<BotOrchestrator>,
    shutdown: broadcast::Receiver<()>,
) {
    run_with_backoff(source, orchestrator, shutdown, INITIAL_BACKOFF, MAX_BACKOFF).await
}

async fn run_with_backoff(
    source: Arc<dyn EventSource>,
    orchestrator: Arc<BotOrchestrator>,
    mut shutdown: broadcast::Receiver<()>,
    initial_backoff: Duration,
    max_backoff: Duration,
) {
    info!("Event loop started");
    let mut backoff = initial_backoff;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Event loop received shutdown signal");
                break;
            }
            batch = source.next_events() => match batch {
                Ok(events) => {
                    backoff = initial_backoff;
                    for event in events {
                        let orchestrator = Arc::clone(&orchestrator);
                        tokio::spawn(async move {
                            if let Err(e) = orchestrator.handle_event(event).await {
                                warn!(error = %e, "Failed to reply to event");
                            }
                        });
                    }
                }
                Err(e) => {
                    TRANSPORT_ERRORS.with_label_values(&["poll"]).inc();
                    error!(error = %e, retry_in_secs = backoff.as_secs_f64(), "Polling for events failed");
                    tokio::select! {
                        _ = shutdown.recv() => {
                            info!("Event loop received shutdown signal");
                            break;
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(max_backoff);
                }
            },
        }
    }

    info!("Event loop stopped");
}
