use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;

use super::handlers::Worker;
use crate::feed::FeedOrdering;
use crate::protocol::{BackendAction, GuiEvent};
use crate::store::Store;

/// Sleep between polls when no action is pending.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Worker behaviour taken from the user's settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendOptions {
    pub feed_ordering: FeedOrdering,
    /// Keep access tokens in the OS keyring
    pub remember_session: bool,
}

pub fn run_backend<S: Store>(
    store: Arc<S>,
    options: BackendOptions,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<GuiEvent>,
) {
    // Create a Tokio runtime for this thread
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = event_tx.send(GuiEvent::Error(format!("Failed to create Tokio runtime: {}", e)));
            return;
        }
    };

    rt.block_on(async move {
        let mut worker = Worker::new(store, options, event_tx);
        info!(event = "backend.started");

        loop {
            let mut handled = false;

            // Drain actions from the UI (non-blocking)
            loop {
                match action_rx.try_recv() {
                    Ok(BackendAction::Shutdown) => {
                        worker.close_feed().await;
                        info!(event = "backend.shutdown");
                        return;
                    }
                    Ok(action) => {
                        handled = true;
                        worker.handle(action).await;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        worker.close_feed().await;
                        info!(event = "backend.ui_gone");
                        return;
                    }
                }
            }

            if !handled {
                // Feed tasks run on the runtime's workers meanwhile
                tokio::time::sleep(IDLE_POLL).await;
            }
        }
    });
}
