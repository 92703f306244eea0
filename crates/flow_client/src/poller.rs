use std::sync::Arc;
use std::time::Duration;

use flow_core::ChatMessage;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::ApiClient;

pub const CHAT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Re-fetches chat history on a fixed interval and publishes it whenever it
/// changes. Failed fetches are logged and the next tick tries again; there
/// is no backoff. Dropping the poller stops it.
pub struct ChatPoller {
    messages: watch::Receiver<Vec<ChatMessage>>,
    handle: JoinHandle<()>,
}

impl ChatPoller {
    pub fn spawn(client: Arc<ApiClient>, every: Duration) -> Self {
        let (tx, messages) = watch::channel(Vec::new());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match client.messages().await {
                    Ok(latest) => {
                        tx.send_if_modified(|current| {
                            if *current == latest {
                                return false;
                            }
                            *current = latest;
                            true
                        });
                    }
                    Err(e) => tracing::warn!("Chat poll failed: {:#}", e),
                }
            }
        });
        Self { messages, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages.clone()
    }

    pub fn latest(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    /// Same as dropping the poller.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ChatPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
