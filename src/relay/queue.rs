//! Yell delivery queue.
//!
//! Producers (HTTP request handlers) push formatted yells onto a FIFO; a
//! single background worker drains it into Discord one message at a time,
//! honouring the shared [`RateLimitGovernor`].
//!
//! Delivery rules:
//! - While a cooldown is active nothing is dequeued.
//! - A completed send (delivered or dropped) is followed by a fixed pacing
//!   delay.
//! - A throttled send sets the cooldown and puts the message back at the
//!   tail, so later messages may overtake it.
//! - Any other failure is logged and the message is dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::common::error::{QueueError, SendError};
use crate::common::messages::{ChannelHandle, QueuedMessage};
use crate::config::types::RelayConfig;
use crate::relay::governor::RateLimitGovernor;
use crate::relay::sink::ChatSink;

/// Timing and capacity knobs for the delivery worker.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    /// How long an idle worker waits for new messages before re-checking.
    pub idle_poll: Duration,
    /// Delay after each completed send.
    pub pacing: Duration,
    /// Backlog bound (None = unbounded).
    pub max_pending: Option<usize>,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_millis(100),
            pacing: Duration::from_secs(1),
            max_pending: None,
        }
    }
}

impl From<&RelayConfig> for DeliverySettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            idle_poll: config.idle_poll(),
            pacing: config.pacing(),
            max_pending: config.max_pending,
        }
    }
}

/// Result of one send attempt, as seen by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    Throttled,
    Dropped,
}

/// FIFO of outbound yells plus its single delivery worker.
pub struct YellQueue {
    pending: Mutex<VecDeque<QueuedMessage>>,
    available: Notify,
    governor: Arc<RateLimitGovernor>,
    sink: Arc<dyn ChatSink>,
    settings: DeliverySettings,
    worker: Mutex<Option<CancellationToken>>,
    /// Held from dequeue until a send's outcome is applied. A worker
    /// restarted while an old send is in flight waits here.
    send_slot: Arc<tokio::sync::Mutex<()>>,
}

impl YellQueue {
    pub fn new(
        sink: Arc<dyn ChatSink>,
        governor: Arc<RateLimitGovernor>,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            governor,
            sink,
            settings,
            worker: Mutex::new(None),
            send_slot: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Queue a yell for delivery. Never blocks.
    ///
    /// Returns the backlog size after the push, or [`QueueError::Full`]
    /// when a capacity is configured and reached.
    pub fn enqueue(
        &self,
        channel: ChannelHandle,
        text: impl Into<String>,
    ) -> Result<usize, QueueError> {
        let size = {
            let mut pending = self.pending.lock();
            if let Some(capacity) = self.settings.max_pending {
                if pending.len() >= capacity {
                    return Err(QueueError::Full { capacity });
                }
            }
            pending.push_back(QueuedMessage::new(channel, text));
            pending.len()
        };
        self.available.notify_one();

        debug!("Queued yell. Queue size: {}", size);
        Ok(size)
    }

    /// Put a throttled message back at the tail, ignoring the capacity.
    fn requeue(&self, message: QueuedMessage) {
        self.pending.lock().push_back(message);
        self.available.notify_one();
    }

    /// Drop every pending message and return how many were removed.
    pub fn clear(&self) -> usize {
        let cleared = {
            let mut pending = self.pending.lock();
            let count = pending.len();
            pending.clear();
            count
        };
        info!("Cleared {} pending yell messages", cleared);
        cleared
    }

    /// Current backlog depth.
    pub fn size(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn governor(&self) -> &RateLimitGovernor {
        &self.governor
    }

    /// Spawn the delivery worker. No-op if it is already running.
    ///
    /// Returns `true` if a worker was started.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return false;
        }

        let token = CancellationToken::new();
        tokio::spawn(Arc::clone(self).run(token.clone()));
        *worker = Some(token);
        true
    }

    /// Signal the worker to stop. No-op if it is not running.
    ///
    /// Pending messages stay where they are; they are neither flushed nor
    /// persisted. A send already in flight may still complete afterwards;
    /// a worker started later waits for it before sending anything else.
    pub fn stop(&self) -> bool {
        match self.worker.lock().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn run(self: Arc<Self>, token: CancellationToken) {
        info!("Yell delivery worker started");

        loop {
            let slot = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                slot = Arc::clone(&self.send_slot).lock_owned() => slot,
            };

            if let Some(wait) = self.governor.remaining() {
                drop(slot);
                debug!("Rate limited. Sleeping for {}ms", wait.as_millis());
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = sleep(wait) => continue,
                }
            }

            let message = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                message = self.next_message() => message,
            };
            let Some(message) = message else {
                continue;
            };

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                outcome = self.dispatch(message, slot) => outcome,
            };

            match outcome {
                Ok(Delivery::Throttled) => {}
                Ok(Delivery::Sent) | Ok(Delivery::Dropped) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = sleep(self.settings.pacing) => {}
                    }
                }
                Err(e) => error!("Yell send task failed: {}", e),
            }
        }

        info!("Yell delivery worker stopped");
    }

    /// Wait up to one idle interval for a message.
    async fn next_message(&self) -> Option<QueuedMessage> {
        let next = self.pending.lock().pop_front();
        if next.is_some() {
            return next;
        }
        let _ = tokio::time::timeout(self.settings.idle_poll, self.available.notified()).await;
        self.pending.lock().pop_front()
    }

    /// Send one message on its own task; the task applies the outcome and
    /// releases the send slot when done.
    fn dispatch(
        self: &Arc<Self>,
        message: QueuedMessage,
        slot: OwnedMutexGuard<()>,
    ) -> JoinHandle<Delivery> {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let _slot = slot;
            match queue.sink.send(&message.channel, &message.text).await {
                Ok(()) => {
                    debug!(
                        "Yell sent to #{}. Remaining: {}",
                        message.channel.name,
                        queue.size()
                    );
                    Delivery::Sent
                }
                Err(SendError::Throttled { retry_after }) => {
                    let cooldown = queue.governor.throttle(retry_after);
                    warn!(
                        "Rate limited sending to #{}! Retry after: {}ms (cooldown {}ms)",
                        message.channel.name,
                        retry_after.as_millis(),
                        cooldown.as_millis()
                    );
                    queue.requeue(message);
                    Delivery::Throttled
                }
                Err(SendError::Transient(reason)) => {
                    error!(
                        "Failed to send yell to #{}, dropping it: {} ({})",
                        message.channel.name, reason, message.text
                    );
                    Delivery::Dropped
                }
            }
        })
    }
}
