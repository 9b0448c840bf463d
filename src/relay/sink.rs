//! Outbound send API used by the delivery worker.

use serenity::async_trait;

use crate::common::error::SendError;
use crate::common::messages::ChannelHandle;

/// Asynchronous "send text to channel" operation.
///
/// Implementations report throttling as [`SendError::Throttled`] so the
/// delivery worker can back off and retry; every other failure is final.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send(&self, channel: &ChannelHandle, text: &str) -> Result<(), SendError>;
}

#[cfg(test)]
pub mod testing {
    //! Recording sink for delivery tests.

    use std::collections::VecDeque;
    use std::time::Duration;

    use parking_lot::Mutex;
    use serenity::model::id::ChannelId;
    use tokio::time::Instant;

    use super::*;

    /// A send attempt observed by [`RecordingSink`].
    #[derive(Debug, Clone)]
    pub struct SendAttempt {
        pub channel: ChannelId,
        pub text: String,
        pub at: Instant,
    }

    /// Sink that records every attempt and replays scripted failures.
    #[derive(Default)]
    pub struct RecordingSink {
        attempts: Mutex<Vec<SendAttempt>>,
        script: Mutex<VecDeque<(String, SendError)>>,
        delays: Mutex<VecDeque<(String, Duration)>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next attempt carrying `text` with `error`.
        pub fn fail_next(&self, text: impl Into<String>, error: SendError) {
            self.script.lock().push_back((text.into(), error));
        }

        /// Throttle the next attempt carrying `text`.
        pub fn throttle_next(&self, text: impl Into<String>, retry_after: Duration) {
            self.fail_next(text, SendError::Throttled { retry_after });
        }

        /// Make the next attempt carrying `text` take `delay` to complete.
        pub fn slow_next(&self, text: impl Into<String>, delay: Duration) {
            self.delays.lock().push_back((text.into(), delay));
        }

        pub fn attempts(&self) -> Vec<SendAttempt> {
            self.attempts.lock().clone()
        }

        pub fn texts(&self) -> Vec<String> {
            self.attempts.lock().iter().map(|a| a.text.clone()).collect()
        }
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn send(&self, channel: &ChannelHandle, text: &str) -> Result<(), SendError> {
            self.attempts.lock().push(SendAttempt {
                channel: channel.id,
                text: text.to_string(),
                at: Instant::now(),
            });

            let delay = take_scripted(&self.delays, text);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            take_scripted(&self.script, text).map_or(Ok(()), Err)
        }
    }

    fn take_scripted<T>(entries: &Mutex<VecDeque<(String, T)>>, text: &str) -> Option<T> {
        let mut entries = entries.lock();
        let pos = entries.iter().position(|(t, _)| t == text)?;
        entries.remove(pos).map(|(_, value)| value)
    }
}
