//! Periodic re-check of pending confirmations in the chat transcript.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::chat::Transcript;
use crate::confirmation::ConfirmationService;

/// Sent to the REPL when a pending transaction is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationNotice {
    pub confirmation_id: String,
    pub tx_hash: String,
    pub chain: String,
}

impl ConfirmationNotice {
    pub fn message(&self) -> String {
        format!(
            "✅ Transaction {} on {} confirmed by Espresso (confirmation {})",
            self.tx_hash, self.chain, self.confirmation_id
        )
    }
}

/// Scans the transcript for pending confirmations on every tick.
pub struct ConfirmationPoller {
    service: Arc<dyn ConfirmationService>,
    transcript: Transcript,
    notifier: Option<mpsc::UnboundedSender<ConfirmationNotice>>,
}

impl ConfirmationPoller {
    pub fn new(service: Arc<dyn ConfirmationService>, transcript: Transcript) -> Self {
        Self {
            service,
            transcript,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: mpsc::UnboundedSender<ConfirmationNotice>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// One scan. Returns how many messages flipped to confirmed.
    ///
    /// The scan and the write take the lock separately; a message is only
    /// updated if it still carries the same pending confirmation id.
    pub async fn tick(&self) -> usize {
        let pending: Vec<(usize, String)> = {
            let transcript = self.transcript.read().await;
            transcript
                .iter()
                .enumerate()
                .filter_map(|(index, message)| {
                    message
                        .pending_confirmation()
                        .map(|id| (index, id.to_string()))
                })
                .collect()
        };

        if pending.is_empty() {
            return 0;
        }
        tracing::debug!(count = pending.len(), "Checking pending confirmations");

        let mut confirmed = 0;
        for (index, confirmation_id) in pending {
            if !self.service.check_confirmation(&confirmation_id).await {
                continue;
            }

            let notice = {
                let mut transcript = self.transcript.write().await;
                match transcript.get_mut(index) {
                    Some(message)
                        if message.pending_confirmation() == Some(confirmation_id.as_str()) =>
                    {
                        message.mark_confirmed()
                    }
                    _ => None,
                }
            };

            if let Some(notice) = notice {
                confirmed += 1;
                tracing::info!(
                    confirmation_id = %notice.confirmation_id,
                    tx_hash = %notice.tx_hash,
                    "Transaction confirmed"
                );
                if let Some(notifier) = &self.notifier {
                    let _ = notifier.send(notice);
                }
            }
        }
        confirmed
    }

    /// Run `tick` every `period` until the handle is dropped.
    pub fn spawn(self, period: Duration) -> PollerHandle {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                self.tick().await;
            }
        });
        PollerHandle { task }
    }
}

/// Owns the background poll task. Dropping it stops polling.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
