//! Cooldown-checked, fire-and-forget alert delivery

use crate::alerts::{AlertEvent, CooldownLedger};
use crate::error::NotifyError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Delivers a fired alert to its destination
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

/// Runs each event through the cooldown ledger and hands survivors to the
/// notifier on their own task.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    ledger: Arc<CooldownLedger>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, ledger: Arc<CooldownLedger>) -> Self {
        Self { notifier, ledger }
    }

    pub fn ledger(&self) -> &Arc<CooldownLedger> {
        &self.ledger
    }

    /// Dispatch events without waiting for delivery.
    ///
    /// Events still cooling down are dropped. A failed send releases its
    /// reservation so the next evaluation cycle may try again. Must be called
    /// from within a Tokio runtime.
    pub fn dispatch(&self, events: Vec<AlertEvent>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(events.len());

        for event in events {
            let Some(reservation) =
                self.ledger
                    .try_reserve(&event.cooldown_key, event.triggered_at, event.cooldown)
            else {
                tracing::debug!("⏳ {} suppressed by cooldown", event.cooldown_key);
                continue;
            };

            let notifier = Arc::clone(&self.notifier);
            let ledger = Arc::clone(&self.ledger);
            handles.push(tokio::spawn(async move {
                match notifier.send(&event).await {
                    Ok(()) => {
                        tracing::info!("📨 Sent {} for {} {}", event.rule, event.symbol, event.timeframe);
                    }
                    Err(e) => {
                        tracing::error!("❌ Failed to send {}: {}", event.cooldown_key, e);
                        ledger.release(reservation);
                    }
                }
            }));
        }

        handles
    }
}
