//! Batch-completion event subscriptions.
//!
//! Each subscription runs as its own task and calls the handler once per
//! event, in emission order. Delivery is asynchronous: an event can reach the
//! handler before or after the `execute_distribution` call that caused it
//! returns. Handlers run on the tokio runtime, not on the caller's task.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use futures::StreamExt;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{AirdropError, BatchCompletedEvent, DecodeError, DistributionClient, Result};

/// Token returned by `subscribe_to_events`, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Active subscription tasks of one client
pub(crate) struct EventListener {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
}

impl EventListener {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    fn register(&self, task: JoinHandle<()>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.tasks.lock().expect("subscription lock poisoned").insert(id, task);
        id
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        match self.tasks.lock().expect("subscription lock poisoned").remove(&id) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.tasks
            .lock()
            .expect("subscription lock poisoned")
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}

impl DistributionClient {
    /// Call `handler` for every batch-completion event until unsubscribed.
    ///
    /// In live mode this returns only after the websocket is connected and
    /// the log subscription accepted; either failing is an `Rpc` error and
    /// nothing stays registered. Must be called from within a tokio runtime.
    pub async fn subscribe_to_events<F>(&self, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(BatchCompletedEvent) + Send + Sync + 'static,
    {
        let task = if self.is_mock() {
            // Receiver is created before returning so no later event is missed
            let rx = self.mock.subscribe_events();
            tokio::spawn(forward_mock_events(rx, handler))
        } else {
            let (ready_tx, ready_rx) = oneshot::channel();
            let task = tokio::spawn(forward_log_events(
                self.config.websocket_url(),
                self.program_id(),
                self.config.commitment_config(),
                handler,
                ready_tx,
            ));
            match ready_rx.await {
                Ok(Ok(())) => task,
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(AirdropError::Rpc(
                        "event subscription ended before it was established".to_string(),
                    ))
                }
            }
        };

        let id = self.listener.register(task);
        info!("Subscribed to batch events ({})", id);
        Ok(id)
    }

    /// Cancel a subscription. Unknown or already cancelled ids are ignored.
    ///
    /// Returns whether a subscription was active.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listener.remove(id);
        if removed {
            info!("Unsubscribed from batch events ({})", id);
        } else {
            debug!("Subscription {} already inactive", id);
        }
        removed
    }

    /// Number of subscriptions still running
    pub fn active_subscriptions(&self) -> usize {
        self.listener.len()
    }
}

/// Extract batch-completion events from a transaction's log messages.
///
/// Program data from other events is skipped; malformed payloads are logged
/// and skipped.
pub fn parse_batch_events(logs: &[String]) -> Vec<BatchCompletedEvent> {
    logs.iter()
        .filter_map(|line| BatchCompletedEvent::from_log_line(line))
        .filter_map(|decoded| match decoded {
            Ok(event) => Some(event),
            Err(DecodeError::Discriminator) => None,
            Err(e) => {
                warn!("Skipping malformed batch event: {}", e);
                None
            }
        })
        .collect()
}

async fn forward_mock_events<F>(mut rx: broadcast::Receiver<BatchCompletedEvent>, handler: F)
where
    F: Fn(BatchCompletedEvent) + Send + Sync + 'static,
{
    loop {
        match rx.recv().await {
            Ok(event) => handler(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("[MOCK] Event stream lagged, missed {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn forward_log_events<F>(
    ws_url: String,
    program_id: Pubkey,
    commitment: CommitmentConfig,
    handler: F,
    ready: oneshot::Sender<Result<()>>,
) where
    F: Fn(BatchCompletedEvent) + Send + Sync + 'static,
{
    let pubsub = match PubsubClient::new(&ws_url).await {
        Ok(client) => client,
        Err(e) => {
            let _ = ready.send(Err(AirdropError::Rpc(format!(
                "event subscription to {} failed: {}",
                ws_url, e
            ))));
            return;
        }
    };

    // The stream borrows `pubsub`, so both live in this task
    let subscription = pubsub
        .logs_subscribe(
            RpcTransactionLogsFilter::Mentions(vec![program_id.to_string()]),
            RpcTransactionLogsConfig { commitment: Some(commitment) },
        )
        .await;
    let (mut stream, unsubscribe) = match subscription {
        Ok(subscription) => subscription,
        Err(e) => {
            let _ = ready.send(Err(AirdropError::Rpc(format!(
                "logs_subscribe for {} failed: {}",
                program_id, e
            ))));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while let Some(response) = stream.next().await {
        let logs = response.value;
        // Failed transactions roll back, their events never happened
        if logs.err.is_some() {
            continue;
        }
        for event in parse_batch_events(&logs.logs) {
            debug!("Batch event from {}: {:?}", logs.signature, event);
            handler(event);
        }
    }

    warn!("Event stream for {} closed", program_id);
    unsubscribe().await;
}
