//! Timer-driven discovery of orders that need work.
//!
//! Each cycle lists the actionable marketplace orders for the configured products, registers the unknown ones, and
//! runs the engine on every non-terminal order with bounded concurrency. A failure for one order is logged and does
//! not stop the cycle. A failed listing skips the cycle without touching any order.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::{stream, StreamExt};
use log::*;
use tokio::{sync::watch, time::MissedTickBehavior};

use crate::{
    db_types::ProductId,
    sync_api::{
        order_sync_api::OrderSyncApi,
        sync_objects::{CycleOutcome, CycleSummary},
    },
    traits::{FinOpsOperations, MarketplaceOrders, SyncDatabase},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub struct OrderPoller<B, F, M> {
    api: Arc<OrderSyncApi<B, F, M>>,
    product_ids: Vec<ProductId>,
    concurrency: usize,
    running: AtomicBool,
}

impl<B, F, M> OrderPoller<B, F, M> {
    pub fn new(api: Arc<OrderSyncApi<B, F, M>>, product_ids: Vec<ProductId>) -> Self {
        Self { api, product_ids, concurrency: DEFAULT_CONCURRENCY, running: AtomicBool::new(false) }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn api(&self) -> &Arc<OrderSyncApi<B, F, M>> {
        &self.api
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl<B, F, M> OrderPoller<B, F, M>
where
    B: SyncDatabase,
    F: FinOpsOperations,
    M: MarketplaceOrders,
{
    /// Runs a single poll cycle, unless one is already in progress, in which case [`CycleOutcome::Skipped`] is
    /// returned immediately.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(_guard) = CycleGuard::try_start(&self.running) else {
            info!("🕰️ The previous poll cycle is still running. Skipping this one");
            return CycleOutcome::Skipped;
        };
        let discovered = match self.api.discover_orders(&self.product_ids).await {
            Ok(discovered) => discovered,
            Err(e) => {
                error!("🕰️ Could not list actionable orders. Skipping this cycle. {e}");
                return CycleOutcome::DiscoveryFailed(e.to_string());
            },
        };
        let mut summary = CycleSummary { registered: discovered.registered, ..Default::default() };
        let results = stream::iter(discovered.order_ids)
            .map(|order_id| async move {
                let result = self.api.process_order(&order_id).await;
                (order_id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        for (order_id, result) in results {
            summary.processed += 1;
            match result {
                Ok(outcome) if outcome.changed() => summary.transitioned += 1,
                Ok(_) => {},
                Err(e) => {
                    summary.errors += 1;
                    error!("🕰️ Could not process order {order_id}. {e}");
                },
            }
        }
        CycleOutcome::Completed(summary)
    }

    /// Runs a cycle every `interval` until `shutdown` changes to `true` or its sender is dropped. Missed ticks are
    /// skipped.
    ///
    /// A cycle that is in flight when shutdown is requested gets `grace` to finish and is then cancelled. Returns the
    /// number of cycles that ran to completion.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>, grace: Duration) -> usize {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("🕰️ Order poller started for {} products. Interval: {interval:?}", self.product_ids.len());
        let mut completed = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = timer.tick() => {},
                _ = shutdown.changed() => break,
            }
            let cycle = self.run_cycle();
            tokio::pin!(cycle);
            tokio::select! {
                outcome = &mut cycle => {
                    log_outcome(&outcome);
                    completed += 1;
                },
                _ = shutdown.changed() => {
                    info!("🕰️ Shutdown requested. The current poll cycle has {grace:?} to finish");
                    match tokio::time::timeout(grace, &mut cycle).await {
                        Ok(outcome) => {
                            log_outcome(&outcome);
                            completed += 1;
                        },
                        Err(_) => warn!("🕰️ The poll cycle did not finish within {grace:?} and was cancelled"),
                    }
                    break;
                },
            }
        }
        info!("🕰️ Order poller stopped after {completed} cycles");
        completed
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Completed(s) => info!(
            "🕰️ Poll cycle complete. {} registered, {} processed, {} transitioned, {} errors",
            s.registered, s.processed, s.transitioned, s.errors
        ),
        CycleOutcome::Skipped => debug!("🕰️ Poll cycle skipped"),
        CycleOutcome::DiscoveryFailed(e) => warn!("🕰️ Poll cycle failed and was skipped. {e}"),
    }
}

/// Holds the poller's running flag for the duration of a cycle.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn try_start(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).ok().map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
