use std::{sync::Arc, time::Duration};

use actix_web::rt::task::JoinHandle;
use log::*;
use order_sync_engine::{
    db_types::ProductId,
    traits::{FinOpsOperations, MarketplaceOrders, SyncDatabase},
    OrderPoller,
    OrderSyncApi,
};
use tokio::sync::watch;

/// Starts the order poller on the current runtime. The poller stops once `shutdown` is set to `true`, giving an
/// in-flight cycle `grace` to finish. The returned handle resolves to the number of completed cycles.
pub fn start_poll_worker<B, F, M>(
    api: Arc<OrderSyncApi<B, F, M>>,
    product_ids: Vec<String>,
    interval: Duration,
    concurrency: usize,
    shutdown: watch::Receiver<bool>,
    grace: Duration,
) -> JoinHandle<usize>
where
    B: SyncDatabase + 'static,
    F: FinOpsOperations + 'static,
    M: MarketplaceOrders + 'static,
{
    let products = product_ids.into_iter().map(ProductId::from).collect::<Vec<_>>();
    actix_web::rt::spawn(async move {
        let poller = OrderPoller::new(api, products).with_concurrency(concurrency);
        info!("🕰️ Poll worker started");
        let cycles = poller.run(interval, shutdown, grace).await;
        info!("🕰️ Poll worker finished after {cycles} cycles");
        cycles
    })
}
