//! Per-order mutual exclusion.
//!
//! Webhook handlers and the poller can both try to advance the same order. Every state change for an order happens
//! while holding that order's lock, so two transitions for the same order never interleave. Orders that nobody is
//! working on do not hold an entry in the map.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use log::*;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::db_types::OrderId;

type LockMap = HashMap<OrderId, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct OrderLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no one else holds the lock for `order_id`. The lock is released when the guard is dropped.
    pub async fn acquire(&self, order_id: &OrderId) -> OrderLockGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(order_id.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        trace!("🔐️ Lock acquired for order {order_id}");
        OrderLockGuard { order_id: order_id.clone(), locks: Arc::clone(&self.locks), guard: Some(guard) }
    }

    /// The number of orders that are currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct OrderLockGuard {
    order_id: OrderId,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Release while holding the map lock, so that no new waiter can clone the entry in between
        drop(self.guard.take());
        let unused = locks.get(&self.order_id).map(|l| Arc::strong_count(l) == 1).unwrap_or(false);
        if unused {
            locks.remove(&self.order_id);
        }
        trace!("🔐️ Lock released for order {}", self.order_id);
    }
}
