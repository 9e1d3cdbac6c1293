//! Broadcast bus
//!
//! Fans every sample event out to every registered listener.
//!
//! # Membership
//!
//! `add` only appends to a pending queue guarded by a short synchronous
//! lock, so registering a client never waits on the poll path. Pending
//! listeners join the live set when the next `CategoryEvent` is delivered,
//! which means a listener never sees a data event without the category
//! that governs it.
//!
//! # Failure isolation
//!
//! A listener that returns an error is removed from the live set and
//! closed; delivery to the others continues in the same call.
//!
//! Delivery runs on the caller's task and awaits each listener in turn, so
//! a slow subscriber delays the rest of the cycle. There is no per-listener
//! queue.
//!
//! The live set stays locked for a whole delivery. `remove` never waits for
//! it: when a delivery is running the id is parked in a departed list, the
//! listener is skipped from then on and closed before the delivery returns
//! (or at the start of the next one).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use perftap_metrics::TapMetrics;
use perftap_protocol::SampleEvent;

use crate::error::{Result, TapError};
use crate::listener::{SampleListener, dispatch};

/// Identifier handed out by [`BroadcastBus::add`]
pub type ListenerId = u64;

struct Registered {
    id: ListenerId,
    listener: Box<dyn SampleListener>,
}

/// Process-wide fan-out hub
pub struct BroadcastBus {
    live: tokio::sync::Mutex<Vec<Registered>>,
    pending: Mutex<Vec<Registered>>,
    departed: Mutex<Vec<ListenerId>>,
    closed: AtomicBool,
    next_id: AtomicU64,
    metrics: Arc<TapMetrics>,
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(TapMetrics::new()))
    }

    /// Create a bus that records into shared metrics
    pub fn with_metrics(metrics: Arc<TapMetrics>) -> Self {
        Self {
            live: tokio::sync::Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            departed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            metrics,
        }
    }

    /// Metrics handle for the reporter
    pub fn metrics(&self) -> Arc<TapMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Queue a listener; it starts receiving at the next category event
    ///
    /// Fails with [`TapError::BusClosed`] once the bus has been closed.
    pub fn add(&self, listener: Box<dyn SampleListener>) -> Result<ListenerId> {
        let mut pending = self.pending.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(TapError::BusClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        pending.push(Registered { id, listener });
        self.metrics.listeners_live.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Remove and close a listener
    ///
    /// Returns false if the listener is unknown (already evicted or
    /// removed). While a delivery holds the live set the listener is only
    /// marked as departed and this returns true without waiting; the
    /// delivery closes it.
    pub async fn remove(&self, id: ListenerId) -> bool {
        let queued = {
            let mut pending = self.pending.lock();
            pending
                .iter()
                .position(|r| r.id == id)
                .map(|index| pending.remove(index))
        };

        if let Some(mut registered) = queued {
            registered.listener.close().await;
            self.metrics.listeners_live.fetch_sub(1, Ordering::Relaxed);
            return true;
        }

        let Ok(mut live) = self.live.try_lock() else {
            self.departed.lock().push(id);
            // the delivery may have finished its final reap meanwhile
            if let Ok(mut live) = self.live.try_lock() {
                self.reap(&mut live).await;
            }
            return true;
        };

        let position = live.iter().position(|r| r.id == id);
        match position {
            Some(index) => {
                let mut registered = live.remove(index);
                drop(live);
                registered.listener.close().await;
                self.metrics.listeners_live.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Close and drop every departed listener still in the live set
    async fn reap(&self, live: &mut Vec<Registered>) {
        let departed = std::mem::take(&mut *self.departed.lock());
        for id in departed {
            let position = live.iter().position(|r| r.id == id);
            if let Some(index) = position {
                let mut registered = live.remove(index);
                registered.listener.close().await;
                self.metrics.listeners_live.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    fn has_departed(&self, id: ListenerId) -> bool {
        self.departed.lock().contains(&id)
    }

    /// Deliver one event to every live listener
    ///
    /// A category event first promotes all pending listeners.
    pub async fn deliver(&self, event: &SampleEvent) {
        let mut live = self.live.lock().await;
        self.reap(&mut live).await;

        if matches!(event, SampleEvent::Category(_)) {
            let joined = std::mem::take(&mut *self.pending.lock());
            live.extend(joined);
        }

        let mut failed = Vec::new();
        let mut delivered = 0u64;
        for (index, registered) in live.iter_mut().enumerate() {
            if self.has_departed(registered.id) {
                continue;
            }
            match dispatch(registered.listener.as_mut(), event).await {
                Ok(()) => delivered += 1,
                Err(e) => failed.push((index, e)),
            }
        }
        self.metrics
            .events_delivered
            .fetch_add(delivered, Ordering::Relaxed);

        for (index, error) in failed.into_iter().rev() {
            let mut registered = live.remove(index);
            // a client that left mid-write is a removal, not an eviction
            if !self.has_departed(registered.id) {
                debug!(listener_id = registered.id, error = %error, "evicting listener");
                self.metrics.listeners_evicted.fetch_add(1, Ordering::Relaxed);
            }
            registered.listener.close().await;
            self.metrics.listeners_live.fetch_sub(1, Ordering::Relaxed);
        }

        self.reap(&mut live).await;
    }

    /// Close every listener and reject further adds
    pub async fn close(&self) {
        let queued = {
            let mut pending = self.pending.lock();
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *pending)
        };

        let mut live = self.live.lock().await;
        let mut all = std::mem::take(&mut *live);
        all.extend(queued);
        self.departed.lock().clear();
        drop(live);

        for registered in &mut all {
            registered.listener.close().await;
        }
        self.metrics
            .listeners_live
            .fetch_sub(all.len() as u64, Ordering::Relaxed);
        debug!(listeners = all.len(), "broadcast bus closed");
    }

    /// True once [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of live listeners (pending ones excluded)
    pub async fn live_count(&self) -> usize {
        self.live.lock().await.len()
    }

    /// Number of listeners waiting for the next category event
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

#[cfg(test)]
#[path = "bus_test.rs"]
mod tests;
