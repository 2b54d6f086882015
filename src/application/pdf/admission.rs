//! Bounded-concurrency admission with a strict FIFO wait queue.
//!
//! At most `limit` permits exist at once. Callers beyond that wait in a queue
//! of at most `2 × limit`; anyone arriving when the queue is full is turned
//! away immediately. A released slot goes straight to the oldest waiter that is
//! still listening, so admission order equals arrival order.

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
};

use metrics::gauge;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::warn;

use crate::infra::telemetry::METRIC_PDF_QUEUE_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("admission queue is full")]
pub struct QueueFull;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionSnapshot {
    pub active: usize,
    pub queued: usize,
}

#[derive(Debug, Default)]
struct GateState {
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl GateState {
    fn live_waiters(&self) -> usize {
        self.waiters.iter().filter(|tx| !tx.is_closed()).count()
    }
}

#[derive(Debug)]
pub struct AdmissionGate {
    limit: usize,
    max_queue: usize,
    state: Mutex<GateState>,
}

impl AdmissionGate {
    pub fn new(limit: NonZeroUsize) -> Arc<Self> {
        Arc::new(Self {
            limit: limit.get(),
            max_queue: limit.get().saturating_mul(2),
            state: Mutex::new(GateState::default()),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn max_queue(&self) -> usize {
        self.max_queue
    }

    pub fn snapshot(&self) -> AdmissionSnapshot {
        let state = self.lock_state();
        AdmissionSnapshot {
            active: state.active,
            queued: state.live_waiters(),
        }
    }

    /// Wait for a slot. Resolves immediately when one is free, fails
    /// immediately with [`QueueFull`] when the wait queue is at capacity.
    ///
    /// Dropping the returned future while it waits gives up the queue position;
    /// a slot that raced in during the drop is handed on.
    pub async fn acquire(self: &Arc<Self>) -> Result<AdmissionPermit, QueueFull> {
        let mut pending = match self.try_enter()? {
            Entry::Admitted(permit) => return Ok(permit),
            Entry::Queued(pending) => pending,
        };
        pending.wait().await
    }

    fn try_enter(self: &Arc<Self>) -> Result<Entry, QueueFull> {
        let mut state = self.lock_state();

        if state.active < self.limit {
            state.active += 1;
            return Ok(Entry::Admitted(AdmissionPermit {
                gate: Arc::clone(self),
            }));
        }

        state.waiters.retain(|tx| !tx.is_closed());
        if state.waiters.len() >= self.max_queue {
            return Err(QueueFull);
        }

        let (tx, rx) = oneshot::channel();
        state.waiters.push_back(tx);
        gauge!(METRIC_PDF_QUEUE_DEPTH).set(state.waiters.len() as f64);

        Ok(Entry::Queued(PendingAdmission {
            gate: Arc::clone(self),
            rx: Some(rx),
        }))
    }

    fn release(&self) {
        let mut state = self.lock_state();
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                gauge!(METRIC_PDF_QUEUE_DEPTH).set(state.waiters.len() as f64);
                return;
            }
        }
        gauge!(METRIC_PDF_QUEUE_DEPTH).set(0.0);
        state.active = state.active.saturating_sub(1);
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    target = "application::pdf::admission",
                    lock_kind = "mutex.lock",
                    result = "poisoned_recovered",
                    "Recovered from poisoned admission lock"
                );
                poisoned.into_inner()
            }
        }
    }
}

enum Entry {
    Admitted(AdmissionPermit),
    Queued(PendingAdmission),
}

/// A held admission slot; released on drop.
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

struct PendingAdmission {
    gate: Arc<AdmissionGate>,
    rx: Option<oneshot::Receiver<()>>,
}

impl PendingAdmission {
    async fn wait(&mut self) -> Result<AdmissionPermit, QueueFull> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(QueueFull);
        };
        let outcome = rx.await;
        self.rx = None;
        match outcome {
            Ok(()) => Ok(AdmissionPermit {
                gate: Arc::clone(&self.gate),
            }),
            // Only reachable if the sender was discarded without a hand-off.
            Err(_) => Err(QueueFull),
        }
    }
}

impl Drop for PendingAdmission {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                self.gate.release();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{task::JoinHandle, time::sleep};

    use super::*;

    fn gate(limit: usize) -> Arc<AdmissionGate> {
        AdmissionGate::new(NonZeroUsize::new(limit).expect("non-zero limit"))
    }

    async fn settle() {
        sleep(Duration::from_millis(20)).await;
    }

    fn spawn_waiter(
        gate: &Arc<AdmissionGate>,
        order: &Arc<Mutex<Vec<usize>>>,
        id: usize,
    ) -> JoinHandle<AdmissionPermit> {
        let gate = Arc::clone(gate);
        let order = Arc::clone(order);
        tokio::spawn(async move {
            let permit = gate.acquire().await.expect("queued waiter admitted");
            order.lock().expect("order lock").push(id);
            permit
        })
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_queues() {
        let gate = gate(2);
        let first = gate.acquire().await.expect("first");
        let _second = gate.acquire().await.expect("second");

        let order = Arc::new(Mutex::new(Vec::new()));
        let waiter = spawn_waiter(&gate, &order, 3);
        settle().await;
        assert_eq!(
            gate.snapshot(),
            AdmissionSnapshot {
                active: 2,
                queued: 1
            }
        );

        drop(first);
        let _third = waiter.await.expect("join");
        assert_eq!(
            gate.snapshot(),
            AdmissionSnapshot {
                active: 2,
                queued: 0
            }
        );
    }

    #[tokio::test]
    async fn rejects_when_queue_is_full() {
        let gate = gate(1);
        let _held = gate.acquire().await.expect("held");

        let order = Arc::new(Mutex::new(Vec::new()));
        let waiters: Vec<_> = (0..2).map(|id| spawn_waiter(&gate, &order, id)).collect();
        settle().await;
        assert_eq!(gate.snapshot().queued, 2);

        assert_eq!(gate.acquire().await.err(), Some(QueueFull));

        for waiter in waiters {
            waiter.abort();
        }
    }

    #[tokio::test]
    async fn hands_slots_out_in_arrival_order() {
        let gate = gate(1);
        let held = gate.acquire().await.expect("held");

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for id in 0..2 {
            handles.push(spawn_waiter(&gate, &order, id));
            settle().await;
        }

        drop(held);
        let first = handles.remove(0).await.expect("join first");
        settle().await;
        assert_eq!(*order.lock().expect("order"), vec![0]);

        drop(first);
        let _second = handles.remove(0).await.expect("join second");
        assert_eq!(*order.lock().expect("order"), vec![0, 1]);
    }

    #[tokio::test]
    async fn cancelled_waiter_is_skipped_and_frees_its_place() {
        let gate = gate(1);
        let held = gate.acquire().await.expect("held");

        let order = Arc::new(Mutex::new(Vec::new()));
        let cancelled = spawn_waiter(&gate, &order, 0);
        settle().await;
        let survivor = spawn_waiter(&gate, &order, 1);
        settle().await;

        cancelled.abort();
        settle().await;
        assert_eq!(gate.snapshot().queued, 1);

        drop(held);
        let permit = survivor.await.expect("join");
        assert_eq!(*order.lock().expect("order"), vec![1]);

        drop(permit);
        assert_eq!(
            gate.snapshot(),
            AdmissionSnapshot {
                active: 0,
                queued: 0
            }
        );
    }

    #[tokio::test]
    async fn released_slots_return_to_the_gate_when_nobody_waits() {
        let gate = gate(3);
        let permits: Vec<_> = futures::future::join_all((0..3).map(|_| gate.acquire()))
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("all admitted");
        assert_eq!(gate.snapshot().active, 3);

        drop(permits);
        assert_eq!(gate.snapshot().active, 0);
    }
}
