use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::domain::utils::id::VesselId;
use crate::error::{Error, Result};

/// Bounded FIFO of the vessels waiting at the barrier.
#[derive(Debug)]
pub struct VesselQueue {
    vessels: VecDeque<VesselId>,
    limit: usize,
}

impl VesselQueue {
    pub fn new(limit: usize) -> Self {
        Self { vessels: VecDeque::with_capacity(limit), limit }
    }

    pub fn enqueue(&mut self, vessel: VesselId) -> Result<()> {
        if self.vessels.len() >= self.limit {
            return Err(Error::BarrierOverflow { capacity: self.limit, vessel });
        }
        self.vessels.push_back(vessel);
        Ok(())
    }

    pub fn dequeue(&mut self) -> Option<VesselId> {
        self.vessels.pop_front()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

/// Result of waiting for one arrival signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// One arrival signal was consumed.
    Signalled,
    /// Every vessel of the run has passed through the barrier; none will follow.
    Drained,
}

/// Where the vessels of a run currently are, from the barrier's point of view.
/// The three counts always add up to the vessel count of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierCensus {
    pub queued: usize,
    pub released: usize,
    pub not_arrived: usize,
}

#[derive(Debug)]
struct BarrierState {
    queue: VesselQueue,
    pending_signals: usize,
    arrived: usize,
    released: usize,
    sealed: bool,
}

impl BarrierState {
    fn is_drained(&self) -> bool {
        self.sealed && self.arrived == self.queue.limit && self.queue.is_empty()
    }
}

/// Synchronization point where vessels wait until a full batch is present.
///
/// Vessels `arrive`, the quay coordinator consumes arrival signals one at a
/// time and takes whole batches out in arrival order.
#[derive(Debug)]
pub struct RendezvousBarrier {
    state: Mutex<BarrierState>,
    changed: Condvar,
}

impl RendezvousBarrier {
    pub fn new(capacity: usize) -> Self {
        let state = BarrierState { queue: VesselQueue::new(capacity), pending_signals: 0, arrived: 0, released: 0, sealed: false };
        Self { state: Mutex::new(state), changed: Condvar::new() }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `vessel` to the queue and raises the arrival count by one.
    pub fn arrive(&self, vessel: VesselId) -> Result<()> {
        let mut state = self.lock();
        state.queue.enqueue(vessel)?;
        state.arrived += 1;
        state.pending_signals += 1;
        self.changed.notify_all();
        Ok(())
    }

    /// Blocks until one arrival signal can be consumed, or the barrier is drained.
    pub fn await_arrival(&self) -> Arrival {
        let mut state = self.lock();
        loop {
            if state.pending_signals > 0 {
                state.pending_signals -= 1;
                return Arrival::Signalled;
            }
            if state.is_drained() {
                return Arrival::Drained;
            }
            state = self.changed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes `size` vessels in arrival order, or nothing if fewer are queued.
    pub fn take_batch(&self, size: usize) -> Option<Vec<VesselId>> {
        let mut state = self.lock();
        if size == 0 || state.queue.len() < size {
            return None;
        }

        let batch: Vec<VesselId> = (0..size).filter_map(|_| state.queue.dequeue()).collect();
        state.released += batch.len();
        self.changed.notify_all();
        Some(batch)
    }

    /// Declares that no further vessels will be announced for this run.
    pub fn seal(&self) {
        let mut state = self.lock();
        state.sealed = true;
        self.changed.notify_all();
    }

    pub fn is_drained(&self) -> bool {
        self.lock().is_drained()
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn census(&self) -> BarrierCensus {
        let state = self.lock();
        BarrierCensus { queued: state.queue.len(), released: state.released, not_arrived: state.queue.limit - state.arrived }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn vessels(ids: &[usize]) -> Vec<VesselId> {
        ids.iter().map(|id| VesselId::new(*id)).collect()
    }

    #[test]
    fn test_queue_rejects_enqueue_past_limit() {
        let mut queue = VesselQueue::new(2);
        queue.enqueue(VesselId::new(1)).unwrap();
        queue.enqueue(VesselId::new(2)).unwrap();

        let err = queue.enqueue(VesselId::new(3)).unwrap_err();
        assert!(matches!(err, Error::BarrierOverflow { capacity: 2, .. }));
        assert!(err.is_fatal());
        assert_eq!(queue.dequeue(), Some(VesselId::new(1)));
    }

    #[test]
    fn test_batches_leave_in_arrival_order() {
        let barrier = RendezvousBarrier::new(4);
        for id in [3, 1, 4, 2] {
            barrier.arrive(VesselId::new(id)).unwrap();
        }

        assert_eq!(barrier.take_batch(2), Some(vessels(&[3, 1])));
        assert_eq!(barrier.take_batch(3), None);
        assert_eq!(barrier.take_batch(2), Some(vessels(&[4, 2])));
        assert!(barrier.is_empty());
    }

    #[test]
    fn test_census_always_accounts_for_every_vessel() {
        let barrier = RendezvousBarrier::new(4);
        let total = |c: BarrierCensus| c.queued + c.released + c.not_arrived;
        assert_eq!(barrier.census(), BarrierCensus { queued: 0, released: 0, not_arrived: 4 });

        barrier.arrive(VesselId::new(1)).unwrap();
        barrier.arrive(VesselId::new(2)).unwrap();
        barrier.arrive(VesselId::new(3)).unwrap();
        assert_eq!(total(barrier.census()), 4);

        barrier.take_batch(2).unwrap();
        assert_eq!(barrier.census(), BarrierCensus { queued: 1, released: 2, not_arrived: 1 });
        assert_eq!(total(barrier.census()), 4);
    }

    #[test]
    fn test_sealed_barrier_is_drained_only_after_every_arrival() {
        let barrier = RendezvousBarrier::new(2);
        barrier.seal();
        assert!(barrier.is_empty());
        assert!(!barrier.is_drained());

        barrier.arrive(VesselId::new(1)).unwrap();
        barrier.arrive(VesselId::new(2)).unwrap();
        assert_eq!(barrier.await_arrival(), Arrival::Signalled);
        assert_eq!(barrier.await_arrival(), Arrival::Signalled);
        barrier.take_batch(2).unwrap();

        assert!(barrier.is_drained());
        assert_eq!(barrier.await_arrival(), Arrival::Drained);
    }

    #[test]
    fn test_await_arrival_blocks_until_a_vessel_arrives() {
        let barrier = Arc::new(RendezvousBarrier::new(3));
        let waiter = {
            let barrier = barrier.clone();
            thread::spawn(move || barrier.await_arrival())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        barrier.arrive(VesselId::new(1)).unwrap();
        assert_eq!(waiter.join().unwrap(), Arrival::Signalled);
    }
}
