use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::sync::semaphore::Semaphore;
use crate::error::{Error, Result};

/// Direction of travel through the single-lane canal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Origin Port towards Destination Port.
    Outbound,
    /// Destination Port back to Origin Port.
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "Med. Sea ==> Red Sea"),
            Direction::Inbound => write!(f, "Red Sea ==> Med. Sea"),
        }
    }
}

#[derive(Debug)]
struct Lane {
    slot: Semaphore,
    occupants: AtomicUsize,
    peak: AtomicUsize,
}

impl Lane {
    fn new(direction: Direction) -> Self {
        Self { slot: Semaphore::binary(format!("canal lane '{}'", direction)), occupants: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
    }
}

/// Two independent one-slot gates, one per direction.
///
/// A lane is entered by the vessel about to sail through it and left by
/// whichever thread observes that vessel clearing the far end, which is
/// usually not the thread that entered.
#[derive(Debug)]
pub struct CanalGate {
    outbound: Lane,
    inbound: Lane,
}

impl Default for CanalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CanalGate {
    pub fn new() -> Self {
        Self { outbound: Lane::new(Direction::Outbound), inbound: Lane::new(Direction::Inbound) }
    }

    fn lane(&self, direction: Direction) -> &Lane {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    pub fn enter(&self, direction: Direction) {
        let lane = self.lane(direction);
        lane.slot.acquire();
        let occupants = lane.occupants.fetch_add(1, Ordering::SeqCst) + 1;
        lane.peak.fetch_max(occupants, Ordering::SeqCst);
    }

    pub fn leave(&self, direction: Direction) -> Result<()> {
        let lane = self.lane(direction);
        lane.occupants
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |occupants| occupants.checked_sub(1))
            .map_err(|_| Error::GateNotHeld(direction))?;
        lane.slot.release()
    }

    pub fn occupancy(&self, direction: Direction) -> usize {
        self.lane(direction).occupants.load(Ordering::SeqCst)
    }

    /// Highest occupancy the lane ever had. Stays at 1 for a lane that was used correctly.
    pub fn peak_occupancy(&self, direction: Direction) -> usize {
        self.lane(direction).peak.load(Ordering::SeqCst)
    }

    pub fn enter_outbound(&self) {
        self.enter(Direction::Outbound);
    }

    pub fn leave_outbound(&self) -> Result<()> {
        self.leave(Direction::Outbound)
    }

    pub fn enter_inbound(&self) {
        self.enter(Direction::Inbound);
    }

    pub fn leave_inbound(&self) -> Result<()> {
        self.leave(Direction::Inbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_leave_without_enter_is_rejected() {
        let gate = CanalGate::new();
        let err = gate.leave_inbound().unwrap_err();
        assert!(matches!(err, Error::GateNotHeld(Direction::Inbound)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_directions_are_independent() {
        let gate = CanalGate::new();
        gate.enter_outbound();
        gate.enter_inbound();
        assert_eq!(gate.occupancy(Direction::Outbound), 1);
        assert_eq!(gate.occupancy(Direction::Inbound), 1);

        gate.leave_outbound().unwrap();
        assert_eq!(gate.occupancy(Direction::Outbound), 0);
        assert_eq!(gate.occupancy(Direction::Inbound), 1);
        assert_eq!(gate.peak_occupancy(Direction::Outbound), 1);
        assert_eq!(gate.peak_occupancy(Direction::Inbound), 1);
    }

    #[test]
    fn test_outbound_lane_never_holds_two_vessels() {
        let gate = Arc::new(CanalGate::new());
        let violated = Arc::new(AtomicBool::new(false));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let gate = gate.clone();
                let violated = violated.clone();
                thread::spawn(move || {
                    gate.enter_outbound();
                    if gate.occupancy(Direction::Outbound) != 1 {
                        violated.store(true, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_millis(1));
                    gate.leave_outbound().unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!violated.load(Ordering::SeqCst));
        assert_eq!(gate.occupancy(Direction::Outbound), 0);
    }
}
