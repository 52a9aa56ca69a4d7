use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::utils::id::{CraneId, VesselId};
use crate::error::{Error, Result};

/// One unloading position in the quay, served by a dedicated crane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub crane: CraneId,
    pub vessel: Option<VesselId>,
    pub cargo_weight: Option<u32>,
    pub occupied: bool,
}

impl Station {
    fn vacant(crane: CraneId) -> Self {
        Station { crane, vessel: None, cargo_weight: None, occupied: false }
    }

    fn is_vacant(&self) -> bool {
        self.vessel.is_none() && self.cargo_weight.is_none() && !self.occupied
    }
}

/// Allocates quay stations to the vessels of the current batch.
///
/// Station `i` is served by crane `i + 1`. All reads and writes go through a
/// single lock, so a station is never handed to two vessels at once.
#[derive(Debug)]
pub struct StationAllocator {
    stations: Mutex<Vec<Station>>,
}

impl StationAllocator {
    pub fn new(quay_size: usize) -> Self {
        let stations = (0..quay_size).map(|index| Station::vacant(CraneId::from_index(index))).collect();
        Self { stations: Mutex::new(stations) }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Station>> {
        self.stations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn quay_size(&self) -> usize {
        self.lock().len()
    }

    /// Claims the first free station for `vessel` and returns its index.
    pub fn claim_station(&self, vessel: VesselId) -> Result<usize> {
        let mut stations = self.lock();

        if stations.iter().any(|station| station.vessel == Some(vessel)) {
            return Err(Error::ProtocolViolation(format!("vessel {} already holds a station", vessel)));
        }

        let index = stations.iter().position(Station::is_vacant).ok_or(Error::QuayExhausted(vessel))?;
        let station = &mut stations[index];
        station.vessel = Some(vessel);
        station.occupied = true;
        Ok(index)
    }

    pub fn load_cargo(&self, index: usize, cargo_weight: u32) -> Result<()> {
        self.with_station(index, |station| {
            station.cargo_weight = Some(cargo_weight);
        })
    }

    /// Vessel and cargo weight currently held at `index`.
    pub fn manifest(&self, index: usize) -> Result<(Option<VesselId>, Option<u32>)> {
        self.with_station(index, |station| (station.vessel, station.cargo_weight))
    }

    /// Removes the cargo from the station and returns its weight.
    pub fn unload(&self, index: usize) -> Result<Option<u32>> {
        self.with_station(index, |station| station.cargo_weight.take())
    }

    /// The vessel left the station. Its id stays recorded until the next `reset`.
    pub fn vacate(&self, index: usize) -> Result<()> {
        self.with_station(index, |station| {
            station.occupied = false;
        })
    }

    /// True if no station holds or remembers a vessel.
    pub fn is_vacated(&self) -> bool {
        self.lock().iter().all(Station::is_vacant)
    }

    /// Returns every station to its initial state.
    pub fn reset(&self) {
        let mut stations = self.lock();
        for station in stations.iter_mut() {
            *station = Station::vacant(station.crane);
        }
    }

    /// Runs `f` with the station lock held, passing whether the quay is vacated.
    pub fn with_vacated_quay<R>(&self, f: impl FnOnce(bool) -> R) -> R {
        let stations = self.lock();
        let vacated = stations.iter().all(Station::is_vacant);
        let result = f(vacated);
        drop(stations);
        result
    }

    pub fn snapshot(&self) -> Vec<Station> {
        self.lock().clone()
    }

    fn with_station<R>(&self, index: usize, f: impl FnOnce(&mut Station) -> R) -> Result<R> {
        let mut stations = self.lock();
        let size = stations.len();
        let station = stations
            .get_mut(index)
            .ok_or_else(|| Error::ProtocolViolation(format!("station index {} outside quay of size {}", index, size)))?;
        Ok(f(station))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_claims_get_distinct_stations() {
        let allocator = Arc::new(StationAllocator::new(6));
        let handles: Vec<_> = (1..=6)
            .map(|id| {
                let allocator = allocator.clone();
                thread::spawn(move || allocator.claim_station(VesselId::new(id)).unwrap())
            })
            .collect();

        let indices: HashSet<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(indices, (0..6).collect());
        assert!(matches!(allocator.claim_station(VesselId::new(7)), Err(Error::QuayExhausted(_))));
    }

    #[test]
    fn test_station_lifecycle() {
        let allocator = StationAllocator::new(2);
        let vessel = VesselId::new(4);

        let index = allocator.claim_station(vessel).unwrap();
        assert_eq!(index, 0);
        allocator.load_cargo(index, 23).unwrap();
        assert_eq!(allocator.manifest(index).unwrap(), (Some(vessel), Some(23)));
        assert!(allocator.claim_station(vessel).is_err());

        assert_eq!(allocator.unload(index).unwrap(), Some(23));
        assert_eq!(allocator.manifest(index).unwrap(), (Some(vessel), None));

        allocator.vacate(index).unwrap();
        assert!(!allocator.is_vacated());

        allocator.reset();
        assert!(allocator.is_vacated());
        assert_eq!(allocator.snapshot(), StationAllocator::new(2).snapshot());
        let cranes: Vec<CraneId> = allocator.snapshot().iter().map(|s| s.crane).collect();
        assert_eq!(cranes, vec![CraneId::new(1), CraneId::new(2)]);
    }

    #[test]
    fn test_out_of_range_station_is_rejected() {
        let allocator = StationAllocator::new(1);
        assert!(matches!(allocator.unload(3), Err(Error::ProtocolViolation(_))));
    }
}
