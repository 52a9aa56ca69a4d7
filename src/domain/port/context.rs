use std::sync::{Arc, mpsc};

use crate::domain::canal::gate::CanalGate;
use crate::domain::canal::link::LinkWriter;
use crate::domain::canal::protocol::PortSide;
use crate::domain::config::{FatalPolicy, RunConfig};
use crate::domain::quay::barrier::RendezvousBarrier;
use crate::domain::quay::crane::CraneSignal;
use crate::domain::quay::station::StationAllocator;
use crate::domain::simulator::simulator::SystemSimulator;
use crate::domain::sync::semaphore::Semaphore;
use crate::domain::utils::id::{CraneId, VesselId};
use crate::domain::utils::statistics::{StatParameter, StatisticEvent, StatsCollector};
use crate::error::{Error, Result};

fn signal_table(kind: &str, count: usize) -> Vec<Semaphore> {
    (1..=count).map(|id| Semaphore::signal(format!("{} {:2}", kind, id))).collect()
}

fn lookup<'a>(table: &'a [Semaphore], kind: &str, index: usize) -> Result<&'a Semaphore> {
    table.get(index).ok_or_else(|| Error::ProtocolViolation(format!("no {} with index {} in a run of {}", kind, index, table.len())))
}

/// Everything the workers of the Origin Port share.
pub struct OriginContext {
    pub vessel_count: usize,
    pub simulator: Arc<dyn SystemSimulator>,
    pub gate: CanalGate,
    pub link: LinkWriter,
    pub stats: Arc<StatsCollector>,
    pub fatal_policy: FatalPolicy,
    return_signals: Vec<Semaphore>,
}

impl OriginContext {
    pub fn new(
        vessel_count: usize,
        simulator: Arc<dyn SystemSimulator>,
        link: LinkWriter,
        stats: Arc<StatsCollector>,
        fatal_policy: FatalPolicy,
    ) -> Self {
        OriginContext {
            vessel_count,
            simulator,
            gate: CanalGate::new(),
            link,
            stats,
            fatal_policy,
            return_signals: signal_table("return signal of vessel", vessel_count),
        }
    }

    /// Fires when the vessel's return token was read from the canal link.
    pub fn return_signal(&self, vessel: VesselId) -> Result<&Semaphore> {
        lookup(&self.return_signals, "vessel", vessel.id.wrapping_sub(1))
    }

    pub fn record(&self, mut event: StatisticEvent) {
        event.set(StatParameter::Port, PortSide::Origin.to_string());
        self.stats.add_event(event);
    }
}

/// Everything the vessels, cranes and the quay coordinator of the Destination Port share.
pub struct DestinationContext {
    pub run: RunConfig,
    pub simulator: Arc<dyn SystemSimulator>,
    pub gate: CanalGate,
    pub barrier: RendezvousBarrier,
    pub allocator: StationAllocator,
    pub link: LinkWriter,
    pub stats: Arc<StatsCollector>,
    pub fatal_policy: FatalPolicy,
    vessel_signals: Vec<Semaphore>,
    station_vacated: Vec<Semaphore>,
    cranes: Vec<mpsc::Sender<CraneSignal>>,
}

impl DestinationContext {
    /// Builds the context and hands back one signal receiver per crane, in crane order.
    pub fn new(
        run: RunConfig,
        simulator: Arc<dyn SystemSimulator>,
        link: LinkWriter,
        stats: Arc<StatsCollector>,
        fatal_policy: FatalPolicy,
    ) -> (Self, Vec<mpsc::Receiver<CraneSignal>>) {
        let (cranes, receivers): (Vec<_>, Vec<_>) = (0..run.crane_count()).map(|_| mpsc::channel()).unzip();

        let context = DestinationContext {
            run,
            simulator,
            gate: CanalGate::new(),
            barrier: RendezvousBarrier::new(run.vessel_count()),
            allocator: StationAllocator::new(run.quay_size()),
            link,
            stats,
            fatal_policy,
            vessel_signals: signal_table("completion signal of vessel", run.vessel_count()),
            station_vacated: signal_table("vacated signal of station", run.quay_size()),
            cranes,
        };

        (context, receivers)
    }

    /// Count-of-one handoff the coordinator and the cranes use to move a vessel on.
    pub fn vessel_signal(&self, vessel: VesselId) -> Result<&Semaphore> {
        lookup(&self.vessel_signals, "vessel", vessel.id.wrapping_sub(1))
    }

    pub fn station_vacated(&self, station: usize) -> Result<&Semaphore> {
        lookup(&self.station_vacated, "station", station)
    }

    pub fn signal_crane(&self, station: usize, signal: CraneSignal) -> Result<()> {
        let crane = CraneId::from_index(station);
        let sender = self.cranes.get(station).ok_or_else(|| Error::ProtocolViolation(format!("no crane serves station {}", station)))?;
        sender.send(signal).map_err(|_| Error::SignalFailed(format!("crane {} is no longer operating", crane)))
    }

    /// Sends exactly one `Retire` to every crane.
    pub fn retire_cranes(&self) {
        for station in 0..self.cranes.len() {
            if let Err(e) = self.signal_crane(station, CraneSignal::Retire) {
                log::warn!("Eilat Port: {}", e);
            }
        }
    }

    pub fn record(&self, mut event: StatisticEvent) {
        event.set(StatParameter::Port, PortSide::Destination.to_string());
        self.stats.add_event(event);
    }
}
