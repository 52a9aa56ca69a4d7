use std::sync::mpsc::Receiver;

use crate::domain::port::context::DestinationContext;
use crate::domain::utils::id::CraneId;
use crate::domain::utils::statistics::{StatParameter, StatisticEvent};
use crate::error::{Error, Result};

/// Message delivered on a crane's private channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CraneSignal {
    /// A vessel with cargo waits at the crane's station.
    Unload,
    /// No vessel will come any more; leave the worker loop.
    Retire,
}

/// Worker loop of one crane. Returns the number of vessels it unloaded.
///
/// The crane serves station `crane.index()` for the whole run. It idles on its
/// channel, unloads the vessel found at the station, then hands the vessel its
/// completion signal so it can leave the quay.
pub fn run_crane(crane: CraneId, signals: Receiver<CraneSignal>, context: &DestinationContext) -> Result<usize> {
    let station = crane.index();
    let mut unloaded = 0;

    log::info!("Crane  {} - starts operating", crane);

    while let Ok(signal) = signals.recv() {
        match signal {
            CraneSignal::Unload => {
                unload_vessel(crane, station, context)?;
                unloaded += 1;
            }
            CraneSignal::Retire => break,
        }
    }

    log::info!("Crane  {} - done operating", crane);
    Ok(unloaded)
}

fn unload_vessel(crane: CraneId, station: usize, context: &DestinationContext) -> Result<()> {
    context.simulator.pause();

    let (vessel, _) = context.allocator.manifest(station)?;
    let vessel = vessel.ok_or_else(|| Error::ProtocolViolation(format!("crane {} was signalled for an empty station", crane)))?;
    let cargo_weight = context
        .allocator
        .unload(station)?
        .ok_or_else(|| Error::ProtocolViolation(format!("crane {} found vessel {} without cargo", crane, vessel.id)))?;

    log::info!("Crane  {} - unloaded {} tons from vessel {}", crane, cargo_weight, vessel.id);

    let mut event = StatisticEvent::of_component("Crane", crane.id, "Unloaded");
    event.set(StatParameter::VesselId, vessel.id).set(StatParameter::CargoWeight, cargo_weight);
    context.record(event);

    context.vessel_signal(vessel)?.release()
}
