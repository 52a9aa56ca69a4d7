use crate::domain::canal::gate::Direction;
use crate::domain::canal::protocol::CanalMessage;
use crate::domain::port::context::DestinationContext;
use crate::domain::quay::crane::CraneSignal;
use crate::domain::utils::id::{CraneId, VesselId};
use crate::domain::utils::statistics::{StatParameter, StatisticEvent};
use crate::error::Result;

/// Where a vessel is between its arrival at the Destination Port and its return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VesselState {
    Arrived,
    Queued,
    Stationed,
    Unloading { station: usize },
    Released { station: usize },
    InInboundCanal,
    Returned,
}

impl VesselState {
    /// Performs the work of the current state and returns the next one.
    /// Blocks wherever the vessel has to wait for the coordinator, its crane or the canal.
    pub fn advance(self, vessel: VesselId, context: &DestinationContext) -> Result<VesselState> {
        let next = match self {
            VesselState::Arrived => {
                log::info!("Vessel {} - arrived @ Eilat Port", vessel);
                context.simulator.pause();
                context.link.send(CanalMessage::GateRelease { direction: Direction::Outbound, vessel })?;

                log::info!("Vessel {} - entering Barrier", vessel);
                context.barrier.arrive(vessel)?;
                context.record(StatisticEvent::of_component("Vessel", vessel.id, "EnteredBarrier"));
                VesselState::Queued
            }
            VesselState::Queued => {
                context.vessel_signal(vessel)?.acquire();
                VesselState::Stationed
            }
            VesselState::Stationed => {
                log::info!("Vessel {} - entering Unloading Quay", vessel);
                context.simulator.pause();

                let station = context.allocator.claim_station(vessel)?;
                log::info!("Vessel {} - stationed near crane {}", vessel, CraneId::from_index(station).id);

                let cargo_weight = context.simulator.cargo_weight();
                context.allocator.load_cargo(station, cargo_weight)?;
                log::info!("Vessel {} - cargo's weight is {} tons", vessel, cargo_weight);

                let mut event = StatisticEvent::of_component("Vessel", vessel.id, "Stationed");
                event.set(StatParameter::CargoWeight, cargo_weight);
                context.record(event);
                VesselState::Unloading { station }
            }
            VesselState::Unloading { station } => {
                context.signal_crane(station, CraneSignal::Unload)?;
                context.vessel_signal(vessel)?.acquire();
                VesselState::Released { station }
            }
            VesselState::Released { station } => {
                context.simulator.pause();
                log::info!("Vessel {} - exiting unloading quay", vessel);
                context.allocator.vacate(station)?;
                context.station_vacated(station)?.release()?;
                VesselState::InInboundCanal
            }
            VesselState::InInboundCanal => {
                context.gate.enter(Direction::Inbound);
                log::info!("Vessel {} - entering Canal: {}", vessel, Direction::Inbound);
                context.simulator.pause();
                context.link.send(CanalMessage::returning(vessel))?;
                context.record(StatisticEvent::of_component("Vessel", vessel.id, "Returned"));
                VesselState::Returned
            }
            VesselState::Returned => VesselState::Returned,
        };

        Ok(next)
    }
}

/// Drives one vessel from its arrival to its return through the canal.
pub fn run_destination_vessel(vessel: VesselId, context: &DestinationContext) -> Result<()> {
    let mut state = VesselState::Arrived;
    while state != VesselState::Returned {
        state = state.advance(vessel, context)?;
    }
    Ok(())
}
