use crate::domain::canal::gate::Direction;
use crate::domain::canal::protocol::CanalMessage;
use crate::domain::port::context::OriginContext;
use crate::domain::utils::id::VesselId;
use crate::domain::utils::statistics::StatisticEvent;
use crate::error::Result;

/// Life of a vessel as seen from the Origin Port: sail out through the canal,
/// wait for the return token and dock again.
pub fn run_origin_vessel(vessel: VesselId, context: &OriginContext) -> Result<()> {
    log::info!("Vessel {} - starts sailing @ Haifa Port", vessel);
    context.record(StatisticEvent::of_component("Vessel", vessel.id, "StartedSailing"));
    context.simulator.pause();

    context.gate.enter(Direction::Outbound);
    log::info!("Vessel {} - entering Canal: {}", vessel, Direction::Outbound);
    context.simulator.pause();
    context.link.send(CanalMessage::departure(vessel))?;
    context.record(StatisticEvent::of_component("Vessel", vessel.id, "Departed"));

    context.return_signal(vessel)?.acquire();

    log::info!("Vessel {} - exiting Canal: {}", vessel, Direction::Inbound);
    context.simulator.pause();
    context.link.send(CanalMessage::GateRelease { direction: Direction::Inbound, vessel })?;

    log::info!("Vessel {} - done sailing @ Haifa Port", vessel);
    context.record(StatisticEvent::of_component("Vessel", vessel.id, "DoneSailing"));
    Ok(())
}
