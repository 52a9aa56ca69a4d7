use std::io::{Read, Write};
use std::sync::Arc;

use crate::domain::canal::gate::Direction;
use crate::domain::canal::link::{LinkReader, open_link};
use crate::domain::canal::protocol::{CanalMessage, MessageKind, PortSide};
use crate::domain::config::{SimulationSettings, validate_vessel_count};
use crate::domain::port::context::OriginContext;
use crate::domain::port::{WorkerHandle, join_worker, spawn_worker};
use crate::domain::simulator::simulator::SystemSimulator;
use crate::domain::utils::id::VesselId;
use crate::domain::utils::statistics::StatsCollector;
use crate::domain::vessel::origin_vessel::run_origin_vessel;
use crate::error::{Error, Result};

/// Outcome of a run as seen by the Origin Port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginReport {
    pub approved: bool,
    pub vessel_count: usize,
    /// Vessels in the order their return tokens were read.
    pub returned: Vec<VesselId>,
    /// Highest occupancy of the outbound lane, which this port owns.
    pub canal_peak_occupancy: usize,
    pub failed_workers: Vec<String>,
}

/// Runs the Origin Port for `vessel_count` vessels over the given canal link.
pub fn run_origin_port<R, W>(
    vessel_count: usize,
    reader: R,
    writer: W,
    settings: &SimulationSettings,
    simulator: Arc<dyn SystemSimulator>,
) -> Result<OriginReport>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let vessel_count = validate_vessel_count(vessel_count)?;
    let (mut reader, writer) = open_link(reader, writer, settings.wire_format);
    let stats = Arc::new(StatsCollector::init(settings.statistics_file_for(PortSide::Origin).as_deref())?);

    log::info!("Haifa Port : There are {} Vessels in the port", vessel_count);
    log::info!("Haifa Port: Requesting passage from Eilat Port...");
    writer.send(CanalMessage::RequestPassage { vessel_count })?;

    let CanalMessage::PassageResult { denied } = reader.expect(MessageKind::PassageResult)? else {
        return Err(Error::ProtocolViolation("expected a passage result".to_string()));
    };
    log::info!("Haifa Port: passage from Eilat Port {}!", if denied { "denied" } else { "approved" });

    let mut report = OriginReport { approved: !denied, vessel_count, returned: Vec::new(), canal_peak_occupancy: 0, failed_workers: Vec::new() };
    if denied {
        stats.finish()?;
        return Ok(report);
    }

    let context = Arc::new(OriginContext::new(vessel_count, simulator, writer.clone(), stats.clone(), settings.fatal_policy));

    let mut vessels: Vec<(VesselId, WorkerHandle<()>)> = Vec::with_capacity(vessel_count);
    for index in 0..vessel_count {
        let vessel = VesselId::from_index(index);
        let context = context.clone();
        let handle = spawn_worker(format!("Vessel {}", vessel), settings.fatal_policy, move || run_origin_vessel(vessel, &context))?;
        vessels.push((vessel, handle));
    }

    report.returned = read_returning_vessels(&mut reader, &context)?;
    report.canal_peak_occupancy = context.gate.peak_occupancy(Direction::Outbound);

    for (vessel, handle) in vessels {
        join_worker(&format!("Vessel {}", vessel), handle, &mut report.failed_workers);
    }
    log::info!("Haifa Port: All Vessel Threads are done");

    writer.send(CanalMessage::done(PortSide::Origin))?;
    match reader.expect(MessageKind::ShutdownSignal)? {
        CanalMessage::ShutdownSignal { port: PortSide::Destination, done: true } => {}
        other => return Err(Error::ProtocolViolation(format!("mismatched shutdown confirmation: {:?}", other))),
    }

    log::info!("Haifa Port: Exiting...");
    stats.finish()?;
    Ok(report)
}

/// Serves the canal until every vessel returned and every outbound passage was confirmed.
fn read_returning_vessels(reader: &mut LinkReader, context: &OriginContext) -> Result<Vec<VesselId>> {
    let mut returned: Vec<VesselId> = Vec::with_capacity(context.vessel_count);
    let mut passages = 0;

    while returned.len() < context.vessel_count || passages < context.vessel_count {
        match reader.receive()? {
            CanalMessage::VesselToken { vessel, direction: Direction::Inbound } => {
                if returned.contains(&vessel) {
                    return Err(Error::ProtocolViolation(format!("vessel {} returned twice", vessel)));
                }
                context.return_signal(vessel)?.release()?;
                returned.push(vessel);
            }
            CanalMessage::GateRelease { direction: Direction::Outbound, vessel } => {
                context.gate.leave(Direction::Outbound)?;
                log::debug!("Haifa Port: vessel {} cleared the canal", vessel);
                passages += 1;
            }
            other => return Err(Error::ProtocolViolation(format!("Haifa Port cannot handle {:?} while vessels are sailing", other))),
        }
    }

    Ok(returned)
}
