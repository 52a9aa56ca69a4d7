use std::collections::HashSet;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::domain::canal::gate::Direction;
use crate::domain::canal::link::{LinkReader, open_link};
use crate::domain::canal::protocol::{CanalMessage, MessageKind, PortSide};
use crate::domain::config::{RunConfig, SimulationSettings, validate_vessel_count};
use crate::domain::port::context::DestinationContext;
use crate::domain::port::handshake::{choose_crane_count, passage_denied};
use crate::domain::port::{WorkerHandle, join_worker, spawn_worker};
use crate::domain::quay::coordinator::run_quay_coordinator;
use crate::domain::quay::crane::run_crane;
use crate::domain::simulator::simulator::SystemSimulator;
use crate::domain::utils::id::{CraneId, VesselId};
use crate::domain::utils::statistics::StatsCollector;
use crate::domain::vessel::destination_vessel::run_destination_vessel;
use crate::error::{Error, Result};

/// Outcome of a run as seen by the Destination Port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
    pub approved: bool,
    pub vessel_count: usize,
    pub crane_count: usize,
    /// Batches released from the barrier into the quay, in release order.
    pub batches: Vec<Vec<VesselId>>,
    /// Number of vessels each crane unloaded, indexed by station.
    pub crane_loads: Vec<usize>,
    /// Highest occupancy of the inbound lane, which this port owns.
    pub canal_peak_occupancy: usize,
    pub failed_workers: Vec<String>,
}

impl DestinationReport {
    fn denied(vessel_count: usize) -> Self {
        DestinationReport {
            approved: false,
            vessel_count,
            crane_count: 0,
            batches: Vec::new(),
            crane_loads: Vec::new(),
            canal_peak_occupancy: 0,
            failed_workers: Vec::new(),
        }
    }
}

/// Runs the Destination Port over the given canal link. The run configuration comes from the handshake.
pub fn run_destination_port<R, W>(reader: R, writer: W, settings: &SimulationSettings, simulator: Arc<dyn SystemSimulator>) -> Result<DestinationReport>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let (mut reader, writer) = open_link(reader, writer, settings.wire_format);
    let stats = Arc::new(StatsCollector::init(settings.statistics_file_for(PortSide::Destination).as_deref())?);

    let CanalMessage::RequestPassage { vessel_count } = reader.expect(MessageKind::RequestPassage)? else {
        return Err(Error::ProtocolViolation("expected a passage request".to_string()));
    };

    let run = plan_run(vessel_count, settings, simulator.as_ref());
    log::info!("Eilat Port: passage for {} vessels {}!", vessel_count, if run.is_some() { "approved" } else { "denied" });
    writer.send(CanalMessage::PassageResult { denied: run.is_none() })?;

    let Some(run) = run else {
        stats.finish()?;
        return Ok(DestinationReport::denied(vessel_count));
    };

    log::info!("Eilat Port: {} cranes unload {} vessels in {} batches", run.crane_count(), run.vessel_count(), run.batch_count());

    let (context, crane_signals) = DestinationContext::new(run, simulator, writer.clone(), stats.clone(), settings.fatal_policy);
    let context = Arc::new(context);
    let policy = settings.fatal_policy;

    let mut cranes: Vec<(CraneId, WorkerHandle<usize>)> = Vec::with_capacity(run.crane_count());
    for (index, signals) in crane_signals.into_iter().enumerate() {
        let crane = CraneId::from_index(index);
        let context = context.clone();
        cranes.push((crane, spawn_worker(format!("Crane {}", crane), policy, move || run_crane(crane, signals, &context))?));
    }

    let quay = {
        let context = context.clone();
        spawn_worker("Unloading Quay".to_string(), policy, move || run_quay_coordinator(&context))?
    };

    let vessels = serve_arriving_vessels(&mut reader, &context)?;

    let mut report = DestinationReport { approved: true, vessel_count, crane_count: run.crane_count(), ..DestinationReport::denied(vessel_count) };

    for (vessel, handle) in vessels {
        join_worker(&format!("Vessel {}", vessel), handle, &mut report.failed_workers);
    }
    log::info!("Eilat Port: All Vessel Threads are done");
    report.canal_peak_occupancy = context.gate.peak_occupancy(Direction::Inbound);

    context.retire_cranes();
    for (crane, handle) in cranes {
        let load = join_worker(&format!("Crane {}", crane), handle, &mut report.failed_workers);
        report.crane_loads.push(load.unwrap_or(0));
    }
    log::info!("Eilat Port: All Crane Threads are done");

    if report.failed_workers.is_empty() {
        report.batches = join_worker("Unloading Quay", quay, &mut report.failed_workers).unwrap_or_default();
    } else {
        log::warn!("Eilat Port: Unloading Quay left waiting on an incomplete batch ({:?})", context.barrier.census());
    }

    log::info!("Eilat Port: Exiting...");
    writer.send(CanalMessage::done(PortSide::Destination))?;
    stats.finish()?;
    Ok(report)
}

/// Fixes the run configuration before the passage request is answered.
/// `None` means the request is denied, no worker will be started.
fn plan_run(vessel_count: usize, settings: &SimulationSettings, simulator: &dyn SystemSimulator) -> Option<RunConfig> {
    let run = validate_vessel_count(vessel_count)
        .and_then(|_| choose_crane_count(vessel_count, settings, simulator))
        .and_then(|cranes| RunConfig::new(vessel_count, cranes));

    match run {
        Ok(run) if !passage_denied(vessel_count, settings.passage_rule) => Some(run),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Eilat Port: {}", e);
            None
        }
    }
}

/// Spawns one vessel worker per departure token until the Origin Port reports that all vessels are done.
fn serve_arriving_vessels(reader: &mut LinkReader, context: &Arc<DestinationContext>) -> Result<Vec<(VesselId, WorkerHandle<()>)>> {
    let vessel_count = context.run.vessel_count();
    let mut announced: HashSet<VesselId> = HashSet::with_capacity(vessel_count);
    let mut vessels = Vec::with_capacity(vessel_count);

    loop {
        match reader.receive()? {
            CanalMessage::VesselToken { vessel, direction: Direction::Outbound } => {
                if vessel.id == 0 || vessel.id > vessel_count || !announced.insert(vessel) {
                    return Err(Error::ProtocolViolation(format!("unexpected departure token for vessel {}", vessel)));
                }

                let worker_context = context.clone();
                let handle =
                    spawn_worker(format!("Vessel {}", vessel), context.fatal_policy, move || run_destination_vessel(vessel, &worker_context))?;
                vessels.push((vessel, handle));

                if announced.len() == vessel_count {
                    context.barrier.seal();
                }
            }
            CanalMessage::GateRelease { direction: Direction::Inbound, vessel } => {
                context.gate.leave(Direction::Inbound)?;
                log::debug!("Eilat Port: vessel {} cleared the canal", vessel);
            }
            CanalMessage::ShutdownSignal { port: PortSide::Origin, done: true } => {
                if announced.len() != vessel_count {
                    return Err(Error::ProtocolViolation(format!(
                        "Haifa Port finished after {} of {} vessels",
                        announced.len(),
                        vessel_count
                    )));
                }
                return Ok(vessels);
            }
            other => return Err(Error::ProtocolViolation(format!("Eilat Port cannot handle {:?} while vessels are sailing", other))),
        }
    }
}
