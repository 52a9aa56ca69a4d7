use std::io;
use std::sync::Arc;
use std::thread;

use suez_canal::domain::canal::codec::WireFormat;
use suez_canal::domain::canal::link::LinkWriter;
use suez_canal::domain::config::{FatalPolicy, RunConfig};
use suez_canal::domain::port::context::DestinationContext;
use suez_canal::domain::quay::coordinator::run_quay_coordinator;
use suez_canal::domain::quay::crane::run_crane;
use suez_canal::domain::simulator::simulator_mock::MockSimulator;
use suez_canal::domain::utils::id::{CraneId, VesselId};
use suez_canal::domain::utils::statistics::StatsCollector;
use suez_canal::domain::vessel::destination_vessel::VesselState;

/// Runs the quay of a Destination Port with vessels arriving at the barrier in `arrival_order`.
/// Returns the released batches and the loads of the cranes.
fn run_quay(arrival_order: &[usize], crane_count: usize) -> (Vec<Vec<VesselId>>, Vec<usize>) {
    let run = RunConfig::new(arrival_order.len(), crane_count).unwrap();
    let link = LinkWriter::new(io::sink(), WireFormat::Binary);
    let stats = Arc::new(StatsCollector::with_writer(Box::new(io::sink())));
    let (context, crane_signals) = DestinationContext::new(run, Arc::new(MockSimulator::new(12)), link, stats, FatalPolicy::Report);
    let context = Arc::new(context);

    let cranes: Vec<_> = crane_signals
        .into_iter()
        .enumerate()
        .map(|(index, signals)| {
            let context = context.clone();
            thread::spawn(move || run_crane(CraneId::from_index(index), signals, &context).unwrap())
        })
        .collect();

    let quay = {
        let context = context.clone();
        thread::spawn(move || run_quay_coordinator(&context).unwrap())
    };

    for id in arrival_order {
        context.barrier.arrive(VesselId::new(*id)).unwrap();
    }
    context.barrier.seal();

    let vessels: Vec<_> = arrival_order
        .iter()
        .map(|id| {
            let context = context.clone();
            let vessel = VesselId::new(*id);
            thread::spawn(move || {
                let mut state = VesselState::Queued;
                while state != VesselState::InInboundCanal {
                    state = state.advance(vessel, &context).unwrap();
                }
            })
        })
        .collect();

    for vessel in vessels {
        vessel.join().unwrap();
    }

    let batches = quay.join().unwrap();
    context.retire_cranes();
    let loads = cranes.into_iter().map(|crane| crane.join().unwrap()).collect();

    assert!(context.barrier.is_drained());
    assert!(context.allocator.is_vacated());
    (batches, loads)
}

fn vessels(ids: &[usize]) -> Vec<VesselId> {
    ids.iter().map(|id| VesselId::new(*id)).collect()
}

#[test]
fn test_batches_follow_arrival_order() {
    let (batches, loads) = run_quay(&[5, 2, 6, 1, 4, 3], 2);

    assert_eq!(batches, vec![vessels(&[5, 2]), vessels(&[6, 1]), vessels(&[4, 3])]);
    assert_eq!(loads, vec![3, 3]);
}

#[test]
fn test_single_crane_serves_every_vessel() {
    let (batches, loads) = run_quay(&[3, 1, 2], 1);

    assert_eq!(batches, vec![vessels(&[3]), vessels(&[1]), vessels(&[2])]);
    assert_eq!(loads, vec![3]);
}

#[test]
fn test_whole_fleet_in_one_batch() {
    let (batches, loads) = run_quay(&[1, 2, 3, 4, 5], 5);

    assert_eq!(batches, vec![vessels(&[1, 2, 3, 4, 5])]);
    assert_eq!(loads, vec![1; 5]);
}
