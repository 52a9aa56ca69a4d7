use std::collections::HashSet;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;

use suez_canal::domain::canal::codec::WireFormat;
use suez_canal::domain::config::{FatalPolicy, PassageRule, SimulationSettings};
use suez_canal::domain::simulator::simulator::Simulator;
use suez_canal::domain::utils::id::VesselId;
use suez_canal::{DestinationReport, OriginReport, run_destination_port, run_origin_port};

fn settings(crane_count: Option<usize>, passage_rule: PassageRule, wire_format: WireFormat) -> SimulationSettings {
    SimulationSettings {
        min_sleep_ms: 0,
        max_sleep_ms: 2,
        seed: Some(11),
        crane_count,
        passage_rule,
        wire_format,
        fatal_policy: FatalPolicy::Report,
        ..SimulationSettings::default()
    }
}

/// Runs both ports in this process, connected by a socket pair.
fn run_canal(vessels: usize, settings: SimulationSettings) -> (OriginReport, DestinationReport) {
    let (origin_end, destination_end) = UnixStream::pair().unwrap();
    let origin_reader = origin_end.try_clone().unwrap();
    let destination_reader = destination_end.try_clone().unwrap();

    let destination_settings = settings.clone();
    let destination = thread::spawn(move || {
        let simulator = Arc::new(Simulator::new(&destination_settings));
        run_destination_port(destination_reader, destination_end, &destination_settings, simulator)
    });

    let origin = run_origin_port(vessels, origin_reader, origin_end, &settings, Arc::new(Simulator::new(&settings))).unwrap();
    let destination = destination.join().unwrap().unwrap();
    (origin, destination)
}

fn assert_complete_run(vessels: usize, origin: &OriginReport, destination: &DestinationReport) {
    assert!(origin.approved && destination.approved);
    assert!(origin.failed_workers.is_empty(), "{:?}", origin.failed_workers);
    assert!(destination.failed_workers.is_empty(), "{:?}", destination.failed_workers);

    let expected: HashSet<VesselId> = (1..=vessels).map(VesselId::new).collect();
    let returned: HashSet<VesselId> = origin.returned.iter().copied().collect();
    assert_eq!(origin.returned.len(), vessels);
    assert_eq!(returned, expected);

    let crane_count = destination.crane_count;
    assert_eq!(vessels % crane_count, 0);
    assert_eq!(destination.batches.len(), vessels / crane_count);
    assert!(destination.batches.iter().all(|batch| batch.len() == crane_count));

    let released: HashSet<VesselId> = destination.batches.iter().flatten().copied().collect();
    assert_eq!(released, expected);

    assert_eq!(destination.crane_loads.len(), crane_count);
    assert_eq!(destination.crane_loads.iter().sum::<usize>(), vessels);

    assert_eq!(origin.canal_peak_occupancy, 1);
    assert_eq!(destination.canal_peak_occupancy, 1);
}

#[test]
fn test_four_vessels_two_cranes() {
    let (origin, destination) = run_canal(4, settings(Some(2), PassageRule::Unrestricted, WireFormat::Binary));

    assert_complete_run(4, &origin, &destination);
    assert_eq!(destination.crane_count, 2);
    assert_eq!(destination.batches.len(), 2);
    assert_eq!(destination.crane_loads, vec![2, 2]);
}

#[test]
fn test_prime_vessel_count_is_approved() {
    let (origin, destination) = run_canal(7, settings(None, PassageRule::Prime, WireFormat::Binary));

    assert_complete_run(7, &origin, &destination);
    assert!([1, 7].contains(&destination.crane_count));
}

#[test]
fn test_composite_vessel_count_is_denied() {
    let (origin, destination) = run_canal(8, settings(Some(2), PassageRule::Prime, WireFormat::Binary));

    assert!(!origin.approved);
    assert!(!destination.approved);
    assert!(origin.returned.is_empty());
    assert!(destination.batches.is_empty());
    assert!(destination.crane_loads.is_empty());
    assert_eq!(destination.crane_count, 0);
}

#[test]
fn test_crane_count_not_dividing_vessel_count_is_denied() {
    let (origin, destination) = run_canal(7, settings(Some(2), PassageRule::Prime, WireFormat::Binary));

    assert!(!origin.approved);
    assert!(!destination.approved);
    assert!(origin.returned.is_empty());
    assert_eq!(destination.crane_count, 0);
    assert_eq!(origin.canal_peak_occupancy, 0);
}

#[test]
fn test_fixed_frame_wire_format() {
    let (origin, destination) = run_canal(6, settings(Some(3), PassageRule::Unrestricted, WireFormat::FixedFrame));

    assert_complete_run(6, &origin, &destination);
    assert_eq!(destination.crane_loads, vec![2, 2, 2]);
}

#[test]
fn test_random_crane_count_divides_vessel_count() {
    let (origin, destination) = run_canal(12, settings(None, PassageRule::Unrestricted, WireFormat::Binary));

    assert_complete_run(12, &origin, &destination);
    assert!([2, 3, 4, 6].contains(&destination.crane_count));
}

#[test]
fn test_large_fleet() {
    let (origin, destination) = run_canal(30, settings(Some(5), PassageRule::Unrestricted, WireFormat::Binary));

    assert_complete_run(30, &origin, &destination);
    assert_eq!(destination.crane_loads, vec![6; 5]);
}

#[test]
fn test_out_of_range_vessel_count_is_rejected_before_handshake() {
    let (origin_end, _destination_end) = UnixStream::pair().unwrap();
    let reader = origin_end.try_clone().unwrap();
    let settings = settings(None, PassageRule::Prime, WireFormat::Binary);

    assert!(run_origin_port(51, reader, origin_end, &settings, Arc::new(Simulator::new(&settings))).is_err());
}
