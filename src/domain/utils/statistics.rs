use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::error::Result;

/// Each event consists of a set of key-value-pairs describing what happened in a port.
/// This enum specifies all allowed keys and thus the columns of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatParameter {
    /// Milliseconds since the collector was started.
    Time,

    /// "Haifa Port" or "Eilat Port"
    Port,

    /// "Vessel", "Crane", "Quay" or "Port"
    Component,

    ComponentId,

    VesselId,

    /// What happened, e.g. "EnteredBarrier"
    Event,

    /// Tons, only set for cargo events
    CargoWeight,

    /// Sequence number of the quay batch, only set for quay events
    Batch,
}

impl StatParameter {
    const ALL: [StatParameter; 8] = [
        StatParameter::Time,
        StatParameter::Port,
        StatParameter::Component,
        StatParameter::ComponentId,
        StatParameter::VesselId,
        StatParameter::Event,
        StatParameter::CargoWeight,
        StatParameter::Batch,
    ];

    /// Returns the defined order of columns for the CSV header
    pub fn headers() -> Vec<&'static str> {
        Self::ALL.iter().map(|param| param.header()).collect()
    }

    fn header(&self) -> &'static str {
        match self {
            StatParameter::Time => "Time",
            StatParameter::Port => "Port",
            StatParameter::Component => "Component",
            StatParameter::ComponentId => "ComponentId",
            StatParameter::VesselId => "VesselId",
            StatParameter::Event => "Event",
            StatParameter::CargoWeight => "CargoWeight",
            StatParameter::Batch => "Batch",
        }
    }
}

/// store values in their native format, only format them when writing to the CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Text(String),
}

impl From<usize> for StatValue {
    fn from(v: usize) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<u32> for StatValue {
    fn from(v: u32) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Integer(i) => write!(f, "{}", i),
            StatValue::Text(t) => write!(f, "{}", t),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticEvent {
    data: HashMap<StatParameter, StatValue>,
}

impl StatisticEvent {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    /// Event raised by a single worker, e.g. `("Crane", 2, "Unloaded")`.
    pub fn of_component(component: &str, component_id: usize, event: &str) -> Self {
        let mut stat = Self::new();
        stat.set(StatParameter::Component, component).set(StatParameter::ComponentId, component_id).set(StatParameter::Event, event);
        stat
    }

    pub fn set<V: Into<StatValue>>(&mut self, param: StatParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: StatParameter) -> Option<&StatValue> {
        self.data.get(&param)
    }

    fn to_row(&self) -> Vec<String> {
        StatParameter::ALL
            .iter()
            .map(|param| match self.data.get(param) {
                Some(value) => value.to_string(),
                None => "NA".to_string(),
            })
            .collect()
    }
}

/// Messages sent from the port workers to the writer thread.
enum StatsMessage {
    Log(StatisticEvent),
    Shutdown,
}

/// Handle every worker of a port uses to record events.
///
/// Recording never blocks on I/O: rows are written by a background thread,
/// into `statistics_file` when one is configured and nowhere otherwise.
/// Standard output is never used, it carries the canal link.
pub struct StatsCollector {
    sender: mpsc::Sender<StatsMessage>,
    writer: Mutex<Option<JoinHandle<Result<()>>>>,
    start_time: Instant,
}

impl StatsCollector {
    pub fn init(filename: Option<&str>) -> Result<Self> {
        let sink: Box<dyn Write + Send> = match filename {
            Some(f) => Box::new(File::create(f)?),
            None => Box::new(io::sink()),
        };
        Ok(Self::with_writer(sink))
    }

    pub fn with_writer(sink: Box<dyn Write + Send>) -> Self {
        let (tx, rx) = mpsc::channel();

        let writer = thread::Builder::new().name("Statistics".to_string()).spawn(move || Self::worker_loop(rx, sink));

        let writer = match writer {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Statistics writer thread could not be started, events will be dropped: {}", e);
                None
            }
        };

        StatsCollector { sender: tx, writer: Mutex::new(writer), start_time: Instant::now() }
    }

    /// The logic running in the background thread.
    fn worker_loop(rx: mpsc::Receiver<StatsMessage>, sink: Box<dyn Write + Send>) -> Result<()> {
        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(sink);
        csv_wtr.write_record(StatParameter::headers())?;

        for msg in rx {
            match msg {
                StatsMessage::Log(event) => {
                    if let Err(e) = csv_wtr.write_record(event.to_row()) {
                        log::error!("Stats Error: Failed to write record: {}", e);
                    }
                }
                StatsMessage::Shutdown => break,
            }
        }

        csv_wtr.flush()?;
        Ok(())
    }

    /// Public API to log an event.
    pub fn add_event(&self, mut event: StatisticEvent) {
        if event.get(StatParameter::Time).is_none() {
            let elapsed = self.start_time.elapsed().as_millis() as i64;
            event.set(StatParameter::Time, elapsed);
        }

        // A dead writer thread must not take the simulation down with it.
        let _ = self.sender.send(StatsMessage::Log(event));
    }

    /// Flushes all recorded events and stops the writer thread.
    pub fn finish(&self) -> Result<()> {
        let _ = self.sender.send(StatsMessage::Shutdown);

        let handle = self.writer.lock().unwrap_or_else(PoisonError::into_inner).take();
        match handle {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(crate::error::Error::WorkerPanicked("Statistics".to_string())),
            },
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_events_become_csv_rows_in_header_order() {
        let sink = SharedSink::default();
        let collector = StatsCollector::with_writer(Box::new(sink.clone()));

        let mut event = StatisticEvent::new();
        event.set(StatParameter::Time, 12i64).set(StatParameter::Port, "Eilat Port").set(StatParameter::Component, "Crane");
        event.set(StatParameter::ComponentId, 2usize).set(StatParameter::VesselId, 5usize).set(StatParameter::Event, "Unloaded");
        event.set(StatParameter::CargoWeight, 17u32);
        collector.add_event(event);
        collector.finish().unwrap();

        let output = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Time;Port;Component;ComponentId;VesselId;Event;CargoWeight;Batch");
        assert_eq!(lines[1], "12;Eilat Port;Crane;2;5;Unloaded;17;NA");
    }

    #[test]
    fn test_missing_time_is_stamped() {
        let mut event = StatisticEvent::new();
        event.set(StatParameter::Event, "Departed");
        let collector = StatsCollector::with_writer(Box::new(io::sink()));
        collector.add_event(event);
        assert!(collector.finish().is_ok());
        assert!(collector.finish().is_ok());
    }
}
