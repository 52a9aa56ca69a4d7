use thiserror::Error;

use crate::domain::canal::gate::Direction;
use crate::domain::utils::id::VesselId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Canal link I/O failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse settings JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid run configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Barrier queue is full ({capacity} vessels), cannot enqueue vessel {vessel}")]
    BarrierOverflow { capacity: usize, vessel: VesselId },

    #[error("No free station in the unloading quay for vessel {0}")]
    QuayExhausted(VesselId),

    #[error("Canal gate '{0}' released without a matching entry")]
    GateNotHeld(Direction),

    #[error("Failed to signal {0}")]
    SignalFailed(String),

    #[error("Canal link closed by peer")]
    LinkClosed,

    #[error("Failed to encode or decode canal frame: {0}")]
    CodecError(String),

    #[error("Statistics export failed: {0}")]
    StatisticsError(#[from] csv::Error),

    #[error("Worker '{0}' panicked")]
    WorkerPanicked(String),
}

impl Error {
    /// Fatal errors break a protocol invariant or the canal link itself and
    /// end the whole port. The remaining ones only end the failing worker.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::SignalFailed(_) | Error::WorkerPanicked(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
