use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::canal::gate::Direction;
use crate::domain::utils::id::VesselId;

/// The two cooperating processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortSide {
    Origin,
    Destination,
}

impl fmt::Display for PortSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSide::Origin => write!(f, "Haifa Port"),
            PortSide::Destination => write!(f, "Eilat Port"),
        }
    }
}

/// The messages the two ports exchange over the canal link.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanalMessage {
    /// Origin asks for passage of `vessel_count` vessels.
    RequestPassage { vessel_count: usize },
    /// Destination answers; the run aborts when `denied` is set.
    PassageResult { denied: bool },
    /// A vessel left the canal at the far end of `direction`.
    /// Outbound tokens are departures, inbound tokens are returns.
    VesselToken { vessel: VesselId, direction: Direction },
    /// The peer saw `vessel` clear the lane, so its owner may let the next one in.
    GateRelease { direction: Direction, vessel: VesselId },
    /// `port` has no more work running.
    ShutdownSignal { port: PortSide, done: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    RequestPassage,
    PassageResult,
    VesselToken,
    GateRelease,
    ShutdownSignal,
}

impl CanalMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            CanalMessage::RequestPassage { .. } => MessageKind::RequestPassage,
            CanalMessage::PassageResult { .. } => MessageKind::PassageResult,
            CanalMessage::VesselToken { .. } => MessageKind::VesselToken,
            CanalMessage::GateRelease { .. } => MessageKind::GateRelease,
            CanalMessage::ShutdownSignal { .. } => MessageKind::ShutdownSignal,
        }
    }

    pub fn departure(vessel: VesselId) -> Self {
        CanalMessage::VesselToken { vessel, direction: Direction::Outbound }
    }

    pub fn returning(vessel: VesselId) -> Self {
        CanalMessage::VesselToken { vessel, direction: Direction::Inbound }
    }

    pub fn done(port: PortSide) -> Self {
        CanalMessage::ShutdownSignal { port, done: true }
    }
}
