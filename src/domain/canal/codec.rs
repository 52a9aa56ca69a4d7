use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::domain::canal::gate::Direction;
use crate::domain::canal::protocol::{CanalMessage, PortSide};
use crate::domain::utils::id::VesselId;
use crate::error::{Error, Result};

/// Size of every frame on the fixed-frame wire.
pub const FRAME_SIZE: usize = 60;

/// Framing used on the two pipes between the ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    #[default]
    Binary,
    FixedFrame,
}

/// Combines LengthDelimitedCodec (pipe framing) with Bincode (Serialization).
pub struct BinaryCodec {
    codec: LengthDelimitedCodec,
}

impl BinaryCodec {
    pub fn new() -> Self {
        Self { codec: LengthDelimitedCodec::new() }
    }
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<CanalMessage> for BinaryCodec {
    type Error = Error;

    fn encode(&mut self, item: CanalMessage, dst: &mut BytesMut) -> Result<()> {
        let bytes = bincode::serialize(&item).map_err(|e| Error::CodecError(e.to_string()))?;

        let bytes = bytes::Bytes::from(bytes);
        self.codec.encode(bytes, dst)?;
        Ok(())
    }
}

impl Decoder for BinaryCodec {
    type Item = CanalMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.codec.decode(src)? {
            Some(bytes) => {
                let item = bincode::deserialize(&bytes).map_err(|e| Error::CodecError(e.to_string()))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

/// Fixed 60-byte frames holding three ASCII-decimal integers
/// (`<tag> <value> <extra>`), NUL padded.
#[derive(Debug, Default)]
pub struct FixedFrameCodec;

const TAG_REQUEST_PASSAGE: u64 = 1;
const TAG_PASSAGE_RESULT: u64 = 2;
const TAG_VESSEL_TOKEN: u64 = 3;
const TAG_GATE_RELEASE: u64 = 4;
const TAG_SHUTDOWN_SIGNAL: u64 = 5;

fn direction_code(direction: Direction) -> u64 {
    match direction {
        Direction::Outbound => 0,
        Direction::Inbound => 1,
    }
}

fn direction_from_code(code: u64) -> Result<Direction> {
    match code {
        0 => Ok(Direction::Outbound),
        1 => Ok(Direction::Inbound),
        other => Err(Error::CodecError(format!("unknown direction code {}", other))),
    }
}

fn port_code(port: PortSide) -> u64 {
    match port {
        PortSide::Origin => 0,
        PortSide::Destination => 1,
    }
}

fn port_from_code(code: u64) -> Result<PortSide> {
    match code {
        0 => Ok(PortSide::Origin),
        1 => Ok(PortSide::Destination),
        other => Err(Error::CodecError(format!("unknown port code {}", other))),
    }
}

fn vessel_from_value(value: u64) -> Result<VesselId> {
    if value == 0 {
        return Err(Error::CodecError("vessel ids start at 1".to_string()));
    }
    Ok(VesselId::new(value as usize))
}

impl Encoder<CanalMessage> for FixedFrameCodec {
    type Error = Error;

    fn encode(&mut self, item: CanalMessage, dst: &mut BytesMut) -> Result<()> {
        let (tag, value, extra) = match item {
            CanalMessage::RequestPassage { vessel_count } => (TAG_REQUEST_PASSAGE, vessel_count as u64, 0),
            CanalMessage::PassageResult { denied } => (TAG_PASSAGE_RESULT, denied as u64, 0),
            CanalMessage::VesselToken { vessel, direction } => (TAG_VESSEL_TOKEN, vessel.id as u64, direction_code(direction)),
            CanalMessage::GateRelease { direction, vessel } => (TAG_GATE_RELEASE, vessel.id as u64, direction_code(direction)),
            CanalMessage::ShutdownSignal { port, done } => (TAG_SHUTDOWN_SIGNAL, done as u64, port_code(port)),
        };

        let text = format!("{} {} {}", tag, value, extra);
        if text.len() > FRAME_SIZE {
            return Err(Error::CodecError(format!("frame '{}' exceeds {} bytes", text, FRAME_SIZE)));
        }

        dst.reserve(FRAME_SIZE);
        dst.put_slice(text.as_bytes());
        dst.put_bytes(0, FRAME_SIZE - text.len());
        Ok(())
    }
}

impl Decoder for FixedFrameCodec {
    type Item = CanalMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < FRAME_SIZE {
            return Ok(None);
        }

        let frame = src.split_to(FRAME_SIZE);
        let text = std::str::from_utf8(&frame).map_err(|e| Error::CodecError(e.to_string()))?;
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());

        let fields = text
            .split_whitespace()
            .map(|field| field.parse::<u64>().map_err(|e| Error::CodecError(format!("'{}' in frame '{}': {}", field, text, e))))
            .collect::<Result<Vec<u64>>>()?;

        let &[tag, value, extra] = fields.as_slice() else {
            return Err(Error::CodecError(format!("expected three fields in frame '{}'", text)));
        };

        let message = match tag {
            TAG_REQUEST_PASSAGE => CanalMessage::RequestPassage { vessel_count: value as usize },
            TAG_PASSAGE_RESULT => CanalMessage::PassageResult { denied: value != 0 },
            TAG_VESSEL_TOKEN => CanalMessage::VesselToken { vessel: vessel_from_value(value)?, direction: direction_from_code(extra)? },
            TAG_GATE_RELEASE => CanalMessage::GateRelease { direction: direction_from_code(extra)?, vessel: vessel_from_value(value)? },
            TAG_SHUTDOWN_SIGNAL => CanalMessage::ShutdownSignal { port: port_from_code(extra)?, done: value != 0 },
            other => return Err(Error::CodecError(format!("unknown frame tag {}", other))),
        };

        Ok(Some(message))
    }
}

/// The codec selected by [`WireFormat`].
pub enum PortCodec {
    Binary(BinaryCodec),
    FixedFrame(FixedFrameCodec),
}

impl From<WireFormat> for PortCodec {
    fn from(format: WireFormat) -> Self {
        match format {
            WireFormat::Binary => PortCodec::Binary(BinaryCodec::new()),
            WireFormat::FixedFrame => PortCodec::FixedFrame(FixedFrameCodec),
        }
    }
}

impl Encoder<CanalMessage> for PortCodec {
    type Error = Error;

    fn encode(&mut self, item: CanalMessage, dst: &mut BytesMut) -> Result<()> {
        match self {
            PortCodec::Binary(codec) => codec.encode(item, dst),
            PortCodec::FixedFrame(codec) => codec.encode(item, dst),
        }
    }
}

impl Decoder for PortCodec {
    type Item = CanalMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self {
            PortCodec::Binary(codec) => codec.decode(src),
            PortCodec::FixedFrame(codec) => codec.decode(src),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_frame_is_sixty_bytes_of_ascii() {
        let mut codec = FixedFrameCodec;
        let mut buffer = BytesMut::new();
        codec.encode(CanalMessage::RequestPassage { vessel_count: 7 }, &mut buffer).unwrap();

        assert_eq!(buffer.len(), FRAME_SIZE);
        assert_eq!(&buffer[..5], b"1 7 0");
        assert!(buffer[5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_fixed_frame_waits_for_a_full_frame() {
        let mut codec = FixedFrameCodec;
        let mut buffer = BytesMut::new();
        codec.encode(CanalMessage::returning(VesselId::new(12)), &mut buffer).unwrap();

        let mut partial = buffer.split_to(FRAME_SIZE / 2);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.unsplit(buffer);
        assert_eq!(codec.decode(&mut partial).unwrap(), Some(CanalMessage::returning(VesselId::new(12))));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_fixed_frame_accepts_space_padding() {
        let mut codec = FixedFrameCodec;
        let mut buffer = BytesMut::new();
        buffer.put_slice(b"5 1 1");
        buffer.put_bytes(b' ', FRAME_SIZE - 5);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(CanalMessage::done(PortSide::Destination)));
    }

    #[test]
    fn test_fixed_frame_rejects_vessel_zero() {
        let mut codec = FixedFrameCodec;
        let mut buffer = BytesMut::new();
        buffer.put_slice(b"3 0 0");
        buffer.put_bytes(0, FRAME_SIZE - 5);

        assert!(matches!(codec.decode(&mut buffer), Err(Error::CodecError(_))));
    }

    #[test]
    fn test_binary_codec_decodes_back_to_back_frames() {
        let mut codec = BinaryCodec::new();
        let mut buffer = BytesMut::new();
        let sent = [
            CanalMessage::PassageResult { denied: false },
            CanalMessage::GateRelease { direction: Direction::Outbound, vessel: VesselId::new(3) },
        ];
        for message in sent {
            codec.encode(message, &mut buffer).unwrap();
        }

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(sent[0]));
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(sent[1]));
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }
}
