use bytes::BytesMut;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::codec::{Decoder, Encoder};

use crate::domain::canal::codec::{PortCodec, WireFormat};
use crate::domain::canal::protocol::{CanalMessage, MessageKind};
use crate::error::{Error, Result};

const READ_CHUNK: usize = 512;

/// Opens both directions of the canal link over a pipe pair.
///
/// The reader stays with the port's main thread; the writer is cloned into
/// every worker that has to talk to the peer port.
pub fn open_link<R, W>(reader: R, writer: W, format: WireFormat) -> (LinkReader, LinkWriter)
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    (LinkReader::new(reader, format), LinkWriter::new(writer, format))
}

/// Read half of the canal link.
pub struct LinkReader {
    source: Box<dyn Read + Send>,
    codec: PortCodec,
    buffer: BytesMut,
}

impl LinkReader {
    pub fn new<R: Read + Send + 'static>(source: R, format: WireFormat) -> Self {
        Self { source: Box::new(source), codec: PortCodec::from(format), buffer: BytesMut::with_capacity(READ_CHUNK) }
    }

    /// Blocks until one complete message has been read from the peer.
    pub fn receive(&mut self) -> Result<CanalMessage> {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(message) = self.codec.decode(&mut self.buffer)? {
                log::trace!("Canal link received {:?}", message);
                return Ok(message);
            }

            let read = match self.source.read(&mut chunk) {
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::IoError(e)),
            };

            if read == 0 {
                return Err(Error::LinkClosed);
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    /// Receives the next message and rejects anything but `kind`.
    pub fn expect(&mut self, kind: MessageKind) -> Result<CanalMessage> {
        let message = self.receive()?;
        if message.kind() != kind {
            return Err(Error::ProtocolViolation(format!("expected {:?}, received {:?}", kind, message)));
        }
        Ok(message)
    }
}

struct WriterState {
    sink: Box<dyn Write + Send>,
    codec: PortCodec,
    buffer: BytesMut,
}

/// Write half of the canal link. Clones share one pipe; each message is
/// written and flushed as a whole.
#[derive(Clone)]
pub struct LinkWriter {
    state: Arc<Mutex<WriterState>>,
}

impl LinkWriter {
    pub fn new<W: Write + Send + 'static>(sink: W, format: WireFormat) -> Self {
        let state = WriterState { sink: Box::new(sink), codec: PortCodec::from(format), buffer: BytesMut::new() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn send(&self, message: CanalMessage) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let WriterState { sink, codec, buffer } = &mut *state;

        buffer.clear();
        codec.encode(message, buffer)?;
        sink.write_all(buffer)?;
        sink.flush()?;

        log::trace!("Canal link sent {:?}", message);
        Ok(())
    }
}
