//! Byte-stream transport for UART-like links.
//!
//! Each [`update`](Transport::update) tick does three things in order:
//!
//! 1. Check the liveness timeout
//! 2. Drain every readable byte through the frame accumulator
//! 3. Flush at most one rate-limited chunk
//!
//! Every received byte counts as activity, whether or not it completes a
//! frame.

use crate::config::{ConfigError, LinkConfig};
use crate::framing::{FeedResult, FrameAccumulator};
use crate::liveness::{LinkState, LivenessMonitor};
use crate::rate_limit::OutgoingBuffer;
use crate::transport::{add, bump, LinkError, LinkHandler, Transport, TransportStats};

/// A non-blocking byte port.
pub trait SerialPort {
    /// Read one byte if one is available right now.
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
}

pub struct StreamTransport<P> {
    port: P,
    config: LinkConfig,
    framer: FrameAccumulator,
    liveness: LivenessMonitor,
    outgoing: OutgoingBuffer,
    stats: TransportStats,
}

impl<P: SerialPort> StreamTransport<P> {
    /// Wrap a port. Fails if `config` does not [`validate`](LinkConfig::validate).
    pub fn new(port: P, config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            port,
            config,
            framer: FrameAccumulator::new(config.delimiter),
            liveness: LivenessMonitor::new(config.liveness_timeout_us),
            outgoing: OutgoingBuffer::new(&config),
            stats: TransportStats::default(),
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Bytes queued but not yet written.
    pub fn pending_outgoing(&self) -> usize {
        self.outgoing.len()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    fn drain<H: LinkHandler>(&mut self, now_us: u64, handler: &mut H) {
        loop {
            let byte = match self.port.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => break,
                Err(e) => {
                    bump(&mut self.stats.link_errors);
                    warn!("serial read failed: {:?}", e);
                    break;
                }
            };
            bump(&mut self.stats.bytes_received);

            if let Some(event) = self.liveness.record_activity(now_us) {
                info!("link up");
                handler.on_link_event(event);
            }

            match self.framer.push(byte) {
                FeedResult::Consumed => {}
                FeedResult::Frame(frame) => {
                    bump(&mut self.stats.frames_received);
                    handler.on_frame(frame);
                }
                FeedResult::Overflowed => {
                    bump(&mut self.stats.frames_dropped);
                    warn!("inbound frame exceeded buffer, dropped");
                }
            }
        }
    }

    fn flush(&mut self, now_us: u64) {
        let Some(chunk) = self.outgoing.ready_chunk(now_us) else {
            return;
        };
        let n = chunk.len();
        match self.port.write(chunk) {
            Ok(()) => add(&mut self.stats.bytes_sent, n),
            Err(e) => {
                bump(&mut self.stats.link_errors);
                warn!("serial write of {} bytes failed: {:?}", n, e);
            }
        }
        // Written or not, the chunk is gone.
        self.outgoing.consume(n, now_us);
    }
}

impl<P: SerialPort> Transport for StreamTransport<P> {
    fn init(&mut self) {
        self.framer.reset();
        self.liveness.reset();
        self.outgoing.reset();
        debug!(
            "stream transport: delimiter {}, timeout {} us",
            self.config.delimiter,
            self.config.liveness_timeout_us
        );
    }

    fn update<H: LinkHandler>(&mut self, now_us: u64, handler: &mut H) {
        if let Some(event) = self.liveness.check_timeout(now_us) {
            warn!("link lost");
            handler.on_link_event(event);
        }
        self.drain(now_us, handler);
        self.flush(now_us);
    }

    fn send(&mut self, flag: u8, payload: &[u8]) {
        let delimiter = [self.config.delimiter];
        if let Err(full) = self.outgoing.enqueue(&[&[flag], payload, &delimiter]) {
            bump(&mut self.stats.messages_dropped);
            warn!(
                "outgoing buffer full: dropped {} bytes ({} free)",
                full.needed,
                full.available
            );
        }
    }

    fn link_state(&self) -> LinkState {
        self.liveness.state()
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}

/// [`SerialPort`] over any `embedded-io` port that can report readiness.
///
/// Reads only when [`ReadReady`](embedded_io::ReadReady) says a byte is
/// waiting, so a tick never blocks on an idle line.
#[cfg(feature = "embedded-io")]
pub struct IoPort<T>(pub T);

#[cfg(feature = "embedded-io")]
impl<T> SerialPort for IoPort<T>
where
    T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        if !self.0.read_ready().map_err(|_| LinkError::Io)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.0.read(&mut byte) {
            Ok(0) => Err(LinkError::Closed),
            Ok(_) => Ok(Some(byte[0])),
            Err(_) => Err(LinkError::Io),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.0.write_all(bytes).map_err(|_| LinkError::Io)
    }
}
