//! Message-oriented transport for UDP-like links.
//!
//! Each datagram carries exactly one frame, so no delimiter is written or
//! expected. Outbound messages wait in a bounded queue and all of them are
//! sent on the next update.

use heapless::{Deque, Vec};

use crate::config::{ConfigError, LinkConfig};
use crate::liveness::{LinkState, LivenessMonitor};
use crate::transport::{add, bump, LinkError, LinkHandler, Transport, TransportStats};

/// Largest datagram sent or received.
pub const MAX_DATAGRAM_LEN: usize = 512;

/// Outbound datagrams held between updates.
pub const DEFAULT_QUEUE_DEPTH: usize = 8;

/// A non-blocking, connected datagram socket.
pub trait DatagramSocket {
    /// Receive one datagram into `buf` if one is waiting.
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, LinkError>;

    /// Send `datagram` to the peer.
    fn send(&mut self, datagram: &[u8]) -> Result<(), LinkError>;
}

type Datagram = Vec<u8, MAX_DATAGRAM_LEN>;

pub struct DatagramTransport<S, const Q: usize = DEFAULT_QUEUE_DEPTH> {
    socket: S,
    liveness: LivenessMonitor,
    queue: Deque<Datagram, Q>,
    // One spare byte so an oversized datagram shows up as too long.
    rx_buf: [u8; MAX_DATAGRAM_LEN + 1],
    stats: TransportStats,
}

impl<S: DatagramSocket, const Q: usize> DatagramTransport<S, Q> {
    /// Wrap a socket. Only the liveness timeout of `config` applies.
    pub fn new(socket: S, config: LinkConfig) -> Result<Self, ConfigError> {
        if config.liveness_timeout_us == 0 {
            return Err(ConfigError::ZeroLivenessTimeout);
        }
        Ok(Self {
            socket,
            liveness: LivenessMonitor::new(config.liveness_timeout_us),
            queue: Deque::new(),
            rx_buf: [0; MAX_DATAGRAM_LEN + 1],
            stats: TransportStats::default(),
        })
    }

    /// Datagrams waiting to be sent.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    pub fn into_socket(self) -> S {
        self.socket
    }

    fn receive_all<H: LinkHandler>(&mut self, now_us: u64, handler: &mut H) {
        loop {
            let len = match self.socket.recv(&mut self.rx_buf) {
                Ok(Some(len)) => len.min(self.rx_buf.len()),
                Ok(None) => break,
                Err(e) => {
                    bump(&mut self.stats.link_errors);
                    warn!("datagram receive failed: {:?}", e);
                    break;
                }
            };
            add(&mut self.stats.bytes_received, len);
            if let Some(event) = self.liveness.record_activity(now_us) {
                info!("link up");
                handler.on_link_event(event);
            }
            if len > MAX_DATAGRAM_LEN {
                bump(&mut self.stats.frames_dropped);
                warn!("datagram longer than {} bytes dropped", MAX_DATAGRAM_LEN);
                continue;
            }
            bump(&mut self.stats.frames_received);
            handler.on_frame(&self.rx_buf[..len]);
        }
    }

    fn send_all(&mut self) {
        while let Some(datagram) = self.queue.pop_front() {
            match self.socket.send(&datagram) {
                Ok(()) => add(&mut self.stats.bytes_sent, datagram.len()),
                Err(e) => {
                    bump(&mut self.stats.link_errors);
                    warn!("datagram send failed: {:?}", e);
                }
            }
        }
    }
}

impl<S: DatagramSocket, const Q: usize> Transport for DatagramTransport<S, Q> {
    fn init(&mut self) {
        self.liveness.reset();
        self.queue.clear();
    }

    fn update<H: LinkHandler>(&mut self, now_us: u64, handler: &mut H) {
        if let Some(event) = self.liveness.check_timeout(now_us) {
            warn!("link lost");
            handler.on_link_event(event);
        }
        self.receive_all(now_us, handler);
        self.send_all();
    }

    fn send(&mut self, flag: u8, payload: &[u8]) {
        let mut datagram = Datagram::new();
        let built = datagram
            .push(flag)
            .ok()
            .and_then(|()| datagram.extend_from_slice(payload).ok());
        if built.is_none() {
            bump(&mut self.stats.messages_dropped);
            warn!("datagram of {} bytes exceeds {}", payload.len() + 1, MAX_DATAGRAM_LEN);
            return;
        }
        if self.queue.push_back(datagram).is_err() {
            bump(&mut self.stats.messages_dropped);
            warn!("datagram queue full, message dropped");
        }
    }

    fn link_state(&self) -> LinkState {
        self.liveness.state()
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}

/// `UdpSocket` must be `connect`ed and set non-blocking before use.
#[cfg(feature = "std")]
impl DatagramSocket for std::net::UdpSocket {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, LinkError> {
        match std::net::UdpSocket::recv(self, buf) {
            Ok(len) => Ok(Some(len)),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(_) => Err(LinkError::Io),
        }
    }

    fn send(&mut self, datagram: &[u8]) -> Result<(), LinkError> {
        std::net::UdpSocket::send(self, datagram)
            .map(|_| ())
            .map_err(|_| LinkError::Io)
    }
}
