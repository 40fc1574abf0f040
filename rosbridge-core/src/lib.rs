//! Platform-agnostic topic bridge between firmware and a ROS ground station.
//!
//! This crate moves [`rosbridge_proto`] envelopes over a physical link and
//! routes them to typed callbacks. It has no platform dependencies and runs
//! the same on a microcontroller and on the host.
//!
//! # Overview
//!
//! - [`transport`]: the [`Transport`] trait and [`LinkHandler`] callbacks
//! - [`serial`]: byte-stream transport ([`StreamTransport`]) over a [`SerialPort`]
//! - [`datagram`]: packet transport ([`DatagramTransport`]) over a [`DatagramSocket`]
//! - [`framing`], [`liveness`], [`rate_limit`]: the building blocks of a transport
//! - [`registry`]: `(topic, wire type)` to callback table ([`TopicRegistry`])
//! - [`bridge`]: dispatch and publishing ([`RosBridge`])
//! - [`config`]: [`LinkConfig`] and [`BridgeConfig`]
//!
//! # Control loop
//!
//! Everything is driven by one cooperative tick. The caller reads a
//! monotonic microsecond clock and calls [`RosBridge::update`]; callbacks run
//! inside that call. Nothing blocks and nothing reads a clock on its own.
//!
//! ```text
//! loop {
//!     bridge.update(now_us(), &mut app);
//!     bridge.publish_f64("alt", app.altitude)?;
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: `std::net::UdpSocket` as a [`DatagramSocket`]
//! - **`defmt`**: log and format through defmt (embedded)
//! - **`log`**: log through the `log` facade (host)
//! - **`embedded-io`**: [`IoPort`] adapter for embedded-io UARTs

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod logging;

pub mod bridge;
pub mod config;
pub mod datagram;
pub mod framing;
pub mod liveness;
pub mod rate_limit;
pub mod registry;
pub mod serial;
pub mod transport;

// Re-export main types at crate root
pub use bridge::{BridgeError, BridgeStats, PublishError, RosBridge};
pub use config::{BridgeConfig, ConfigError, LinkConfig};
pub use datagram::{DatagramSocket, DatagramTransport, MAX_DATAGRAM_LEN};
pub use framing::{FeedResult, FrameAccumulator, MAX_FRAME_LEN};
pub use liveness::{LinkEvent, LinkState, LivenessMonitor};
pub use rate_limit::{OutgoingBuffer, OUTGOING_BUFFER_LEN};
pub use registry::{Handler, SubscribeError, TopicRegistry, DEFAULT_MAX_SUBSCRIPTIONS};
#[cfg(feature = "embedded-io")]
pub use serial::IoPort;
pub use serial::{SerialPort, StreamTransport};
pub use transport::{LinkError, LinkHandler, Transport, TransportStats};

pub use rosbridge_proto::{NameLengthDigits, Value, WireType};
