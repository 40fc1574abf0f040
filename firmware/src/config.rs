//! Board wiring, link settings and topic names.

use rosbridge_core::{BridgeConfig, LinkConfig};

/// Name the ground station knows this blimp by.
pub const BLIMP_ID: &str = "blimp-01";

/// UART1 on GPIO 8 (TX) / GPIO 9 (RX).
pub const UART_BAUDRATE: u32 = 115_200;

/// Ring buffer sizes for the buffered UART.
pub const UART_TX_BUF_LEN: usize = 1024;
pub const UART_RX_BUF_LEN: usize = 1024;

/// Bridge tick period.
pub const TICK_INTERVAL_MS: u64 = 5;

/// Telemetry periods.
pub const IDENTIFY_INTERVAL_MS: u64 = 1_000;
pub const STATE_INTERVAL_MS: u64 = 200;
pub const DEBUG_INTERVAL_MS: u64 = 200;

/// Link to the ground station: `\n` frames, 2 s liveness, 64 B x 100/s.
pub const LINK: LinkConfig = LinkConfig::new();

pub const BRIDGE: BridgeConfig = BridgeConfig::new();

// Subscriptions
pub const TOPIC_MOTORS: &str = "motors";
pub const TOPIC_AUTO: &str = "auto";

// Publications
pub const TOPIC_IDENTIFY: &str = "/identify";
pub const TOPIC_STATE: &str = "state";
pub const TOPIC_DEBUG: &str = "debug";
