//! Blimp flight controller ROS bridge for RP2040.
//!
//! Connects the on-board controller to a ROS ground station over UART using
//! the [`rosbridge_core`] text protocol. The board subscribes to motor and
//! mode commands and publishes its identity, state and debug text.

#![no_std]

// Re-export core types for convenience
pub use rosbridge_core::{
    BridgeConfig, BridgeError, IoPort, LinkConfig, LinkEvent, RosBridge, StreamTransport,
    Transport,
};

pub mod blimp;
pub mod config;

pub use blimp::{Blimp, Mode, MotorCommand};

/// Bridge over a buffered UART.
pub type UartBridge<U> = RosBridge<StreamTransport<IoPort<U>>, Blimp>;
