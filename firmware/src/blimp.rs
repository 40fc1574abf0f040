//! Blimp state driven by ground station commands.

use defmt::{info, warn};
use rosbridge_core::{BridgeError, RosBridge, Transport};

use crate::config::{TOPIC_AUTO, TOPIC_MOTORS};

/// Elements in a `motors` command: `[yaw, forward, unused, up]`.
pub const MOTOR_AXES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Mode {
    Manual,
    Autonomous,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Manual => "manual",
            Mode::Autonomous => "autonomous",
        }
    }
}

/// Latest manual motor command.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct MotorCommand {
    pub yaw: f64,
    pub forward: f64,
    pub up: f64,
}

impl MotorCommand {
    pub const STOP: Self = Self {
        yaw: 0.0,
        forward: 0.0,
        up: 0.0,
    };
}

/// Application context passed to every bridge callback.
pub struct Blimp {
    pub mode: Mode,
    pub command: MotorCommand,
    pub link_up: bool,
    pub commands_received: u32,
}

impl Blimp {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Manual,
            command: MotorCommand::STOP,
            link_up: false,
            commands_received: 0,
        }
    }

    /// Subscribe the command topics and install the link hooks.
    pub fn register<T: Transport, const N: usize>(
        bridge: &mut RosBridge<T, Blimp, N>,
    ) -> Result<(), BridgeError> {
        bridge.subscribe_f64_array(TOPIC_MOTORS, on_motors)?;
        bridge.subscribe_bool(TOPIC_AUTO, on_auto)?;
        bridge.on_connect(on_link_up);
        bridge.on_disconnect(on_link_lost);
        Ok(())
    }
}

impl Default for Blimp {
    fn default() -> Self {
        Self::new()
    }
}

fn on_motors(blimp: &mut Blimp, values: &[f64]) {
    if values.len() != MOTOR_AXES {
        warn!("motors: expected {} values, got {}", MOTOR_AXES, values.len());
        return;
    }
    blimp.command = MotorCommand {
        yaw: values[0],
        forward: values[1],
        up: values[3],
    };
    blimp.commands_received = blimp.commands_received.wrapping_add(1);
}

// A decoded `true` (payload `0`) selects manual flight.
fn on_auto(blimp: &mut Blimp, value: bool) {
    let mode = if value { Mode::Manual } else { Mode::Autonomous };
    if mode != blimp.mode {
        info!("mode: {} -> {}", blimp.mode, mode);
    }
    blimp.mode = mode;
}

fn on_link_up(blimp: &mut Blimp) {
    blimp.link_up = true;
}

fn on_link_lost(blimp: &mut Blimp) {
    blimp.link_up = false;
    blimp.command = MotorCommand::STOP;
    warn!("ground station lost, motors stopped");
}
