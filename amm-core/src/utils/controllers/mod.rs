//! Module Exports
//!
//! This file exports key modules used in the motor control system.
//!
//! - `actuators`: pulse encoders for DC motors, angular and continuous servos.
//! - `binding`: wheel-to-port bindings for a drive layout.
//! - `i2c`: the PCA9685 motor board driver.

pub mod actuators;
pub mod binding;
/// Module for managing the I2C-connected PWM board.
pub mod i2c;

use core::cell::RefCell;
use serde::{Deserialize, Serialize};

pub use actuators::{ActuatorKind, AngularRange, ContinuousCalibration, Direction};
pub use binding::{BindingError, DriveBinding, WheelActuator};
pub use i2c::{DeviceError, MotorPort, PwmBoard, ServoPort};

use crate::utils::{
    config::BoardConfig,
    math::{
        kinematics::{self, MotionVector},
        moves::Move,
        power::{PowerRange, PowerVector},
    },
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "ct", rename_all = "snake_case")] // ct = command type
pub enum SystemCommand {
    D(DriveCommand),
    A(ActuatorCommand),
}

impl SystemCommand {
    /// Parse a JSON command, e.g. `{"ct":"d","dc":"move","m":"north"}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Commands for the bound drive base.
///
/// Serialized as JSON with tag `"dc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(tag = "dc", rename_all = "snake_case")]
pub enum DriveCommand {
    /// Discrete move with an optional speed factor.
    Move { m: Move, s: Option<f32> },
    /// Discrete move given by numeric code; unknown codes stop.
    Code { c: u8, s: Option<f32> },
    /// Continuous mecanum motion. `pct` selects the `[-100, 100]` scale.
    Vector {
        lat: f32,
        lon: f32,
        rot: f32,
        #[serde(default)]
        pct: bool,
    },
    Stop,
}

/// Commands for a single actuator.
///
/// Serialized as JSON with tag `"ac"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(tag = "ac", rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Run a DC motor at signed power.
    Motor { p: MotorPort, s: f32 },
    /// Run a DC motor on the 0..=255 scale.
    MotorByte { p: MotorPort, d: Direction, s: u8 },
    MotorStop { p: MotorPort },
    StopAll,
    /// Register the servo kind on a header.
    Attach { p: ServoPort, k: ActuatorKind },
    Detach { p: ServoPort },
    /// Angle or speed, depending on the attached kind.
    Servo { p: ServoPort, v: f32 },
    /// Raw pulse count.
    Pulse { p: ServoPort, v: u16 },
    Enable,
    Disable,
}

pub struct SystemController<'a, I2C: 'static> {
    pub board: Option<PwmBoard<'a, I2C>>,
    pub drive: Option<DriveBinding>,
    config: BoardConfig,
}

impl<'a, I2C, E> SystemController<'a, I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Bring up the PWM board. On failure the bus is scanned and logged, and
    /// the controller runs without a board.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: BoardConfig,
    ) -> Self {
        let mut board = PwmBoard::new(i2c_bus, &config);

        let board = match board.init_devices().and_then(|()| board.configure_pwm()) {
            Ok(()) => Some(board),
            Err(e) => {
                tracing::warn!("PWM init failed, scanning instead: {:?}", e);
                board.scan_bus();
                None
            }
        };

        SystemController {
            board,
            drive: None,
            config,
        }
    }

    /// Build around an already initialized board.
    pub fn with_board(
        board: PwmBoard<'a, I2C>,
        config: BoardConfig,
    ) -> Self {
        SystemController {
            board: Some(board),
            drive: None,
            config,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn bind_drive(
        &mut self,
        binding: DriveBinding,
    ) {
        tracing::info!(layout = ?binding.layout(), "drive bound");
        self.drive = Some(binding);
    }

    /// Configured speed limit, saturated to `[0, 1]`.
    fn speed_limit(&self) -> f32 {
        PowerRange::Unsigned.clamp(self.config.speed_limit)
    }

    /// Power vector for a discrete move on the bound layout, after the speed
    /// factor and the configured speed limit. Unsupported moves stop.
    ///
    /// The speed factor saturates to `[0, 1]`; it never raises the limit or
    /// reverses the move.
    pub fn move_power(
        &self,
        mv: Move,
        speed: Option<f32>,
    ) -> Result<PowerVector, DeviceError<E>> {
        let layout = self.drive.as_ref().ok_or(DeviceError::DriveNotBound)?.layout();
        let power = if self.config.historical_south && layout.is_holonomic() {
            kinematics::mecanum_move_power_historical(mv)
        } else {
            kinematics::power_for_move_or_stop(mv, layout)
        };
        let speed = PowerRange::Unsigned.clamp(speed.unwrap_or(1.0));
        Ok(power.scaled(speed * self.speed_limit()))
    }

    /// Power vector for a continuous motion request. Non-mecanum layouts stop.
    pub fn vector_power(
        &self,
        motion: MotionVector,
    ) -> Result<PowerVector, DeviceError<E>> {
        let layout = self.drive.as_ref().ok_or(DeviceError::DriveNotBound)?.layout();
        if !layout.is_holonomic() {
            tracing::warn!(?layout, "continuous motion needs a mecanum layout, stopping");
            return Ok(PowerVector::STOP);
        }
        Ok(motion.mecanum_power().scaled(self.speed_limit()))
    }

    /// Apply a power vector to the bound wheels.
    pub fn apply_power(
        &mut self,
        power: &PowerVector,
    ) -> Result<(), DeviceError<E>> {
        let drive = self.drive.ok_or(DeviceError::DriveNotBound)?;
        let board = self.board.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        tracing::debug!(?power, "applying power");
        board.apply_power(&drive, power)
    }

    /// Execute a command. Drive commands return the power vector applied.
    pub fn execute(
        &mut self,
        command: SystemCommand,
    ) -> Result<Option<PowerVector>, DeviceError<E>> {
        match command {
            SystemCommand::D(cmd) => {
                let power = match cmd {
                    DriveCommand::Move { m, s } => self.move_power(m, s)?,
                    DriveCommand::Code { c, s } => self.move_power(Move::from_code_or_stop(c), s)?,
                    DriveCommand::Vector { lat, lon, rot, pct } => {
                        let motion = if pct {
                            MotionVector::from_percent(lat, lon, rot)
                        } else {
                            MotionVector::new(lat, lon, rot)
                        };
                        self.vector_power(motion)?
                    }
                    DriveCommand::Stop => PowerVector::STOP,
                };
                self.apply_power(&power)?;
                Ok(Some(power))
            }
            SystemCommand::A(cmd) => {
                self.execute_actuator(cmd)?;
                Ok(None)
            }
        }
    }

    fn execute_actuator(
        &mut self,
        command: ActuatorCommand,
    ) -> Result<(), DeviceError<E>> {
        let board = self.board.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        match command {
            ActuatorCommand::Motor { p, s } => board.run_motor(p, s),
            ActuatorCommand::MotorByte { p, d, s } => board.run_motor_byte(p, d, s),
            ActuatorCommand::MotorStop { p } => board.stop_motor(p),
            ActuatorCommand::StopAll => board.stop_all_motors(),
            ActuatorCommand::Attach { p, k } => board.attach_servo(p, k),
            ActuatorCommand::Detach { p } => {
                board.detach_servo(p);
                Ok(())
            }
            ActuatorCommand::Servo { p, v } => board.drive_servo(p, v).map(|_| ()),
            ActuatorCommand::Pulse { p, v } => board.set_servo_pulse(p, v),
            ActuatorCommand::Enable => board.enable(),
            ActuatorCommand::Disable => board.disable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drive_move() {
        let cmd = SystemCommand::from_json(br#"{"ct":"d","dc":"move","m":"north_east"}"#).unwrap();
        assert!(matches!(
            cmd,
            SystemCommand::D(DriveCommand::Move {
                m: Move::NorthEast,
                s: None
            })
        ));
    }

    #[test]
    fn test_parse_vector_percent() {
        let cmd = SystemCommand::from_json(
            br#"{"ct":"d","dc":"vector","lat":50,"lon":0,"rot":0,"pct":true}"#,
        )
        .unwrap();
        match cmd {
            SystemCommand::D(DriveCommand::Vector { lat, pct, .. }) => {
                assert_eq!(lat, 50.0);
                assert!(pct);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_attach() {
        let cmd = SystemCommand::from_json(
            br#"{"ct":"a","ac":"attach","p":"s2","k":{"k":"angular_servo","range":"deg270"}}"#,
        )
        .unwrap();
        assert!(matches!(
            cmd,
            SystemCommand::A(ActuatorCommand::Attach {
                p: ServoPort::S2,
                k: ActuatorKind::AngularServo {
                    range: AngularRange::Deg270
                }
            })
        ));
    }

    #[test]
    fn test_parse_detach() {
        let cmd = SystemCommand::from_json(br#"{"ct":"a","ac":"detach","p":"s5"}"#).unwrap();
        assert!(matches!(
            cmd,
            SystemCommand::A(ActuatorCommand::Detach { p: ServoPort::S5 })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SystemCommand::from_json(br#"{"ct":"x"}"#).is_err());
        assert!(SystemCommand::from_json(b"not json").is_err());
    }
}
