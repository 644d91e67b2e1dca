//! PCA9685 motor board access over I2C.
//!
//! `PwmBoard` is the only place that touches hardware: it resolves motor and
//! servo ports to PWM channels, runs the encoders from [`actuators`], and
//! writes `on = 0, off = pulse` per channel.
//!
//! [`actuators`]: super::actuators

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};
use serde::{Deserialize, Serialize};

use super::{
    actuators::{self, ActuatorKind, Direction, HBridgeDuty, PulseCount, MAX_PULSE},
    binding::{DriveBinding, WheelActuator},
};
use crate::utils::{config::BoardConfig, math::power::PowerVector};

const CHANNELS: [Channel; 16] = [
    Channel::C0,
    Channel::C1,
    Channel::C2,
    Channel::C3,
    Channel::C4,
    Channel::C5,
    Channel::C6,
    Channel::C7,
    Channel::C8,
    Channel::C9,
    Channel::C10,
    Channel::C11,
    Channel::C12,
    Channel::C13,
    Channel::C14,
    Channel::C15,
];

/// Errors that can occur when driving the motor board.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    PwmNotInitialized,
    UnknownChannel(u8),
    ServoNotAttached(ServoPort),
    NotAServo(ServoPort),
    DriveNotBound,
}

/// DC motor terminals M1..M4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorPort {
    M1 = 1,
    M2 = 2,
    M3 = 3,
    M4 = 4,
}

impl MotorPort {
    pub const ALL: [MotorPort; 4] = [MotorPort::M1, MotorPort::M2, MotorPort::M3, MotorPort::M4];

    /// `(forward, reverse)` half-channels of the H-bridge.
    pub const fn channels(self) -> (u8, u8) {
        let reverse = (4 - self as u8) * 2;
        (reverse + 1, reverse)
    }
}

/// Servo headers S1..S8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServoPort {
    S1 = 1,
    S2 = 2,
    S3 = 3,
    S4 = 4,
    S5 = 5,
    S6 = 6,
    S7 = 7,
    S8 = 8,
}

impl ServoPort {
    pub const ALL: [ServoPort; 8] = [
        ServoPort::S1,
        ServoPort::S2,
        ServoPort::S3,
        ServoPort::S4,
        ServoPort::S5,
        ServoPort::S6,
        ServoPort::S7,
        ServoPort::S8,
    ];

    /// PWM channel; the headers are wired in reverse (S1 -> 15, S8 -> 8).
    pub const fn channel(self) -> u8 {
        16 - self as u8
    }

    const fn slot(self) -> usize {
        self as usize - 1
    }
}

/// Driver for the PCA9685 on the motor board plus per-servo calibration.
pub struct PwmBoard<'a, I2C: 'static> {
    i2c: &'a RefCell<I2C>,
    pub pwm: Option<Pca9685<RefCellDevice<'a, I2C>>>,
    address: u8,
    prescale: u8,
    servos: [Option<ActuatorKind>; 8],
}

impl<'a, I2C, E> PwmBoard<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Create a board handle; no bus traffic happens until `init_devices`.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: &BoardConfig,
    ) -> Self {
        PwmBoard {
            i2c: i2c_bus,
            pwm: None,
            address: config.address,
            prescale: config.prescale(),
            servos: [None; 8],
        }
    }

    /// Create the PCA9685 handle at the configured address.
    pub fn init_devices(&mut self) -> Result<(), DeviceError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(self.i2c), PwmAddress::from(self.address))
            .map_err(DeviceError::PwmError)?;
        self.pwm = Some(pwm);
        Ok(())
    }

    /// Scan the I2C bus for devices and log any found addresses.
    pub fn scan_bus(&self) {
        let mut bus = self.i2c.borrow_mut();
        for addr in 0x03..0x78 {
            if bus.write(addr, &[]).is_ok() {
                tracing::warn!("I2C device found at 0x{:02X}", addr);
            }
        }
    }

    /// Wake the oscillator and program the servo frame rate.
    pub fn configure_pwm(&mut self) -> Result<(), DeviceError<E>> {
        let prescale = self.prescale;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        pca.set_prescale(prescale).map_err(DeviceError::PwmError)?;
        tracing::info!(prescale, "PWM prescale set");
        Ok(())
    }

    /// Wake the PWM controller.
    pub fn enable(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)
    }

    /// Put the PWM controller to sleep; all outputs go idle.
    pub fn disable(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.disable().map_err(DeviceError::PwmError)
    }

    /// Write `on = 0, off = pulse` to one channel. Pulses above 4095 saturate.
    pub fn set_pulse(
        &mut self,
        channel: u8,
        pulse: u16,
    ) -> Result<(), DeviceError<E>> {
        let ch = *CHANNELS
            .get(channel as usize)
            .ok_or(DeviceError::UnknownChannel(channel))?;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        let pulse = pulse.min(MAX_PULSE);
        tracing::debug!(channel, pulse, "set pulse");
        pca.set_channel_on_off(ch, 0, pulse)
            .map_err(DeviceError::PwmError)
    }

    fn write_bridge(
        &mut self,
        port: MotorPort,
        duty: HBridgeDuty,
    ) -> Result<(), DeviceError<E>> {
        let (forward, reverse) = port.channels();
        self.set_pulse(forward, duty.forward)?;
        self.set_pulse(reverse, duty.reverse)
    }

    /// Run a DC motor at a signed power in `[-1, 1]`.
    pub fn run_motor(
        &mut self,
        port: MotorPort,
        power: f32,
    ) -> Result<(), DeviceError<E>> {
        self.write_bridge(port, actuators::encode_dc_motor(power))
    }

    /// Run a DC motor with a 0..=255 speed and explicit direction.
    pub fn run_motor_byte(
        &mut self,
        port: MotorPort,
        direction: Direction,
        speed: u8,
    ) -> Result<(), DeviceError<E>> {
        self.write_bridge(port, actuators::encode_dc_motor_byte(direction, speed))
    }

    pub fn stop_motor(
        &mut self,
        port: MotorPort,
    ) -> Result<(), DeviceError<E>> {
        self.write_bridge(port, HBridgeDuty::default())
    }

    pub fn stop_all_motors(&mut self) -> Result<(), DeviceError<E>> {
        for port in MotorPort::ALL {
            self.stop_motor(port)?;
        }
        Ok(())
    }

    /// Record the servo kind plugged into `port`.
    pub fn attach_servo(
        &mut self,
        port: ServoPort,
        kind: ActuatorKind,
    ) -> Result<(), DeviceError<E>> {
        if !kind.is_servo() {
            return Err(DeviceError::NotAServo(port));
        }
        self.servos[port.slot()] = Some(kind);
        tracing::info!(?port, ?kind, "servo attached");
        Ok(())
    }

    /// Forget the servo kind on `port`; later `drive_servo` calls fail.
    pub fn detach_servo(
        &mut self,
        port: ServoPort,
    ) {
        self.servos[port.slot()] = None;
    }

    /// The servo kind attached to `port`, if any.
    pub fn servo(
        &self,
        port: ServoPort,
    ) -> Option<ActuatorKind> {
        self.servos[port.slot()]
    }

    /// Encode `value` through the attached servo kind and write it.
    ///
    /// Returns the pulse written.
    pub fn drive_servo(
        &mut self,
        port: ServoPort,
        value: f32,
    ) -> Result<u16, DeviceError<E>> {
        let kind = self.servo(port).ok_or(DeviceError::ServoNotAttached(port))?;
        match actuators::encode(&kind, value) {
            PulseCount::Single(pulse) => {
                self.set_pulse(port.channel(), pulse)?;
                Ok(pulse)
            }
            PulseCount::HBridge(_) => Err(DeviceError::NotAServo(port)),
        }
    }

    /// Write a raw pulse to a servo header.
    pub fn set_servo_pulse(
        &mut self,
        port: ServoPort,
        pulse: u16,
    ) -> Result<(), DeviceError<E>> {
        self.set_pulse(port.channel(), pulse)
    }

    /// Encode each bound wheel's field of `power` and write it.
    ///
    /// Wheels are written in `fl, fr, bl, br` order. If any write fails, every
    /// bound wheel is sent a stop before the error is returned.
    pub fn apply_power(
        &mut self,
        binding: &DriveBinding,
        power: &PowerVector,
    ) -> Result<(), DeviceError<E>> {
        let values = power.values();
        for (slot, wheel) in binding.wheels() {
            if let Err(e) = self.write_wheel(wheel, values[slot]) {
                tracing::warn!(slot, "wheel write failed, stopping drive: {:?}", e);
                self.stop_wheels(binding);
                return Err(e);
            }
        }
        Ok(())
    }

    fn write_wheel(
        &mut self,
        wheel: WheelActuator,
        value: f32,
    ) -> Result<(), DeviceError<E>> {
        match wheel {
            WheelActuator::Motor { port } => self.run_motor(port, value),
            WheelActuator::ContinuousServo { port, calibration } => {
                let pulse = actuators::encode_continuous_servo(&calibration, value);
                self.set_pulse(port.channel(), pulse)
            }
        }
    }

    /// Best effort: keep going past failed writes.
    fn stop_wheels(
        &mut self,
        binding: &DriveBinding,
    ) {
        for (slot, wheel) in binding.wheels() {
            if let Err(e) = self.write_wheel(wheel, 0.0) {
                tracing::error!(slot, "wheel stop failed: {:?}", e);
            }
        }
    }
}
