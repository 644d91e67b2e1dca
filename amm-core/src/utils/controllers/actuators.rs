//! Actuation encoding: normalized command to PCA9685 pulse count.
//!
//! All encoders are pure. Inputs are saturated, never rejected, and every
//! result fits the chip's 12-bit `off` register.

use serde::{Deserialize, Serialize};

use crate::utils::math::power::PowerRange;

/// Largest value the 12-bit PWM register accepts.
pub const MAX_PULSE: u16 = 4095;

/// Servo frame period at 50 Hz, in microseconds.
const SERVO_PERIOD_US: f32 = 20_000.0;
/// Ticks in one PWM cycle.
const TICKS_PER_CYCLE: f32 = 4096.0;

/// Mechanical travel of an angular servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularRange {
    /// 180° servo, commanded in ±90°.
    Deg180,
    /// 270° servo, commanded in ±135°.
    Deg270,
}

impl AngularRange {
    pub const fn max_degrees(self) -> f32 {
        match self {
            AngularRange::Deg180 => 90.0,
            AngularRange::Deg270 => 135.0,
        }
    }
}

/// Five-point calibration of a continuous-rotation servo.
///
/// Backward speeds span `min_backward` (slowest) to `max_backward` (fastest),
/// forward speeds span `min_forward` to `max_forward`. `stopped` sits in the
/// dead band between the two segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousCalibration {
    pub max_backward: u16,
    pub min_backward: u16,
    pub stopped: u16,
    pub min_forward: u16,
    pub max_forward: u16,
}

impl Default for ContinuousCalibration {
    fn default() -> Self {
        Self {
            max_backward: 85,
            min_backward: 285,
            stopped: 310,
            min_forward: 335,
            max_forward: 535,
        }
    }
}

/// Kind of actuator wired to a channel, with its calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "k", rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Brushed DC motor behind an H-bridge (two half-channels).
    BrushedDcMotor,
    AngularServo { range: AngularRange },
    ContinuousServo {
        #[serde(default)]
        calibration: ContinuousCalibration,
    },
}

impl ActuatorKind {
    /// Whether the kind is driven by a single servo channel.
    pub fn is_servo(&self) -> bool {
        !matches!(self, ActuatorKind::BrushedDcMotor)
    }
}

/// Duty pair for the two half-channels of an H-bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HBridgeDuty {
    pub forward: u16,
    pub reverse: u16,
}

/// Encoder output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PulseCount {
    Single(u16),
    HBridge(HBridgeDuty),
}

/// Rotation sense for the byte-speed motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Cw,
    Ccw,
}

/// Encode `value` for the given actuator.
///
/// `value` is a power in `[-1, 1]` for motors, an angle in degrees for
/// angular servos, and a speed in `[-1, 1]` for continuous servos.
pub fn encode(
    kind: &ActuatorKind,
    value: f32,
) -> PulseCount {
    match kind {
        ActuatorKind::BrushedDcMotor => PulseCount::HBridge(encode_dc_motor(value)),
        ActuatorKind::AngularServo { range } => PulseCount::Single(encode_angle(*range, value)),
        ActuatorKind::ContinuousServo { calibration } => {
            PulseCount::Single(encode_continuous_servo(calibration, value))
        }
    }
}

/// Split a signed power into H-bridge duties.
///
/// The magnitude `round(|power| * 4095)` goes to the half-channel matching
/// the sign; the other half gets zero.
pub fn encode_dc_motor(power: f32) -> HBridgeDuty {
    let power = PowerRange::Signed.clamp(power);
    let magnitude = saturate(libm::roundf(libm::fabsf(power) * MAX_PULSE as f32));
    if power >= 0.0 {
        HBridgeDuty {
            forward: magnitude,
            reverse: 0,
        }
    } else {
        HBridgeDuty {
            forward: 0,
            reverse: magnitude,
        }
    }
}

/// Legacy motor command: `speed` on a 0..=255 scale, sign from `direction`.
pub fn encode_dc_motor_byte(
    direction: Direction,
    speed: u8,
) -> HBridgeDuty {
    let magnitude = (speed as u16 * 16).min(MAX_PULSE);
    match direction {
        Direction::Cw => HBridgeDuty {
            forward: magnitude,
            reverse: 0,
        },
        Direction::Ccw => HBridgeDuty {
            forward: 0,
            reverse: magnitude,
        },
    }
}

/// Angular servo position to 50 Hz tick count.
///
/// The angle is clamped to the servo's travel, mapped to a pulse width of
/// `degree * 10 + 600` µs, then to ticks of a 20 ms frame (truncated).
/// Negative angles fall below the 600 µs edge of the 600-2400 µs servo band;
/// at -60° and beyond the pulse is 0.
pub fn encode_angle(
    range: AngularRange,
    degree: f32,
) -> u16 {
    let limit = range.max_degrees();
    let degree = if degree.is_nan() {
        0.0
    } else {
        degree.clamp(-limit, limit)
    };
    let us = degree * 1800.0 / 180.0 + 600.0;
    saturate(libm::truncf(us * TICKS_PER_CYCLE / SERVO_PERIOD_US))
}

/// Continuous-rotation servo speed to pulse count.
///
/// Zero maps to `stopped` exactly; positive speeds interpolate from
/// `min_forward` to `max_forward`, negative speeds from `min_backward` to
/// `max_backward`. The jump at zero is the servo's dead band.
pub fn encode_continuous_servo(
    calibration: &ContinuousCalibration,
    speed: f32,
) -> u16 {
    let speed = PowerRange::Signed.clamp(speed);
    if speed == 0.0 {
        return calibration.stopped.min(MAX_PULSE);
    }
    let (near, far) = if speed > 0.0 {
        (calibration.min_forward, calibration.max_forward)
    } else {
        (calibration.min_backward, calibration.max_backward)
    };
    let near = near as f32;
    let far = far as f32;
    saturate(libm::roundf(near + libm::fabsf(speed) * (far - near)))
}

/// Clamp a computed pulse into `0..=MAX_PULSE`.
fn saturate(pulse: f32) -> u16 {
    if pulse.is_nan() {
        return 0;
    }
    pulse.clamp(0.0, MAX_PULSE as f32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_motor_full_scale() {
        assert_eq!(
            encode_dc_motor(1.0),
            HBridgeDuty {
                forward: 4095,
                reverse: 0
            }
        );
        assert_eq!(
            encode_dc_motor(-1.0),
            HBridgeDuty {
                forward: 0,
                reverse: 4095
            }
        );
        assert_eq!(encode_dc_motor(7.0), encode_dc_motor(1.0));
        assert_eq!(encode_dc_motor(0.0), HBridgeDuty::default());
    }

    #[test]
    fn test_dc_motor_rounds() {
        // 0.5 * 4095 = 2047.5
        assert_eq!(encode_dc_motor(0.5).forward, 2048);
        assert_eq!(encode_dc_motor(-0.25).reverse, 1024);
    }

    #[test]
    fn test_dc_motor_byte() {
        assert_eq!(encode_dc_motor_byte(Direction::Cw, 255).forward, 4080);
        assert_eq!(encode_dc_motor_byte(Direction::Ccw, 10).reverse, 160);
        assert_eq!(encode_dc_motor_byte(Direction::Ccw, 10).forward, 0);
    }

    #[test]
    fn test_angle_clamps_to_servo_limit() {
        assert_eq!(
            encode_angle(AngularRange::Deg180, 90.0),
            encode_angle(AngularRange::Deg180, 200.0)
        );
        assert_eq!(
            encode_angle(AngularRange::Deg270, 135.0),
            encode_angle(AngularRange::Deg270, 1000.0)
        );
    }

    #[test]
    fn test_angle_ticks() {
        // 0° -> 600 µs -> 122.88 ticks
        assert_eq!(encode_angle(AngularRange::Deg180, 0.0), 122);
        // 90° -> 1500 µs -> 307.2 ticks
        assert_eq!(encode_angle(AngularRange::Deg180, 90.0), 307);
        // 135° -> 1950 µs -> 399.36 ticks
        assert_eq!(encode_angle(AngularRange::Deg270, 135.0), 399);
    }

    #[test]
    fn test_angle_negative_pulse_saturates() {
        // -90° -> -300 µs, which no servo accepts
        assert_eq!(encode_angle(AngularRange::Deg180, -90.0), 0);
        assert_eq!(encode_angle(AngularRange::Deg180, f32::NAN), 122);
    }

    #[test]
    fn test_continuous_servo_endpoints() {
        let cal = ContinuousCalibration::default();
        assert_eq!(encode_continuous_servo(&cal, 0.0), 310);
        assert_eq!(encode_continuous_servo(&cal, 1.0), 535);
        assert_eq!(encode_continuous_servo(&cal, -1.0), 85);
        assert_eq!(encode_continuous_servo(&cal, 2.0), 535);
        assert_eq!(encode_continuous_servo(&cal, -2.0), 85);
    }

    #[test]
    fn test_continuous_servo_segments() {
        let cal = ContinuousCalibration::default();
        assert_eq!(encode_continuous_servo(&cal, 0.5), 435);
        assert_eq!(encode_continuous_servo(&cal, -0.5), 185);
        // dead band: the smallest speeds land next to min_*, not next to stopped
        assert_eq!(encode_continuous_servo(&cal, 0.001), 335);
        assert_eq!(encode_continuous_servo(&cal, -0.001), 285);
    }

    #[test]
    fn test_continuous_servo_custom_calibration() {
        let cal = ContinuousCalibration {
            max_backward: 200,
            min_backward: 300,
            stopped: 307,
            min_forward: 315,
            max_forward: 415,
        };
        assert_eq!(encode_continuous_servo(&cal, 0.0), 307);
        assert_eq!(encode_continuous_servo(&cal, 1.0), 415);
        assert_eq!(encode_continuous_servo(&cal, -1.0), 200);
    }

    #[test]
    fn test_encode_dispatch() {
        assert_eq!(
            encode(&ActuatorKind::BrushedDcMotor, -1.0),
            PulseCount::HBridge(HBridgeDuty {
                forward: 0,
                reverse: 4095
            })
        );
        assert_eq!(
            encode(
                &ActuatorKind::AngularServo {
                    range: AngularRange::Deg180
                },
                90.0
            ),
            PulseCount::Single(307)
        );
        assert_eq!(
            encode(
                &ActuatorKind::ContinuousServo {
                    calibration: ContinuousCalibration::default()
                },
                0.0
            ),
            PulseCount::Single(310)
        );
    }
}
