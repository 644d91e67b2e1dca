//! Wheel-to-port bindings for a drive layout.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{
    actuators::ContinuousCalibration,
    i2c::{MotorPort, ServoPort},
};
use crate::utils::math::moves::DriveLayout;

/// What physically turns a wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelActuator {
    Motor {
        port: MotorPort,
    },
    ContinuousServo {
        port: ServoPort,
        #[serde(default)]
        calibration: ContinuousCalibration,
    },
}

/// Wheel count does not match the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingError {
    pub layout: DriveLayout,
    pub expected: usize,
    pub got: usize,
}

impl fmt::Display for BindingError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{:?} needs {} wheels, {} bound",
            self.layout, self.expected, self.got
        )
    }
}

/// A drive layout with one actuator per wheel, in `fl, fr, bl, br` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveBinding {
    layout: DriveLayout,
    wheels: [Option<WheelActuator>; 4],
}

impl DriveBinding {
    /// Bind `wheels` to `layout`. Two-wheel layouts take exactly two wheels
    /// (front-left, front-right); the others take four.
    pub fn new(
        layout: DriveLayout,
        wheels: &[WheelActuator],
    ) -> Result<Self, BindingError> {
        let expected = layout.wheel_count();
        if wheels.len() != expected {
            return Err(BindingError {
                layout,
                expected,
                got: wheels.len(),
            });
        }
        let mut slots = [None; 4];
        for (slot, wheel) in slots.iter_mut().zip(wheels) {
            *slot = Some(*wheel);
        }
        Ok(Self {
            layout,
            wheels: slots,
        })
    }

    /// DC motors on M1, M2, ... in wheel order.
    pub fn motors(layout: DriveLayout) -> Self {
        let mut wheels = [None; 4];
        for (slot, port) in wheels
            .iter_mut()
            .zip(MotorPort::ALL)
            .take(layout.wheel_count())
        {
            *slot = Some(WheelActuator::Motor { port });
        }
        Self { layout, wheels }
    }

    /// Continuous servos on S1, S2, ... in wheel order.
    pub fn continuous_servos(
        layout: DriveLayout,
        calibration: ContinuousCalibration,
    ) -> Self {
        let mut wheels = [None; 4];
        for (slot, port) in wheels
            .iter_mut()
            .zip(ServoPort::ALL)
            .take(layout.wheel_count())
        {
            *slot = Some(WheelActuator::ContinuousServo { port, calibration });
        }
        Self { layout, wheels }
    }

    pub fn layout(&self) -> DriveLayout {
        self.layout
    }

    /// Bound wheels with their power-vector slot (0 = fl … 3 = br).
    pub fn wheels(&self) -> impl Iterator<Item = (usize, WheelActuator)> + '_ {
        self.wheels
            .iter()
            .enumerate()
            .filter_map(|(slot, wheel)| wheel.map(|w| (slot, w)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_count_mismatch() {
        let two = [
            WheelActuator::Motor {
                port: MotorPort::M1,
            },
            WheelActuator::Motor {
                port: MotorPort::M2,
            },
        ];
        let err = DriveBinding::new(DriveLayout::FourWheelMecanum, &two).unwrap_err();
        assert_eq!(err.expected, 4);
        assert_eq!(err.got, 2);
        assert!(DriveBinding::new(DriveLayout::TwoWheel, &two).is_ok());
    }

    #[test]
    fn test_motor_defaults() {
        let b = DriveBinding::motors(DriveLayout::TwoWheel);
        let wheels: [Option<(usize, WheelActuator)>; 3] = {
            let mut it = b.wheels();
            [it.next(), it.next(), it.next()]
        };
        assert_eq!(
            wheels,
            [
                Some((
                    0,
                    WheelActuator::Motor {
                        port: MotorPort::M1
                    }
                )),
                Some((
                    1,
                    WheelActuator::Motor {
                        port: MotorPort::M2
                    }
                )),
                None,
            ]
        );
        assert_eq!(DriveBinding::motors(DriveLayout::FourWheelMecanum).wheels().count(), 4);
    }

    #[test]
    fn test_servo_defaults() {
        let b = DriveBinding::continuous_servos(
            DriveLayout::FourWheelMecanum,
            ContinuousCalibration::default(),
        );
        let last = b.wheels().last().unwrap();
        assert_eq!(last.0, 3);
        assert!(matches!(
            last.1,
            WheelActuator::ContinuousServo {
                port: ServoPort::S4,
                ..
            }
        ));
    }
}
