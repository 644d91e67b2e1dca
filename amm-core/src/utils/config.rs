//! Board configuration.
//!
//! Every field has a default matching the aMaker/DFRobot motor board, so an
//! empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::utils::controllers::actuators::ContinuousCalibration;

/// Default I2C address of the PCA9685 on the motor board.
pub const DEFAULT_PWM_ADDRESS: u8 = 0x40;
/// Servo frame rate.
pub const DEFAULT_PWM_FREQUENCY_HZ: u16 = 50;
/// Internal oscillator of the PCA9685.
const OSCILLATOR_HZ: u32 = 25_000_000;

/// Prescale register value for an output frequency.
///
/// `25 MHz / 4096 / freq - 1`, truncated, kept inside the chip's `3..=255`.
pub const fn prescale_for_frequency(freq_hz: u16) -> u8 {
    let freq = if freq_hz == 0 { 1 } else { freq_hz as u32 };
    let raw = OSCILLATOR_HZ / 4096 / freq;
    let prescale = raw.saturating_sub(1);
    if prescale < 3 {
        3
    } else if prescale > 255 {
        255
    } else {
        prescale as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// I2C address of the PCA9685.
    pub address: u8,
    /// PWM output frequency; servos expect 50 Hz.
    pub frequency_hz: u16,
    /// Calibration used for continuous servos bound as wheels.
    pub calibration: ContinuousCalibration,
    /// Global factor applied to every drive command.
    pub speed_limit: f32,
    /// Resolve mecanum `South` to the `SouthWest` vector, as older firmware did.
    pub historical_south: bool,
}

impl BoardConfig {
    pub const fn prescale(&self) -> u8 {
        prescale_for_frequency(self.frequency_hz)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_PWM_ADDRESS,
            frequency_hz: DEFAULT_PWM_FREQUENCY_HZ,
            calibration: ContinuousCalibration::default(),
            speed_limit: 1.0,
            historical_south: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescale_50hz() {
        assert_eq!(prescale_for_frequency(50), 121);
        assert_eq!(BoardConfig::default().prescale(), 121);
    }

    #[test]
    fn test_prescale_limits() {
        assert_eq!(prescale_for_frequency(0), 255);
        assert_eq!(prescale_for_frequency(10_000), 3);
    }

    #[test]
    fn test_empty_json_is_default() {
        let cfg: BoardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, BoardConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let cfg: BoardConfig =
            serde_json::from_str(r#"{"address":85,"calibration":{"stopped":300}}"#).unwrap();
        assert_eq!(cfg.address, 0x55);
        assert_eq!(cfg.calibration.stopped, 300);
        assert_eq!(cfg.calibration.max_forward, 535);
        assert_eq!(cfg.frequency_hz, 50);
    }
}
