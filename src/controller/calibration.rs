//! # Calibration Module
//!
//! Applies a deadzone and an optional exponential curve to joystick axes.
//!
//! ## Deadzone
//!
//! Cheap sticks rarely rest at exactly zero. Any reading whose magnitude is
//! below the deadzone is treated as exactly 0.0 for that tick; readings at or
//! above it pass through unchanged, so a stick that is deliberately pushed
//! keeps its full rate.
//!
//! ## Exponential Curves
//!
//! With `expo > 0` the surviving value is shaped with
//! `output = (1 - expo) * input + expo * input³`, which gives finer control of
//! slow pans while keeping full deflection at the endpoints. The default is
//! linear.
//!
//! ## Usage
//!
//! ```
//! use camera_ptz::controller::calibration::Calibration;
//!
//! let cal = Calibration::new(0.1, 0.0);
//!
//! // Resting noise is dropped
//! assert_eq!(cal.apply(0.05), 0.0);
//!
//! // Deliberate input is kept as is
//! assert_eq!(cal.apply(0.4), 0.4);
//! ```

/// Applies deadzone and exponential curve to a normalized input.
///
/// Input and output are in the range -1.0 to 1.0, where 0.0 is center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Deadzone as a fraction (0.0 to 0.5).
    deadzone: f32,
    /// Exponential curve factor (0.0 to 1.0).
    expo: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            deadzone: 0.1,
            expo: 0.0,
        }
    }
}

impl Calibration {
    /// Creates a new calibration with specified deadzone and expo.
    ///
    /// # Arguments
    ///
    /// * `deadzone` - Deadzone fraction (0.0 to 0.5). Values outside this range are clamped.
    /// * `expo` - Exponential curve factor (0.0 to 1.0). 0.0 = linear, 1.0 = max curve.
    #[must_use]
    pub fn new(deadzone: f32, expo: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.5),
            expo: expo.clamp(0.0, 1.0),
        }
    }

    /// Returns the configured deadzone value.
    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Returns the configured expo value.
    #[must_use]
    pub fn expo(&self) -> f32 {
        self.expo
    }

    /// Applies deadzone and expo curve to a normalized input.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::calibration::Calibration;
    ///
    /// let cal = Calibration::new(0.1, 0.5);
    ///
    /// assert_eq!(cal.apply(-0.09), 0.0);
    /// assert!((cal.apply(1.0) - 1.0).abs() < 0.001);
    /// assert!((cal.apply(-1.0) + 1.0).abs() < 0.001);
    /// ```
    #[must_use]
    pub fn apply(&self, input: f32) -> f32 {
        if !input.is_finite() || input.abs() < self.deadzone {
            return 0.0;
        }

        let input = input.clamp(-1.0, 1.0);
        if self.expo == 0.0 {
            input
        } else {
            (1.0 - self.expo) * input + self.expo * input * input * input
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let cal = Calibration::default();
        assert_eq!(cal.deadzone(), 0.1);
        assert_eq!(cal.expo(), 0.0);
    }

    #[test]
    fn test_new_clamps_parameters() {
        let cal = Calibration::new(0.9, -1.0);
        assert_eq!(cal.deadzone(), 0.5);
        assert_eq!(cal.expo(), 0.0);
    }

    #[test]
    fn test_everything_below_deadzone_is_zero() {
        let cal = Calibration::new(0.1, 0.0);
        let mut value = -0.0999;
        while value < 0.1 {
            assert_eq!(cal.apply(value), 0.0, "input {} should be dropped", value);
            value += 0.0037;
        }
    }

    #[test]
    fn test_deadzone_edge_passes_through() {
        let cal = Calibration::new(0.1, 0.0);
        assert_eq!(cal.apply(0.1), 0.1);
        assert_eq!(cal.apply(-0.1), -0.1);
    }

    #[test]
    fn test_linear_keeps_value() {
        let cal = Calibration::new(0.1, 0.0);
        assert_eq!(cal.apply(0.75), 0.75);
        assert_eq!(cal.apply(-0.3), -0.3);
    }

    #[test]
    fn test_expo_softens_mid_range() {
        let cal = Calibration::new(0.1, 0.5);
        let out = cal.apply(0.5);
        // 0.5 * 0.5 + 0.5 * 0.125
        assert!((out - 0.3125).abs() < 1e-6);
        assert!((cal.apply(-0.5) + 0.3125).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let cal = Calibration::new(0.1, 0.0);
        assert_eq!(cal.apply(1.3), 1.0);
        assert_eq!(cal.apply(-7.0), -1.0);
    }

    #[test]
    fn test_nan_is_zero() {
        let cal = Calibration::default();
        assert_eq!(cal.apply(f32::NAN), 0.0);
    }
}
