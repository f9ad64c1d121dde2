//! # Camera Module
//!
//! Pushes setpoints to a UVC camera's V4L2 controls.
//!
//! This module handles:
//! - Writing zoom, tilt and pan as absolute controls every tick
//! - The one-shot image quality presets (manual focus and exposure, optional
//!   saturation and sharpness) applied before steering starts

pub mod port_trait;

use tracing::info;

use crate::config::PresetConfig;
use crate::controller::ptz::PtzState;
use crate::error::Result;
pub use port_trait::{ControlPort, V4l2Ctl};

/// V4L2 control names.
pub mod controls {
    pub const ZOOM: &str = "zoom_absolute";
    pub const TILT: &str = "tilt_absolute";
    pub const PAN: &str = "pan_absolute";
    pub const FOCUS_AUTO: &str = "focus_automatic_continuous";
    pub const FOCUS: &str = "focus_absolute";
    pub const EXPOSURE_AUTO: &str = "auto_exposure";
    pub const EXPOSURE_TIME: &str = "exposure_time_absolute";
    pub const SATURATION: &str = "saturation";
    pub const SHARPNESS: &str = "sharpness";
}

/// `auto_exposure` menu value for manual exposure.
const EXPOSURE_MANUAL: i32 = 1;

/// Sends a setpoint as three control writes: zoom, then tilt, then pan.
///
/// Stops at the first failure.
///
/// # Examples
///
/// ```no_run
/// use camera_ptz::camera::{send_ptz, V4l2Ctl};
/// use camera_ptz::controller::ptz::PtzState;
///
/// let mut port = V4l2Ctl::new("v4l2-ctl", "0");
/// send_ptz(&mut port, &PtzState { pan: 3600, tilt: 0, zoom: 150 })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn send_ptz<P: ControlPort + ?Sized>(port: &mut P, state: &PtzState) -> Result<()> {
    port.set_control(controls::ZOOM, state.zoom)?;
    port.set_control(controls::TILT, state.tilt)?;
    port.set_control(controls::PAN, state.pan)?;
    Ok(())
}

/// Applies the image quality presets once.
///
/// Focus and exposure are switched to manual before their values are set,
/// unless `manual_focus` or `manual_exposure` is off. Saturation and
/// sharpness are only written when configured.
pub fn apply_image_presets<P: ControlPort + ?Sized>(
    port: &mut P,
    presets: &PresetConfig,
) -> Result<()> {
    if presets.manual_focus {
        port.set_control(controls::FOCUS_AUTO, 0)?;
        port.set_control(controls::FOCUS, presets.focus)?;
        info!("Manual focus at {}", presets.focus);
    }

    if presets.manual_exposure {
        port.set_control(controls::EXPOSURE_AUTO, EXPOSURE_MANUAL)?;
        port.set_control(controls::EXPOSURE_TIME, presets.exposure_time)?;
        info!("Manual exposure time {}", presets.exposure_time);
    }

    if let Some(saturation) = presets.saturation {
        port.set_control(controls::SATURATION, saturation)?;
    }

    if let Some(sharpness) = presets.sharpness {
        port.set_control(controls::SHARPNESS, sharpness)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::port_trait::MockControlPort;
    use super::*;
    use crate::error::PtzError;
    use mockall::{predicate::eq, Sequence};

    fn expect_write(port: &mut MockControlPort, seq: &mut Sequence, name: &'static str, value: i32) {
        port.expect_set_control()
            .with(eq(name), eq(value))
            .times(1)
            .in_sequence(seq)
            .returning(|_, _| Ok(()));
    }

    #[test]
    fn test_send_ptz_order() {
        let mut port = MockControlPort::new();
        let mut seq = Sequence::new();
        expect_write(&mut port, &mut seq, controls::ZOOM, 150);
        expect_write(&mut port, &mut seq, controls::TILT, -200);
        expect_write(&mut port, &mut seq, controls::PAN, 3600);

        send_ptz(&mut port, &PtzState { pan: 3600, tilt: -200, zoom: 150 }).unwrap();
    }

    #[test]
    fn test_send_ptz_twice_sends_same_writes() {
        let mut port = MockControlPort::new();
        let mut seq = Sequence::new();
        for _ in 0..2 {
            expect_write(&mut port, &mut seq, controls::ZOOM, 100);
            expect_write(&mut port, &mut seq, controls::TILT, 0);
            expect_write(&mut port, &mut seq, controls::PAN, 0);
        }

        let state = PtzState { pan: 0, tilt: 0, zoom: 100 };
        send_ptz(&mut port, &state).unwrap();
        send_ptz(&mut port, &state).unwrap();
    }

    #[test]
    fn test_send_ptz_stops_at_first_failure() {
        let mut port = MockControlPort::new();
        port.expect_set_control()
            .with(eq(controls::ZOOM), eq(100))
            .times(1)
            .returning(|_, _| Ok(()));
        port.expect_set_control()
            .with(eq(controls::TILT), eq(0))
            .times(1)
            .returning(|name, _| {
                Err(PtzError::ControlFailed {
                    control: name.to_string(),
                    reason: "No such device".to_string(),
                })
            });
        port.expect_set_control().with(eq(controls::PAN), eq(0)).times(0);

        let err = send_ptz(&mut port, &PtzState { pan: 0, tilt: 0, zoom: 100 }).unwrap_err();
        assert!(matches!(err, PtzError::ControlFailed { ref control, .. } if control == "tilt_absolute"));
    }

    #[test]
    fn test_default_presets() {
        let mut port = MockControlPort::new();
        let mut seq = Sequence::new();
        expect_write(&mut port, &mut seq, controls::FOCUS_AUTO, 0);
        expect_write(&mut port, &mut seq, controls::FOCUS, 0);
        expect_write(&mut port, &mut seq, controls::EXPOSURE_AUTO, 1);
        expect_write(&mut port, &mut seq, controls::EXPOSURE_TIME, 250);

        apply_image_presets(&mut port, &PresetConfig::default()).unwrap();
    }

    #[test]
    fn test_optional_presets() {
        let mut port = MockControlPort::new();
        let mut seq = Sequence::new();
        expect_write(&mut port, &mut seq, controls::SATURATION, 90);
        expect_write(&mut port, &mut seq, controls::SHARPNESS, 150);

        let presets = PresetConfig {
            manual_focus: false,
            manual_exposure: false,
            saturation: Some(90),
            sharpness: Some(150),
            ..PresetConfig::default()
        };
        apply_image_presets(&mut port, &presets).unwrap();
    }

    #[test]
    fn test_focus_left_automatic() {
        let mut port = MockControlPort::new();
        let mut seq = Sequence::new();
        expect_write(&mut port, &mut seq, controls::EXPOSURE_AUTO, 1);
        expect_write(&mut port, &mut seq, controls::EXPOSURE_TIME, 400);

        let presets = PresetConfig {
            manual_focus: false,
            exposure_time: 400,
            ..PresetConfig::default()
        };
        apply_image_presets(&mut port, &presets).unwrap();
    }

    #[test]
    fn test_exposure_left_automatic() {
        let mut port = MockControlPort::new();
        let mut seq = Sequence::new();
        expect_write(&mut port, &mut seq, controls::FOCUS_AUTO, 0);
        expect_write(&mut port, &mut seq, controls::FOCUS, 30);

        let presets = PresetConfig {
            focus: 30,
            manual_exposure: false,
            ..PresetConfig::default()
        };
        apply_image_presets(&mut port, &presets).unwrap();
    }

    #[test]
    fn test_preset_failure_propagates() {
        let mut port = MockControlPort::new();
        port.expect_set_control().returning(|name, _| {
            Err(PtzError::ControlFailed {
                control: name.to_string(),
                reason: "Invalid argument".to_string(),
            })
        });

        let result = apply_image_presets(&mut port, &PresetConfig::default());
        assert!(matches!(result, Err(PtzError::ControlFailed { .. })));
    }
}
