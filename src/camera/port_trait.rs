//! Trait abstraction for camera control writes to enable testing

use std::process::Command;
use tracing::debug;

use crate::error::{PtzError, Result};

/// Writes one named control of one camera.
#[cfg_attr(test, mockall::automock)]
pub trait ControlPort {
    /// Sets control `name` to `value`, blocking until the camera accepted it.
    fn set_control(&mut self, name: &str, value: i32) -> Result<()>;
}

/// Control port backed by the `v4l2-ctl` command line tool.
#[derive(Debug, Clone)]
pub struct V4l2Ctl {
    program: String,
    device: String,
}

impl V4l2Ctl {
    /// Creates a port for `device`, which is either a video device index
    /// (`"0"`) or a path (`"/dev/video2"`).
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::camera::port_trait::V4l2Ctl;
    ///
    /// let port = V4l2Ctl::new("v4l2-ctl", "0");
    /// assert_eq!(port.args("zoom_absolute", 150), ["-d", "0", "--set-ctrl", "zoom_absolute=150"]);
    /// ```
    #[must_use]
    pub fn new(program: &str, device: &str) -> Self {
        Self {
            program: program.to_string(),
            device: device.to_string(),
        }
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Command line arguments for one control write.
    #[must_use]
    pub fn args(&self, name: &str, value: i32) -> [String; 4] {
        [
            "-d".to_string(),
            self.device.clone(),
            "--set-ctrl".to_string(),
            format!("{}={}", name, value),
        ]
    }
}

impl ControlPort for V4l2Ctl {
    fn set_control(&mut self, name: &str, value: i32) -> Result<()> {
        let output = Command::new(&self.program)
            .args(self.args(name, value))
            .output()
            .map_err(|e| PtzError::ControlFailed {
                control: name.to_string(),
                reason: format!("could not run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PtzError::ControlFailed {
                control: name.to_string(),
                reason: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        debug!("{} {}={}", self.device, name, value);
        Ok(())
    }
}
