//! # Input Events
//!
//! The closed set of discrete events an input source reports, and the
//! identity a joystick is known by.

use std::fmt;
use std::path::PathBuf;

/// Per-connection joystick handle id.
///
/// Ids are assigned when a device appears and are never reused, so a
/// replugged joystick comes back under a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who a joystick is: the name it reports, a stable hardware id string and
/// where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoystickIdentity {
    /// Human-readable device name, e.g. "Logitech Extreme 3D".
    pub name: String,
    /// Bus/vendor/product/version as 16 hex digits.
    pub guid: String,
    /// Device node the joystick was opened from.
    pub path: PathBuf,
}

impl JoystickIdentity {
    /// Builds the SDL-style hardware id string from input id fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::event::JoystickIdentity;
    ///
    /// assert_eq!(JoystickIdentity::guid_from_ids(0x3, 0x046d, 0xc215, 0x0110), "0003046dc2150110");
    /// ```
    #[must_use]
    pub fn guid_from_ids(bus: u16, vendor: u16, product: u16, version: u16) -> String {
        format!("{:04x}{:04x}{:04x}{:04x}", bus, vendor, product, version)
    }
}

impl fmt::Display for JoystickIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] at {}", self.name, self.guid, self.path.display())
    }
}

/// One discrete event drained from an input source.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Button `button` (zero-based index) went down.
    ButtonDown { instance: InstanceId, button: usize },
    /// Button `button` was released.
    ButtonUp { instance: InstanceId, button: usize },
    /// A joystick was connected (or found at startup).
    DeviceAdded {
        instance: InstanceId,
        identity: JoystickIdentity,
    },
    /// A joystick disconnected.
    DeviceRemoved { instance: InstanceId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_display() {
        assert_eq!(InstanceId(7).to_string(), "#7");
    }

    #[test]
    fn test_identity_display() {
        let identity = JoystickIdentity {
            name: "Pad".to_string(),
            guid: JoystickIdentity::guid_from_ids(3, 1, 2, 0x10),
            path: PathBuf::from("/dev/input/event4"),
        };
        assert_eq!(identity.to_string(), "Pad [0003000100020010] at /dev/input/event4");
    }
}
