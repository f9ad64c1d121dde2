//! # Joystick Layout Mapper Module
//!
//! Turns the raw state of a Linux input device into the numbered axes and
//! buttons the PTZ controller works with.
//!
//! ## Axis Numbering
//!
//! Absolute axes are numbered in ascending ABS code order, skipping the hat
//! switches and everything from `ABS_MISC` upwards:
//!
//! | Code range | Examples | Numbered |
//! |------------|----------|----------|
//! | 0x00-0x0f | ABS_X, ABS_Y, ABS_Z, ABS_RX, ABS_THROTTLE | yes |
//! | 0x10-0x17 | ABS_HAT0X .. ABS_HAT3Y | no (hats) |
//! | 0x18-0x27 | ABS_PRESSURE, ABS_TILT_X | yes |
//! | 0x28+ | ABS_MISC, multitouch | no |
//!
//! So a typical flight stick reports axis 0 = X, 1 = Y, 2 = twist (RZ) or
//! throttle, and a gamepad reports 0/1 = left stick, 2/3 = right stick or
//! triggers.
//!
//! ## Button Numbering
//!
//! Joystick and gamepad button codes (`BTN_JOYSTICK` 0x120 and up) come
//! first, then the `BTN_MISC` block (0x100-0x11f). A gamepad's south face
//! button (`BTN_SOUTH`) is therefore button 0 and a stick's trigger
//! (`BTN_TRIGGER`) is button 0.
//!
//! ## Usage
//!
//! ```
//! use camera_ptz::controller::mapper::{AxisRange, DeviceLayout};
//!
//! let layout = DeviceLayout::new(
//!     vec![(0x00, AxisRange::new(0, 255)), (0x01, AxisRange::new(0, 255))],
//!     vec![0x130, 0x131],
//! );
//! let axes = layout.normalize_axes(|code| if code == 0x00 { 255 } else { 0 });
//! assert_eq!(axes, vec![1.0, -1.0]);
//! ```

/// First ABS code of the hat switch block.
pub const ABS_HAT0X: u16 = 0x10;
/// Last ABS code of the hat switch block.
pub const ABS_HAT3Y: u16 = 0x17;
/// First ABS code that is never numbered as an axis.
pub const ABS_MISC: u16 = 0x28;

/// Start of the miscellaneous button block.
pub const BTN_MISC: u16 = 0x100;
/// Start of the joystick/gamepad button block.
pub const BTN_JOYSTICK: u16 = 0x120;
/// End (exclusive) of the joystick/gamepad button block.
pub const BTN_GAMEPAD_END: u16 = 0x140;
/// Highest key code the kernel defines.
pub const KEY_MAX: u16 = 0x2ff;

/// `EV_KEY` value of a release.
pub const KEY_RELEASED: i32 = 0;
/// `EV_KEY` value of a press. Autorepeat (2) is not a new press.
pub const KEY_PRESSED: i32 = 1;

/// Reported bounds of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub minimum: i32,
    pub maximum: i32,
}

impl AxisRange {
    #[must_use]
    pub fn new(minimum: i32, maximum: i32) -> Self {
        Self { minimum, maximum }
    }

    /// Maps a raw reading onto -1.0..=1.0.
    ///
    /// Degenerate ranges (`maximum <= minimum`) read as centered.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::mapper::AxisRange;
    ///
    /// let range = AxisRange::new(-32768, 32767);
    /// assert_eq!(range.normalize(-32768), -1.0);
    /// assert_eq!(range.normalize(32767), 1.0);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f32 {
        if self.maximum <= self.minimum {
            return 0.0;
        }
        let span = f64::from(self.maximum) - f64::from(self.minimum);
        let offset = f64::from(raw) - f64::from(self.minimum);
        ((offset / span) * 2.0 - 1.0).clamp(-1.0, 1.0) as f32
    }
}

/// True for ABS codes that are numbered as joystick axes.
#[must_use]
pub fn is_numbered_axis(code: u16) -> bool {
    code < ABS_MISC && !(ABS_HAT0X..=ABS_HAT3Y).contains(&code)
}

/// True for key codes that are numbered as joystick buttons.
#[must_use]
pub fn is_numbered_button(code: u16) -> bool {
    (BTN_MISC..=KEY_MAX).contains(&code)
}

/// True for key codes only joysticks and gamepads report.
#[must_use]
pub fn is_joystick_button(code: u16) -> bool {
    (BTN_JOYSTICK..BTN_GAMEPAD_END).contains(&code)
}

/// Numbered axes and buttons of one device, fixed when the device is opened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceLayout {
    axes: Vec<(u16, AxisRange)>,
    buttons: Vec<u16>,
}

impl DeviceLayout {
    /// Builds a layout from the device's supported ABS codes (with ranges)
    /// and key codes. Codes that are not numbered are dropped; order of the
    /// inputs does not matter.
    #[must_use]
    pub fn new(
        axes: impl IntoIterator<Item = (u16, AxisRange)>,
        buttons: impl IntoIterator<Item = u16>,
    ) -> Self {
        let mut axes: Vec<(u16, AxisRange)> = axes
            .into_iter()
            .filter(|(code, _)| is_numbered_axis(*code))
            .collect();
        axes.sort_by_key(|(code, _)| *code);
        axes.dedup_by_key(|(code, _)| *code);

        let mut buttons: Vec<u16> = buttons
            .into_iter()
            .filter(|code| is_numbered_button(*code))
            .collect();
        // Joystick block first, then the misc block, each in code order
        buttons.sort_by_key(|code| (*code < BTN_JOYSTICK, *code));
        buttons.dedup();

        Self { axes, buttons }
    }

    /// Number of numbered axes.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of numbered buttons.
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// ABS code behind axis `index`.
    #[must_use]
    pub fn axis_code(&self, index: usize) -> Option<u16> {
        self.axes.get(index).map(|(code, _)| *code)
    }

    /// Key code behind button `index`.
    #[must_use]
    pub fn button_code(&self, index: usize) -> Option<u16> {
        self.buttons.get(index).copied()
    }

    /// Button number of key `code`, if it is numbered.
    #[must_use]
    pub fn button_index(&self, code: u16) -> Option<usize> {
        self.buttons.iter().position(|button| *button == code)
    }

    /// Reads every numbered axis through `raw_value` and normalizes it.
    pub fn normalize_axes(&self, raw_value: impl Fn(u16) -> i32) -> Vec<f32> {
        self.axes
            .iter()
            .map(|(code, range)| range.normalize(raw_value(*code)))
            .collect()
    }

    /// Reads every numbered button through `is_pressed`.
    pub fn button_states(&self, is_pressed: impl Fn(u16) -> bool) -> Vec<bool> {
        self.buttons.iter().map(|code| is_pressed(*code)).collect()
    }
}

/// A press or release of one numbered button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonChange {
    pub button: usize,
    pub pressed: bool,
}

impl DeviceLayout {
    /// Turns `(key code, value)` pairs from the kernel event queue into
    /// button changes, in arrival order.
    ///
    /// `held` is the pressed state of every button and is updated as events
    /// are applied. Autorepeats, keys without a button number, presses of a
    /// held button and releases of a released one produce nothing, so every
    /// reported press is followed by exactly one release.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::mapper::{ButtonChange, DeviceLayout};
    ///
    /// let layout = DeviceLayout::new(vec![], vec![0x130, 0x131]);
    /// let mut held = vec![false, false];
    ///
    /// // Tapped between two polls
    /// let changes = layout.key_changes(&mut held, [(0x131, 1), (0x131, 0)]);
    /// assert_eq!(changes, vec![
    ///     ButtonChange { button: 1, pressed: true },
    ///     ButtonChange { button: 1, pressed: false },
    /// ]);
    /// assert_eq!(held, vec![false, false]);
    /// ```
    pub fn key_changes(
        &self,
        held: &mut Vec<bool>,
        events: impl IntoIterator<Item = (u16, i32)>,
    ) -> Vec<ButtonChange> {
        held.resize(self.buttons.len(), false);

        let mut changes = Vec::new();
        for (code, value) in events {
            let pressed = match value {
                KEY_PRESSED => true,
                KEY_RELEASED => false,
                _ => continue,
            };
            let Some(button) = self.button_index(code) else {
                continue;
            };
            if held[button] != pressed {
                held[button] = pressed;
                changes.push(ButtonChange { button, pressed });
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Normalization Tests ====================

    #[test]
    fn test_normalize_unsigned_range() {
        let range = AxisRange::new(0, 255);
        assert_eq!(range.normalize(0), -1.0);
        assert_eq!(range.normalize(255), 1.0);
        assert!(range.normalize(128).abs() < 0.01);
    }

    #[test]
    fn test_normalize_signed_range() {
        let range = AxisRange::new(-32768, 32767);
        assert!(range.normalize(0).abs() < 0.001);
        assert_eq!(range.normalize(-32768), -1.0);
    }

    #[test]
    fn test_normalize_out_of_range_clamps() {
        let range = AxisRange::new(0, 1023);
        assert_eq!(range.normalize(5000), 1.0);
        assert_eq!(range.normalize(-20), -1.0);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(AxisRange::new(5, 5).normalize(5), 0.0);
        assert_eq!(AxisRange::new(10, 0).normalize(3), 0.0);
    }

    // ==================== Numbering Tests ====================

    #[test]
    fn test_hats_are_not_axes() {
        assert!(is_numbered_axis(0x00));
        assert!(is_numbered_axis(0x0f));
        assert!(!is_numbered_axis(ABS_HAT0X));
        assert!(!is_numbered_axis(ABS_HAT3Y));
        assert!(is_numbered_axis(0x18));
        assert!(!is_numbered_axis(ABS_MISC));
        assert!(!is_numbered_axis(0x35));
    }

    #[test]
    fn test_keyboard_keys_are_not_buttons() {
        assert!(!is_numbered_button(0x1e)); // KEY_A
        assert!(is_numbered_button(0x130)); // BTN_SOUTH
        assert!(is_numbered_button(0x100)); // BTN_0
        assert!(!is_numbered_button(0x300));
    }

    #[test]
    fn test_joystick_buttons() {
        assert!(is_joystick_button(0x120)); // BTN_TRIGGER
        assert!(is_joystick_button(0x130)); // BTN_SOUTH
        assert!(!is_joystick_button(0x110)); // BTN_LEFT (mouse)
        assert!(!is_joystick_button(0x140)); // BTN_TOOL_PEN
    }

    #[test]
    fn test_layout_axis_order() {
        let layout = DeviceLayout::new(
            vec![
                (0x05, AxisRange::new(0, 255)), // ABS_RZ
                (0x11, AxisRange::new(-1, 1)),  // ABS_HAT0Y
                (0x00, AxisRange::new(0, 255)), // ABS_X
                (0x06, AxisRange::new(0, 255)), // ABS_THROTTLE
                (0x01, AxisRange::new(0, 255)), // ABS_Y
            ],
            vec![],
        );
        assert_eq!(layout.axis_count(), 4);
        assert_eq!(layout.axis_code(0), Some(0x00));
        assert_eq!(layout.axis_code(1), Some(0x01));
        assert_eq!(layout.axis_code(2), Some(0x05));
        assert_eq!(layout.axis_code(3), Some(0x06));
        assert_eq!(layout.axis_code(4), None);
    }

    #[test]
    fn test_layout_button_order() {
        let layout = DeviceLayout::new(
            vec![],
            vec![0x101, 0x133, 0x130, 0x1e, 0x100, 0x131],
        );
        assert_eq!(layout.button_count(), 5);
        assert_eq!(layout.button_code(0), Some(0x130));
        assert_eq!(layout.button_code(1), Some(0x131));
        assert_eq!(layout.button_code(2), Some(0x133));
        assert_eq!(layout.button_code(3), Some(0x100));
        assert_eq!(layout.button_code(4), Some(0x101));
    }

    #[test]
    fn test_layout_reads_axes_by_code() {
        let layout = DeviceLayout::new(
            vec![(0x01, AxisRange::new(0, 100)), (0x00, AxisRange::new(0, 100))],
            vec![],
        );
        let axes = layout.normalize_axes(|code| if code == 0x00 { 75 } else { 0 });
        assert_eq!(axes, vec![0.5, -1.0]);
    }

    #[test]
    fn test_layout_reads_buttons_by_code() {
        let layout = DeviceLayout::new(vec![], vec![0x130, 0x131, 0x132]);
        let states = layout.button_states(|code| code == 0x131);
        assert_eq!(states, vec![false, true, false]);
    }

    #[test]
    fn test_button_index() {
        let layout = DeviceLayout::new(vec![], vec![0x101, 0x130, 0x131]);
        assert_eq!(layout.button_index(0x130), Some(0));
        assert_eq!(layout.button_index(0x101), Some(2));
        assert_eq!(layout.button_index(0x1e), None);
    }

    // ==================== Key Event Tests ====================

    fn gamepad() -> DeviceLayout {
        // BTN_SOUTH, BTN_EAST, BTN_NORTH, BTN_WEST
        DeviceLayout::new(vec![], vec![0x130, 0x131, 0x133, 0x134])
    }

    #[test]
    fn test_tap_within_one_poll_yields_both_edges() {
        let layout = gamepad();
        let mut held = vec![false; 4];
        let changes = layout.key_changes(&mut held, [(0x130, KEY_PRESSED), (0x130, KEY_RELEASED)]);
        assert_eq!(
            changes,
            vec![
                ButtonChange { button: 0, pressed: true },
                ButtonChange { button: 0, pressed: false },
            ]
        );
        assert_eq!(held, vec![false; 4]);
    }

    #[test]
    fn test_interleaved_buttons_keep_arrival_order() {
        let layout = gamepad();
        let mut held = vec![false; 4];
        let changes = layout.key_changes(
            &mut held,
            [(0x134, 1), (0x130, 1), (0x134, 0), (0x131, 1)],
        );
        assert_eq!(
            changes,
            vec![
                ButtonChange { button: 3, pressed: true },
                ButtonChange { button: 0, pressed: true },
                ButtonChange { button: 3, pressed: false },
                ButtonChange { button: 1, pressed: true },
            ]
        );
        assert_eq!(held, vec![true, true, false, false]);
    }

    #[test]
    fn test_autorepeat_and_unknown_keys_are_ignored() {
        let layout = gamepad();
        let mut held = vec![false; 4];
        let changes = layout.key_changes(&mut held, [(0x130, 1), (0x130, 2), (0x130, 2), (0x1e, 1)]);
        assert_eq!(changes, vec![ButtonChange { button: 0, pressed: true }]);
    }

    #[test]
    fn test_redundant_events_are_dropped() {
        let layout = gamepad();
        // Button 1 was already held when the device was opened
        let mut held = vec![false, true, false, false];
        let changes = layout.key_changes(&mut held, [(0x131, 1), (0x130, 0), (0x131, 0)]);
        assert_eq!(changes, vec![ButtonChange { button: 1, pressed: false }]);
    }

    #[test]
    fn test_held_grows_to_button_count() {
        let layout = gamepad();
        let mut held = Vec::new();
        let changes = layout.key_changes(&mut held, [(0x133, 1)]);
        assert_eq!(changes, vec![ButtonChange { button: 2, pressed: true }]);
        assert_eq!(held.len(), 4);
    }
}
