//! # Joystick Input Module
//!
//! Finds joysticks among the Linux evdev input devices and reports their
//! axes, buttons and hot-plug events.
//!
//! ## Detection
//!
//! An `/dev/input/event*` node counts as a joystick when it reports both
//! `ABS_X` and `ABS_Y` and at least one joystick or gamepad button
//! (`BTN_TRIGGER` .. `BTN_THUMBR`). Keyboards, mice and touchpads are skipped.
//!
//! ## Hot-plug
//!
//! `/dev/input` is rescanned at a fixed interval (and on the first poll).
//! A device whose state can no longer be read has been unplugged. Nodes that
//! disappear from the directory are forgotten, so a joystick that later
//! reuses the same `eventN` name is picked up.
//!
//! ## Polling
//!
//! Devices are opened non-blocking. Each poll drains the kernel event queue
//! for button presses and releases, in the order they happened, so a tap
//! shorter than one poll still yields both edges. Axes are read with the
//! `EVIOCGABS` ioctl, since only their latest position matters.

use evdev::{
    AbsoluteAxisType, Device, FFEffect, FFEffectData, FFEffectKind, FFEffectType, FFReplay,
    FFTrigger, InputEventKind, Key,
};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use super::event::{InputEvent, InstanceId, JoystickIdentity};
use super::mapper::{is_joystick_button, AxisRange, ButtonChange, DeviceLayout};
use super::source::InputSource;
use crate::error::{PtzError, Result};

/// Directory scanned for input devices.
const INPUT_DIR: &str = "/dev/input";

/// Name used when a device reports none.
const UNKNOWN_NAME: &str = "Unknown joystick";

/// Rumble played on the home gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RumbleSettings {
    /// Motor strength, 0.0 to 1.0.
    pub strength: f32,
    /// Effect length in milliseconds.
    pub duration_ms: u16,
}

impl Default for RumbleSettings {
    fn default() -> Self {
        Self {
            strength: 0.7,
            duration_ms: 500,
        }
    }
}

/// What `--list-joysticks` prints for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoystickSummary {
    pub instance: InstanceId,
    pub identity: JoystickIdentity,
    pub axes: usize,
    pub buttons: usize,
}

struct OpenJoystick {
    device: Device,
    identity: JoystickIdentity,
    layout: DeviceLayout,
    axes: Vec<f32>,
    buttons: Vec<bool>,
    rumble: Option<FFEffect>,
}

impl OpenJoystick {
    /// Takes `device` as a joystick, or returns `None` if it is not one.
    fn detect(path: &Path, device: Device) -> Option<Self> {
        let abs = device.supported_absolute_axes()?;
        if !abs.contains(AbsoluteAxisType::ABS_X) || !abs.contains(AbsoluteAxisType::ABS_Y) {
            return None;
        }
        let keys = device.supported_keys()?;
        if !keys.iter().any(|key| is_joystick_button(key.code())) {
            return None;
        }

        let abs_state = device.get_abs_state().ok()?;
        let ranges: Vec<(u16, AxisRange)> = abs
            .iter()
            .filter_map(|axis| {
                abs_state
                    .get(usize::from(axis.0))
                    .map(|info| (axis.0, AxisRange::new(info.minimum, info.maximum)))
            })
            .collect();
        let layout = DeviceLayout::new(ranges, keys.iter().map(|key| key.code()));

        let id = device.input_id();
        let identity = JoystickIdentity {
            name: device.name().unwrap_or(UNKNOWN_NAME).to_string(),
            guid: JoystickIdentity::guid_from_ids(
                id.bus_type().0,
                id.vendor(),
                id.product(),
                id.version(),
            ),
            path: path.to_path_buf(),
        };

        fcntl(device.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).ok()?;

        // Buttons already held when the device shows up are not presses
        let key_state = device.get_key_state().ok()?;
        let buttons = layout.button_states(|code| key_state.contains(Key::new(code)));

        let mut joystick = Self {
            device,
            identity,
            layout,
            axes: Vec::new(),
            buttons,
            rumble: None,
        };
        joystick.refresh().ok()?;
        Some(joystick)
    }

    /// Reads queued key events and the current axes, returning button
    /// changes in arrival order.
    fn refresh(&mut self) -> io::Result<Vec<ButtonChange>> {
        let keys = self.drain_key_events()?;
        let abs_state = self.device.get_abs_state()?;

        self.axes = self.layout.normalize_axes(|code| {
            abs_state
                .get(usize::from(code))
                .map_or(0, |info| info.value)
        });

        Ok(self.layout.key_changes(&mut self.buttons, keys))
    }

    /// Empties the kernel event queue, keeping `(code, value)` of key events.
    ///
    /// After a queue overflow evdev inserts the key events needed to catch up
    /// with the real key state.
    fn drain_key_events(&mut self) -> io::Result<Vec<(u16, i32)>> {
        let mut keys = Vec::new();
        loop {
            match self.device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        if let InputEventKind::Key(key) = event.kind() {
                            keys.push((key.code(), event.value()));
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(keys),
                Err(e) => return Err(e),
            }
        }
    }

    fn rumble(&mut self, settings: RumbleSettings) -> io::Result<()> {
        if self.rumble.is_none() {
            let supported = self
                .device
                .supported_ff()
                .map_or(false, |ff| ff.contains(FFEffectType::FF_RUMBLE));
            if !supported {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "device has no rumble motor",
                ));
            }

            let magnitude = (settings.strength.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16;
            let effect = self.device.upload_ff_effect(FFEffectData {
                direction: 0,
                trigger: FFTrigger {
                    button: 0,
                    interval: 0,
                },
                replay: FFReplay {
                    length: settings.duration_ms,
                    delay: 0,
                },
                kind: FFEffectKind::Rumble {
                    strong_magnitude: magnitude,
                    weak_magnitude: magnitude,
                },
            })?;
            self.rumble = Some(effect);
        }

        match self.rumble.as_mut() {
            Some(effect) => effect.play(1),
            None => Ok(()),
        }
    }
}

/// Joystick input from evdev devices.
pub struct EvdevInput {
    input_dir: PathBuf,
    devices: BTreeMap<InstanceId, OpenJoystick>,
    /// Paths already opened, joystick or not, while their node exists.
    known_paths: HashSet<PathBuf>,
    next_instance: u32,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
    rumble: RumbleSettings,
}

impl std::fmt::Debug for EvdevInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevInput")
            .field("input_dir", &self.input_dir)
            .field("joysticks", &self.devices.len())
            .field("rescan_interval", &self.rescan_interval)
            .finish_non_exhaustive()
    }
}

impl EvdevInput {
    /// Creates an input source scanning `/dev/input`.
    ///
    /// No device is opened until the first [`poll_events`](InputSource::poll_events).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use camera_ptz::controller::joystick::{EvdevInput, RumbleSettings};
    /// use camera_ptz::controller::source::InputSource;
    ///
    /// let mut input = EvdevInput::new(Duration::from_secs(1), RumbleSettings::default());
    /// for event in input.poll_events()? {
    ///     println!("{:?}", event);
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn new(rescan_interval: Duration, rumble: RumbleSettings) -> Self {
        Self::with_input_dir(INPUT_DIR, rescan_interval, rumble)
    }

    /// Creates an input source scanning a custom directory.
    #[must_use]
    pub fn with_input_dir<P: AsRef<Path>>(
        input_dir: P,
        rescan_interval: Duration,
        rumble: RumbleSettings,
    ) -> Self {
        Self {
            input_dir: input_dir.as_ref().to_path_buf(),
            devices: BTreeMap::new(),
            known_paths: HashSet::new(),
            next_instance: 0,
            rescan_interval,
            last_scan: None,
            rumble,
        }
    }

    /// Joysticks currently open, in instance order.
    #[must_use]
    pub fn summaries(&self) -> Vec<JoystickSummary> {
        self.devices
            .iter()
            .map(|(instance, joystick)| JoystickSummary {
                instance: *instance,
                identity: joystick.identity.clone(),
                axes: joystick.layout.axis_count(),
                buttons: joystick.layout.button_count(),
            })
            .collect()
    }

    fn rescan_due(&self, now: Instant) -> bool {
        self.last_scan
            .map_or(true, |last| now.duration_since(last) >= self.rescan_interval)
    }

    /// Opens every `event*` node not seen before and forgets nodes that
    /// have gone away.
    fn scan(&mut self, events: &mut Vec<InputEvent>) -> Result<()> {
        // Sorted for deterministic instance ids when several joysticks are
        // present at startup
        let present: BTreeSet<PathBuf> = std::fs::read_dir(&self.input_dir)
            .map_err(|e| {
                PtzError::Joystick(format!(
                    "Failed to read {}: {}",
                    self.input_dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with("event"))
            })
            .collect();

        // The kernel reuses freed eventN names
        self.known_paths.retain(|path| present.contains(path));

        for path in present {
            if self.known_paths.contains(&path) {
                continue;
            }
            let device = match Device::open(&path) {
                Ok(device) => device,
                Err(e) => {
                    // Permission denied or the node vanished; retry on the next scan
                    debug!("Could not open {}: {}", path.display(), e);
                    continue;
                }
            };
            self.known_paths.insert(path.clone());

            let Some(joystick) = OpenJoystick::detect(&path, device) else {
                debug!("Skipping non-joystick input device {}", path.display());
                continue;
            };

            let instance = InstanceId(self.next_instance);
            self.next_instance += 1;
            debug!(
                "Opened joystick {} with {} axes and {} buttons",
                joystick.identity,
                joystick.layout.axis_count(),
                joystick.layout.button_count()
            );
            events.push(InputEvent::DeviceAdded {
                instance,
                identity: joystick.identity.clone(),
            });
            self.devices.insert(instance, joystick);
        }

        Ok(())
    }
}

impl InputSource for EvdevInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        let mut gone = Vec::new();

        for (instance, joystick) in self.devices.iter_mut() {
            match joystick.refresh() {
                Ok(changes) => {
                    events.extend(changes.into_iter().map(|change| {
                        if change.pressed {
                            InputEvent::ButtonDown { instance: *instance, button: change.button }
                        } else {
                            InputEvent::ButtonUp { instance: *instance, button: change.button }
                        }
                    }));
                }
                Err(e) => {
                    debug!("Joystick {} unreadable: {}", joystick.identity.path.display(), e);
                    gone.push(*instance);
                }
            }
        }

        for instance in gone {
            if let Some(joystick) = self.devices.remove(&instance) {
                self.known_paths.remove(&joystick.identity.path);
            }
            events.push(InputEvent::DeviceRemoved { instance });
        }

        let now = Instant::now();
        if self.rescan_due(now) {
            self.last_scan = Some(now);
            self.scan(&mut events)?;
        }

        Ok(events)
    }

    fn axes(&self, instance: InstanceId) -> Option<&[f32]> {
        self.devices
            .get(&instance)
            .map(|joystick| joystick.axes.as_slice())
    }

    fn rumble(&mut self, instance: InstanceId) -> Result<()> {
        let settings = self.rumble;
        let joystick = self
            .devices
            .get_mut(&instance)
            .ok_or_else(|| PtzError::Joystick(format!("joystick {} is not connected", instance)))?;
        joystick
            .rumble(settings)
            .map_err(|e| PtzError::Joystick(format!("rumble failed: {}", e)))
    }
}
