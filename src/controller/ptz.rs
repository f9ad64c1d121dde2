//! # PTZ Controller Module
//!
//! Turns joystick axes and button presses into absolute pan, tilt and zoom
//! setpoints for the camera.
//!
//! ## Axis Assignments
//!
//! | Axis | Input | Mode |
//! |------|-------|------|
//! | 0 | Pan | Rate: deflection is added every tick |
//! | 1 | Tilt (inverted, push forward to look up) | Rate |
//! | 2 | Zoom | Rate |
//! | 3 | Zoom (alternate) | Absolute: full range maps onto min..max zoom |
//!
//! ## Button Assignments
//!
//! | Button | Function |
//! |--------|----------|
//! | 0 | Home: pan, tilt and zoom back to their defaults, with a rumble |
//! | 1 | Re-apply the alternate zoom axis on the next tick |
//! | 3 (hold) | Zoom fully out; releasing restores the previous zoom |
//!
//! ## Tick Order
//!
//! 1. Deadzone every axis
//! 2. Apply button presses and releases in the order they arrived
//! 3. Integrate pan and tilt rates, clamp
//! 4. Integrate the zoom rate, clamp
//! 5. If the alternate zoom axis moved (or was re-armed), zoom follows it
//! 6. While zoom-out is held, zoom is pinned to its minimum
//! 7. Clamp everything once more
//!
//! The controller keeps an unrounded position so that slow rates build up
//! over several ticks; only the setpoint it reports is rounded.
//!
//! ## Usage
//!
//! ```
//! use camera_ptz::controller::calibration::Calibration;
//! use camera_ptz::controller::ptz::{AxisSample, PtzController, PtzLimits};
//!
//! let mut controller = PtzController::new(PtzLimits::default(), Calibration::default());
//! let sample = AxisSample::from_axes(&[1.0, 0.0, 0.0]).unwrap();
//!
//! let output = controller.tick(&sample, &[]);
//! assert_eq!(output.state.pan, 5000);
//! ```

use tracing::{debug, info};

use super::calibration::Calibration;
use crate::config::PtzConfig;

/// Fewest axes a joystick needs to drive pan, tilt and zoom.
pub const MIN_AXES: usize = 3;

/// Button indices with a fixed meaning.
pub mod buttons {
    /// Return to the home position
    pub const RESET: usize = 0;
    /// Re-apply the alternate zoom axis
    pub const ALT_ZOOM: usize = 1;
    /// Hold to zoom fully out
    pub const ZOOM_OUT: usize = 3;
}

/// Absolute camera position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtzState {
    pub pan: i32,
    pub tilt: i32,
    pub zoom: i32,
}

impl Default for PtzState {
    fn default() -> Self {
        Self {
            pan: 0,
            tilt: 0,
            zoom: 100,
        }
    }
}

/// Inclusive bounds of one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i32,
    pub max: i32,
}

impl Bounds {
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn clamp_f64(&self, value: f64) -> f64 {
        value.clamp(f64::from(self.min), f64::from(self.max))
    }

    /// Adds `rate * speed` to `value` and clamps. The fraction is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::ptz::Bounds;
    ///
    /// let zoom = Bounds::new(100, 300);
    /// assert_eq!(zoom.integrate(100.0, 0.25, 2.0), 100.5);
    /// assert_eq!(zoom.integrate(299.0, 1.0, 10.0), 300.0);
    /// ```
    #[must_use]
    pub fn integrate(&self, value: f64, rate: f32, speed: f32) -> f64 {
        self.clamp_f64(value + f64::from(rate) * f64::from(speed))
    }

    /// Maps -1.0..=1.0 linearly onto `min..=max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::ptz::Bounds;
    ///
    /// let zoom = Bounds::new(100, 300);
    /// assert_eq!(zoom.map_absolute(-1.0), 100.0);
    /// assert_eq!(zoom.map_absolute(0.0), 200.0);
    /// assert_eq!(zoom.map_absolute(1.0), 300.0);
    /// ```
    #[must_use]
    pub fn map_absolute(&self, position: f32) -> f64 {
        let span = f64::from(self.max) - f64::from(self.min);
        self.clamp_f64(f64::from(self.min) + span * (1.0 + f64::from(position)) / 2.0)
    }
}

/// Unrounded setpoint held between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    pan: f64,
    tilt: f64,
    zoom: f64,
}

impl From<PtzState> for Position {
    fn from(state: PtzState) -> Self {
        Self {
            pan: f64::from(state.pan),
            tilt: f64::from(state.tilt),
            zoom: f64::from(state.zoom),
        }
    }
}

impl Position {
    /// Nearest whole setpoint. Bounds are integers, so a clamped position
    /// rounds to an in-bounds state.
    fn rounded(&self) -> PtzState {
        PtzState {
            pan: self.pan.round() as i32,
            tilt: self.tilt.round() as i32,
            zoom: self.zoom.round() as i32,
        }
    }
}

/// Speeds, bounds and home position of the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PtzLimits {
    /// Pan steps per tick at full deflection.
    pub pan_speed: f32,
    /// Tilt steps per tick at full deflection.
    pub tilt_speed: f32,
    /// Zoom steps per tick at full deflection.
    pub zoom_speed: f32,
    pub pan: Bounds,
    pub tilt: Bounds,
    pub zoom: Bounds,
    /// Where the reset button returns to.
    pub home: PtzState,
    /// Let the alternate zoom axis take over on the first tick of a joystick.
    pub alt_zoom_on_start: bool,
}

impl Default for PtzLimits {
    fn default() -> Self {
        Self::from_config(&PtzConfig::default())
    }
}

impl PtzLimits {
    #[must_use]
    pub fn from_config(config: &PtzConfig) -> Self {
        Self {
            pan_speed: config.pan_speed,
            tilt_speed: config.tilt_speed,
            zoom_speed: config.zoom_speed,
            pan: Bounds::new(config.min_pan, config.max_pan),
            tilt: Bounds::new(config.min_tilt, config.max_tilt),
            zoom: Bounds::new(config.min_zoom, config.max_zoom),
            home: PtzState {
                pan: config.pan_default,
                tilt: config.tilt_default,
                zoom: config.zoom_default,
            },
            alt_zoom_on_start: config.alt_zoom_on_start,
        }
    }

    /// Clamps every control into its bounds.
    #[must_use]
    pub fn clamp(&self, state: PtzState) -> PtzState {
        PtzState {
            pan: self.pan.clamp(state.pan),
            tilt: self.tilt.clamp(state.tilt),
            zoom: self.zoom.clamp(state.zoom),
        }
    }

    fn clamp_position(&self, position: Position) -> Position {
        Position {
            pan: self.pan.clamp_f64(position.pan),
            tilt: self.tilt.clamp_f64(position.tilt),
            zoom: self.zoom.clamp_f64(position.zoom),
        }
    }
}

/// Controller modes driven by buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
    /// Apply the alternate zoom axis on the next computation, then clear.
    pub force_alt_zoom: bool,
    /// Zoom-out button is held.
    pub force_zoom_out: bool,
    /// Zoom to restore when the zoom-out button is released.
    pub saved_zoom: i32,
}

/// One tick's worth of axis readings, each in -1.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSample {
    pub pan: f32,
    /// Already inverted so that positive tilts up.
    pub tilt: f32,
    pub zoom: f32,
    /// Absent on joysticks with only three axes.
    pub zoom_alt: Option<f32>,
}

impl AxisSample {
    /// Picks the PTZ axes out of a joystick's numbered axes.
    ///
    /// Returns `None` when fewer than [`MIN_AXES`] axes are available.
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::controller::ptz::AxisSample;
    ///
    /// let sample = AxisSample::from_axes(&[0.2, 0.5, -0.1, 1.0]).unwrap();
    /// assert_eq!(sample.tilt, -0.5);
    /// assert_eq!(sample.zoom_alt, Some(1.0));
    ///
    /// assert!(AxisSample::from_axes(&[0.0, 0.0]).is_none());
    /// ```
    #[must_use]
    pub fn from_axes(axes: &[f32]) -> Option<Self> {
        if axes.len() < MIN_AXES {
            return None;
        }
        Some(Self {
            pan: axes[0],
            tilt: -axes[1],
            zoom: axes[2],
            zoom_alt: axes.get(3).copied(),
        })
    }

    fn calibrated(&self, calibration: &Calibration) -> Self {
        Self {
            pan: calibration.apply(self.pan),
            tilt: calibration.apply(self.tilt),
            zoom: calibration.apply(self.zoom),
            zoom_alt: self.zoom_alt.map(|value| calibration.apply(value)),
        }
    }
}

/// A button press or release on the selected joystick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Down(usize),
    Up(usize),
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutput {
    /// Setpoint to send to the camera.
    pub state: PtzState,
    /// The home gesture fired; the joystick should rumble.
    pub feedback: bool,
}

/// Owns the PTZ setpoint and the button modes.
#[derive(Debug, Clone)]
pub struct PtzController {
    limits: PtzLimits,
    calibration: Calibration,
    position: Position,
    flags: ModeFlags,
    /// Alternate zoom reading of the previous tick; `None` right after a
    /// joystick is (re)selected.
    previous_alt: Option<f32>,
}

impl PtzController {
    /// Creates a controller at the home position.
    #[must_use]
    pub fn new(limits: PtzLimits, calibration: Calibration) -> Self {
        let state = limits.clamp(limits.home);
        Self {
            flags: ModeFlags {
                saved_zoom: state.zoom,
                ..ModeFlags::default()
            },
            limits,
            calibration,
            position: Position::from(state),
            previous_alt: None,
        }
    }

    /// Current setpoint, rounded to whole control steps.
    #[must_use]
    pub fn state(&self) -> PtzState {
        self.position.rounded()
    }

    #[must_use]
    pub fn flags(&self) -> ModeFlags {
        self.flags
    }

    #[must_use]
    pub fn limits(&self) -> &PtzLimits {
        &self.limits
    }

    /// Drops everything tied to the joystick that was in use.
    ///
    /// The next tick treats the alternate zoom axis as freshly seen, and a
    /// held zoom-out ends as if its button had been released, since that
    /// release can no longer arrive.
    pub fn forget_input(&mut self) {
        self.previous_alt = None;
        self.flags.force_alt_zoom = false;
        if self.flags.force_zoom_out {
            self.flags.force_zoom_out = false;
            let zoom = self.limits.zoom.clamp(self.flags.saved_zoom);
            self.position.zoom = f64::from(zoom);
            info!("Zoom-out released with its joystick, zoom back to {}", zoom);
        }
    }

    fn apply_edge(&mut self, edge: ButtonEdge) -> bool {
        match edge {
            ButtonEdge::Down(buttons::RESET) => {
                let home = self.limits.clamp(self.limits.home);
                self.position = Position::from(home);
                info!("Home: pan {} tilt {} zoom {}", home.pan, home.tilt, home.zoom);
                return true;
            }
            ButtonEdge::Down(buttons::ALT_ZOOM) => {
                debug!("Alternate zoom axis re-armed");
                self.flags.force_alt_zoom = true;
            }
            ButtonEdge::Down(buttons::ZOOM_OUT) => {
                if !self.flags.force_zoom_out {
                    self.flags.saved_zoom = self.state().zoom;
                    self.flags.force_zoom_out = true;
                    info!("Zoom-out held (saved zoom {})", self.flags.saved_zoom);
                }
            }
            ButtonEdge::Up(buttons::ZOOM_OUT) => {
                if self.flags.force_zoom_out {
                    self.flags.force_zoom_out = false;
                    self.position.zoom = f64::from(self.flags.saved_zoom);
                    info!("Zoom-out released, zoom back to {}", self.flags.saved_zoom);
                }
            }
            ButtonEdge::Down(_) | ButtonEdge::Up(_) => {}
        }
        false
    }

    /// Advances the controller by one tick.
    ///
    /// `edges` are the selected joystick's button changes since the last
    /// tick, oldest first. Performs no I/O.
    pub fn tick(&mut self, sample: &AxisSample, edges: &[ButtonEdge]) -> TickOutput {
        let input = sample.calibrated(&self.calibration);

        let mut feedback = false;
        for &edge in edges {
            feedback |= self.apply_edge(edge);
        }

        let limits = &self.limits;
        let mut next = self.position;
        next.pan = limits.pan.integrate(next.pan, input.pan, limits.pan_speed);
        next.tilt = limits.tilt.integrate(next.tilt, input.tilt, limits.tilt_speed);
        next.zoom = limits.zoom.integrate(next.zoom, input.zoom, limits.zoom_speed);

        if let Some(alt) = input.zoom_alt {
            let moved = match self.previous_alt {
                Some(previous) => previous != alt,
                None => limits.alt_zoom_on_start,
            };
            if moved || self.flags.force_alt_zoom {
                next.zoom = limits.zoom.map_absolute(alt);
            }
        }
        self.flags.force_alt_zoom = false;
        self.previous_alt = input.zoom_alt;

        if self.flags.force_zoom_out {
            next.zoom = f64::from(limits.zoom.min);
        }

        self.position = limits.clamp_position(next);
        let state = self.position.rounded();

        debug!(
            "Axis: {:.1} {:.1} {:.1}    PTZ: {} {} {}",
            input.pan, input.tilt, input.zoom, state.pan, state.tilt, state.zoom
        );

        TickOutput { state, feedback }
    }
}
