//! # Control Session
//!
//! One pass of the steering loop: drain joystick events, keep the selection
//! up to date, run the PTZ controller and write the result to the camera.
//!
//! The step never sleeps. The caller paces it and decides what to do with
//! [`StepOutcome::Waiting`]; any error returned is fatal.

use tracing::debug;

use crate::camera::{send_ptz, ControlPort};
use crate::config::Config;
use crate::controller::calibration::Calibration;
use crate::controller::event::InputEvent;
use crate::controller::ptz::{AxisSample, ButtonEdge, PtzController, PtzLimits, PtzState, MIN_AXES};
use crate::controller::selector::{DeviceSelector, Selection};
use crate::controller::source::InputSource;
use crate::error::{PtzError, Result};

/// What one step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The setpoint was written to the camera.
    Sent(PtzState),
    /// No joystick is selected; nothing was written.
    Waiting,
}

/// Input source, selector, controller and camera for one run.
pub struct Session<I, P> {
    input: I,
    port: P,
    selector: DeviceSelector,
    controller: PtzController,
}

impl<I: InputSource, P: ControlPort> Session<I, P> {
    /// Builds a session from already-validated configuration.
    pub fn new(input: I, port: P, config: &Config) -> Self {
        let controller = PtzController::new(
            PtzLimits::from_config(&config.ptz),
            Calibration::new(config.joystick.deadzone, config.joystick.expo),
        );
        Self {
            input,
            port,
            selector: DeviceSelector::new(config.joystick.pattern()),
            controller,
        }
    }

    #[must_use]
    pub fn selector(&self) -> &DeviceSelector {
        &self.selector
    }

    #[must_use]
    pub fn controller(&self) -> &PtzController {
        &self.controller
    }

    #[must_use]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Runs one pass of the loop.
    ///
    /// # Errors
    ///
    /// - [`PtzError::AmbiguousJoystick`] when several joysticks match
    /// - [`PtzError::InsufficientAxes`] when the selected joystick has fewer
    ///   than three axes
    /// - [`PtzError::ControlFailed`] when a camera write fails
    /// - [`PtzError::Joystick`] when the input backend fails
    pub fn step(&mut self) -> Result<StepOutcome> {
        let mut edges = Vec::new();

        for event in self.input.poll_events()? {
            match event {
                InputEvent::DeviceAdded { instance, identity } => {
                    self.selector.device_added(instance, identity);
                }
                InputEvent::DeviceRemoved { instance } => {
                    if self.selector.device_removed(instance) {
                        self.controller.forget_input();
                        edges.clear();
                    }
                }
                InputEvent::ButtonDown { instance, button } => {
                    if self.selector.is_active(instance) {
                        edges.push(ButtonEdge::Down(button));
                    }
                }
                InputEvent::ButtonUp { instance, button } => {
                    if self.selector.is_active(instance) {
                        edges.push(ButtonEdge::Up(button));
                    }
                }
            }
        }

        let instance = match self.selector.resolve()? {
            Selection::Active { instance, .. } => instance,
            Selection::Waiting => return Ok(StepOutcome::Waiting),
        };

        let axes = self.input.axes(instance).unwrap_or_default();
        let Some(sample) = AxisSample::from_axes(axes) else {
            let name = self
                .selector
                .active_identity()
                .map_or_else(|| instance.to_string(), |identity| identity.name.clone());
            return Err(PtzError::InsufficientAxes {
                name,
                found: axes.len(),
                required: MIN_AXES,
            });
        };

        let output = self.controller.tick(&sample, &edges);

        if output.feedback {
            if let Err(e) = self.input.rumble(instance) {
                debug!("No rumble on joystick {}: {}", instance, e);
            }
        }

        send_ptz(&mut self.port, &output.state)?;
        Ok(StepOutcome::Sent(output.state))
    }
}
