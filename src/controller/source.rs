//! Trait abstraction for joystick input to enable testing

use super::event::{InputEvent, InstanceId};
use crate::error::Result;

/// Where joystick events and axis readings come from.
///
/// Implementations must never block: the control loop calls
/// [`poll_events`](InputSource::poll_events) once per tick.
pub trait InputSource {
    /// Drains every event that happened since the previous call, oldest first.
    ///
    /// Axis readings returned by [`axes`](InputSource::axes) are refreshed by
    /// this call.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>>;

    /// Current numbered axis readings of a connected joystick, each in
    /// -1.0..=1.0. `None` for unknown instances.
    fn axes(&self, instance: InstanceId) -> Option<&[f32]>;

    /// Plays a short rumble on the joystick.
    fn rumble(&mut self, instance: InstanceId) -> Result<()>;
}
