//! # Controller Module
//!
//! Joystick input handling and the PTZ control core.
//!
//! This module handles:
//! - Joystick detection, hot-plug and state polling via evdev
//! - Numbering axes and buttons the way game controller libraries do
//! - Applying the deadzone (and optional expo curve)
//! - Choosing which connected joystick steers the camera
//! - Integrating axis input into bounded pan/tilt/zoom setpoints

pub mod calibration;
pub mod event;
pub mod joystick;
pub mod mapper;
pub mod ptz;
pub mod selector;
pub mod source;
