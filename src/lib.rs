//! # Camera PTZ Library
//!
//! Steer a USB camera's pan, tilt and zoom with a joystick.
//!
//! This library provides the core functionality for turning joystick axes and
//! buttons into absolute PTZ setpoints and writing them to a V4L2 camera.

pub mod camera;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
