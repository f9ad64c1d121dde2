//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; a missing file section falls
//! back to the built-in defaults, which are tuned for a 4K Logitech Brio.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PtzError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub joystick: JoystickConfig,
    pub ptz: PtzConfig,
    #[serde(rename = "loop")]
    pub run_loop: LoopConfig,
    pub logging: LoggingConfig,
}

/// Camera (V4L2 device) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_device")]
    pub device: String,

    #[serde(default = "default_camera_program")]
    pub program: String,

    #[serde(default = "default_apply_presets")]
    pub apply_presets: bool,

    #[serde(default)]
    pub presets: PresetConfig,
}

/// One-shot image quality settings applied before the control loop starts
#[derive(Debug, Deserialize, Clone)]
pub struct PresetConfig {
    /// Turn off continuous autofocus and set `focus`
    #[serde(default = "default_manual")]
    pub manual_focus: bool,

    #[serde(default = "default_focus")]
    pub focus: i32,

    /// Switch to manual exposure and set `exposure_time`
    #[serde(default = "default_manual")]
    pub manual_exposure: bool,

    #[serde(default = "default_exposure_time")]
    pub exposure_time: i32,

    #[serde(default)]
    pub saturation: Option<i32>,

    #[serde(default)]
    pub sharpness: Option<i32>,
}

/// Joystick selection and input shaping
#[derive(Debug, Deserialize, Clone)]
pub struct JoystickConfig {
    #[serde(default)]
    pub name_pattern: String,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default)]
    pub expo: f32,

    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_rumble_strength")]
    pub rumble_strength: f32,

    #[serde(default = "default_rumble_duration_ms")]
    pub rumble_duration_ms: u16,
}

/// Pan/tilt/zoom speeds, bounds and home position
#[derive(Debug, Deserialize, Clone)]
pub struct PtzConfig {
    #[serde(default = "default_pan_tilt_speed")]
    pub pan_speed: f32,

    #[serde(default = "default_pan_tilt_speed")]
    pub tilt_speed: f32,

    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,

    #[serde(default = "default_min_pan_tilt")]
    pub min_pan: i32,

    #[serde(default = "default_max_pan_tilt")]
    pub max_pan: i32,

    #[serde(default = "default_min_pan_tilt")]
    pub min_tilt: i32,

    #[serde(default = "default_max_pan_tilt")]
    pub max_tilt: i32,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: i32,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: i32,

    #[serde(default)]
    pub pan_default: i32,

    #[serde(default)]
    pub tilt_default: i32,

    #[serde(default = "default_min_zoom")]
    pub zoom_default: i32,

    #[serde(default)]
    pub alt_zoom_on_start: bool,
}

/// Control loop timing
#[derive(Debug, Deserialize, Clone)]
pub struct LoopConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for a daily-rolling log file; empty logs to the console only
    #[serde(default)]
    pub dir: String,
}

// Default value functions
fn default_camera_device() -> String { "0".to_string() }
fn default_camera_program() -> String { "v4l2-ctl".to_string() }
fn default_apply_presets() -> bool { true }

fn default_manual() -> bool { true }
fn default_focus() -> i32 { 0 }
fn default_exposure_time() -> i32 { 250 }

fn default_deadzone() -> f32 { 0.1 }
fn default_rescan_interval_ms() -> u64 { 1000 }
fn default_retry_interval_ms() -> u64 { 500 }
fn default_rumble_strength() -> f32 { 0.7 }
fn default_rumble_duration_ms() -> u16 { 500 }

fn default_pan_tilt_speed() -> f32 { 5000.0 }
fn default_zoom_speed() -> f32 { 10.0 }
fn default_min_pan_tilt() -> i32 { -36000 }
fn default_max_pan_tilt() -> i32 { 36000 }
fn default_min_zoom() -> i32 { 100 }
// The Brio reports 500, but image quality falls off sharply beyond 300
fn default_max_zoom() -> i32 { 300 }

fn default_tick_interval_ms() -> u64 { 10 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: default_camera_device(),
            program: default_camera_program(),
            apply_presets: default_apply_presets(),
            presets: PresetConfig::default(),
        }
    }
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            manual_focus: default_manual(),
            focus: default_focus(),
            manual_exposure: default_manual(),
            exposure_time: default_exposure_time(),
            saturation: None,
            sharpness: None,
        }
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            name_pattern: String::new(),
            deadzone: default_deadzone(),
            expo: 0.0,
            rescan_interval_ms: default_rescan_interval_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            rumble_strength: default_rumble_strength(),
            rumble_duration_ms: default_rumble_duration_ms(),
        }
    }
}

impl Default for PtzConfig {
    fn default() -> Self {
        Self {
            pan_speed: default_pan_tilt_speed(),
            tilt_speed: default_pan_tilt_speed(),
            zoom_speed: default_zoom_speed(),
            min_pan: default_min_pan_tilt(),
            max_pan: default_max_pan_tilt(),
            min_tilt: default_min_pan_tilt(),
            max_tilt: default_max_pan_tilt(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            pan_default: 0,
            tilt_default: 0,
            zoom_default: default_min_zoom(),
            alt_zoom_on_start: false,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl JoystickConfig {
    /// Returns the configured name pattern, or `None` when it is empty.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        let pattern = self.name_pattern.trim();
        if pattern.is_empty() {
            None
        } else {
            Some(pattern)
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> PtzError {
    PtzError::Config(toml::de::Error::custom(msg))
}

fn check_interval(name: &str, value: u64) -> Result<()> {
    if value == 0 || value > 60000 {
        return Err(invalid(format!("{} must be between 1 and 60000", name)));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camera_ptz::config::Config;
    ///
    /// let config = Config::load("camera-ptz.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Examples
    ///
    /// ```
    /// use camera_ptz::config::Config;
    ///
    /// let config = Config::from_toml("[ptz]\nmax_zoom = 500\n")?;
    /// assert_eq!(config.ptz.max_zoom, 500);
    /// assert_eq!(config.ptz.min_zoom, 100);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.camera.device.trim().is_empty() {
            return Err(invalid("camera device cannot be empty"));
        }

        if self.camera.program.trim().is_empty() {
            return Err(invalid("camera program cannot be empty"));
        }

        // Deadzone must leave some travel on every axis
        if !(0.0..0.5).contains(&self.joystick.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.5"));
        }

        if !(0.0..=1.0).contains(&self.joystick.expo) {
            return Err(invalid("expo must be between 0.0 and 1.0"));
        }

        if !(0.0..=1.0).contains(&self.joystick.rumble_strength) {
            return Err(invalid("rumble_strength must be between 0.0 and 1.0"));
        }

        check_interval("rescan_interval_ms", self.joystick.rescan_interval_ms)?;
        check_interval("retry_interval_ms", self.joystick.retry_interval_ms)?;
        check_interval("tick_interval_ms", self.run_loop.tick_interval_ms)?;

        let ptz = &self.ptz;
        for (name, speed) in [
            ("pan_speed", ptz.pan_speed),
            ("tilt_speed", ptz.tilt_speed),
            ("zoom_speed", ptz.zoom_speed),
        ] {
            if !speed.is_finite() || speed < 0.0 {
                return Err(invalid(format!("{} must be a non-negative number", name)));
            }
        }

        for (name, min, max, default) in [
            ("pan", ptz.min_pan, ptz.max_pan, ptz.pan_default),
            ("tilt", ptz.min_tilt, ptz.max_tilt, ptz.tilt_default),
            ("zoom", ptz.min_zoom, ptz.max_zoom, ptz.zoom_default),
        ] {
            if min >= max {
                return Err(invalid(format!("min_{} must be less than max_{}", name, name)));
            }
            if default < min || default > max {
                return Err(invalid(format!(
                    "{}_default must be within min_{} and max_{}",
                    name, name, name
                )));
            }
        }

        Ok(())
    }
}
