//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Control a USB camera's pan, tilt and zoom with a joystick")]
pub struct Args {
    /// Video device to control, as an index (0) or a path (/dev/video2)
    #[arg(required_unless_present = "list_joysticks")]
    pub device: Option<String>,

    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Only use joysticks whose name contains this text (or whose id equals it)
    #[arg(long, short)]
    pub joystick: Option<String>,

    /// Skip the focus and exposure presets
    #[arg(long)]
    pub no_presets: bool,

    /// Print the connected joysticks and exit
    #[arg(long)]
    pub list_joysticks: bool,

    /// Log every tick's axes and setpoint
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    /// Lets command line values take precedence over the configuration file.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.camera.device = device.clone();
        }
        if let Some(pattern) = &self.joystick {
            config.joystick.name_pattern = pattern.clone();
        }
        if self.no_presets {
            config.camera.apply_presets = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_positional() {
        let args = Args::try_parse_from(["camera-ptz", "2"]).unwrap();
        assert_eq!(args.device.as_deref(), Some("2"));
        assert!(!args.no_presets);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_device_required() {
        assert!(Args::try_parse_from(["camera-ptz"]).is_err());
    }

    #[test]
    fn test_list_without_device() {
        let args = Args::try_parse_from(["camera-ptz", "--list-joysticks"]).unwrap();
        assert!(args.list_joysticks);
        assert!(args.device.is_none());
    }

    #[test]
    fn test_overrides_config() {
        let args = Args::try_parse_from([
            "camera-ptz",
            "/dev/video2",
            "--joystick",
            "Extreme",
            "--no-presets",
        ])
        .unwrap();

        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.camera.device, "/dev/video2");
        assert_eq!(config.joystick.pattern(), Some("Extreme"));
        assert!(!config.camera.apply_presets);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let args = Args::try_parse_from(["camera-ptz", "--list-joysticks", "-v"]).unwrap();
        assert!(args.verbose);

        let mut config = Config::default();
        config.joystick.name_pattern = "pad".to_string();
        args.apply_to(&mut config);
        assert_eq!(config.camera.device, "0");
        assert_eq!(config.joystick.pattern(), Some("pad"));
        assert!(config.camera.apply_presets);
    }
}
