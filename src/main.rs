//! # Camera PTZ
//!
//! Steer a USB camera's pan, tilt and zoom with a joystick.
//!
//! This application reads a joystick through evdev, turns its axes and
//! buttons into absolute PTZ setpoints and writes them to the camera with
//! `v4l2-ctl` about a hundred times a second.

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use camera_ptz::camera::{apply_image_presets, V4l2Ctl};
use camera_ptz::cli::Args;
use camera_ptz::config::Config;
use camera_ptz::controller::joystick::{EvdevInput, RumbleSettings};
use camera_ptz::controller::source::InputSource;
use camera_ptz::session::{Session, StepOutcome};

/// Number of setpoints between status log messages
const LOG_INTERVAL_TICKS: u64 = 6000;

/// Log file name inside `[logging] dir`
const LOG_FILE_NAME: &str = "camera-ptz.log";

/// Main entry point for Camera PTZ
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse arguments and load configuration
///    - Set up logging with tracing subscriber
///    - Apply the camera's image quality presets once
///
/// 2. **Main Loop**
///    - Every tick: poll joysticks, update the selection, run the PTZ
///      controller, write zoom/tilt/pan to the camera
///    - While no joystick is selected, back off before polling again
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error (and a non-zero exit status) if:
/// - Configuration cannot be loaded or is invalid
/// - Several joysticks match and none can be chosen
/// - The selected joystick has fewer than three axes
/// - A camera control write fails
///
/// # Examples
///
/// ```bash
/// camera-ptz 0 --joystick "Extreme 3D"
/// ```
///
/// Expected output:
/// ```text
/// INFO camera_ptz: Camera PTZ v0.1.0 starting...
/// INFO camera_ptz::controller::selector: Joystick #0 connected: Logitech Extreme 3D [0003046dc2150110] at /dev/input/event5
/// INFO camera_ptz::controller::selector: Using joystick #0: Logitech Extreme 3D [0003046dc2150110] at /dev/input/event5
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    args.apply_to(&mut config);
    config.validate().context("Invalid command line options")?;

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(&config, args.verbose);

    info!("Camera PTZ v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut input = EvdevInput::new(
        Duration::from_millis(config.joystick.rescan_interval_ms),
        RumbleSettings {
            strength: config.joystick.rumble_strength,
            duration_ms: config.joystick.rumble_duration_ms,
        },
    );

    if args.list_joysticks {
        input.poll_events()?;
        let joysticks = input.summaries();
        if joysticks.is_empty() {
            println!("No joysticks found");
        }
        for joystick in joysticks {
            println!(
                "{} {}: {} axes, {} buttons",
                joystick.instance, joystick.identity, joystick.axes, joystick.buttons
            );
        }
        return Ok(());
    }

    let mut port = V4l2Ctl::new(&config.camera.program, &config.camera.device);
    info!("Controlling camera {}", port.device());

    if config.camera.apply_presets {
        apply_image_presets(&mut port, &config.camera.presets)?;
    }

    let mut session = Session::new(input, port, &config);

    let tick_period = Duration::from_millis(config.run_loop.tick_interval_ms);
    let retry_period = Duration::from_millis(config.joystick.retry_interval_ms);
    let mut ticker = interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Starting control loop every {}ms", tick_period.as_millis());
    info!("Press Ctrl+C to exit");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Camera writes block on v4l2-ctl
                let outcome = tokio::task::block_in_place(|| session.step()).map_err(|e| {
                    error!("{}", e);
                    e
                })?;

                match outcome {
                    StepOutcome::Sent(state) => {
                        sent += 1;
                        if sent % LOG_INTERVAL_TICKS == 0 {
                            info!(
                                "Sent {} setpoints (pan {} tilt {} zoom {})",
                                sent, state.pan, state.tilt, state.zoom
                            );
                        }
                    }
                    StepOutcome::Waiting => sleep(retry_period).await,
                }
            }

            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total setpoints sent: {}", sent);
                break;
            }
        }
    }

    Ok(())
}

/// Sets up console logging, plus a daily-rolling file when configured.
fn init_logging(config: &Config, verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let dir = config.logging.dir.trim();
    if dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(file_writer))
        .init();
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_interval_constant() {
        assert_eq!(LOG_INTERVAL_TICKS, 6000);

        // At the default 10ms tick, 6000 setpoints = 1 minute
        let seconds = LOG_INTERVAL_TICKS * 10 / 1000;
        assert_eq!(seconds, 60, "Log interval should be one minute at 100Hz");
    }

    #[test]
    fn test_log_file_name() {
        assert!(LOG_FILE_NAME.ends_with(".log"));
    }
}
