//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Webcam gesture interface streaming annotated video to the browser
#[derive(Parser, Debug)]
#[command(name = "handwave")]
#[command(version, about = "Control volume, keys and screenshots with hand gestures", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Directory containing the ONNX hand models
    #[arg(long)]
    pub models: Option<PathBuf>,

    /// Disable the selfie-view mirror
    #[arg(long)]
    pub no_mirror: bool,

    /// Directory screenshots are written to
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config file.
    pub fn apply_to(&self, config: &mut crate::config::Config) {
        if let Some(camera) = self.camera {
            config.camera.device = camera;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref models) = self.models {
            config.detector.model_dir = models.clone();
        }
        if self.no_mirror {
            config.camera.mirror = false;
        }
        if let Some(ref dir) = self.screenshot_dir {
            config.screenshot.dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_overrides_apply() {
        let args = Args::parse_from([
            "handwave",
            "--camera",
            "2",
            "--port",
            "9999",
            "--no-mirror",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.camera.device, 2);
        assert_eq!(config.server.port, 9999);
        assert!(!config.camera.mirror);
        // Untouched fields keep their defaults.
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_no_flags_change_nothing() {
        let args = Args::parse_from(["handwave"]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.camera.device, 0);
        assert!(config.camera.mirror);
    }

    #[test]
    fn test_list_cameras_subcommand_parses() {
        let args = Args::parse_from(["handwave", "list-cameras"]);
        assert!(matches!(args.command, Some(Command::ListCameras)));
    }
}
