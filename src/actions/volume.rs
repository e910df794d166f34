//! System volume sink.
//!
//! Talks to the platform mixer through its CLI: `osascript` on macOS,
//! `wpctl` (PipeWire) on Linux. Levels are scalars in [0.0, 1.0].

use std::process::Command;

use super::SinkError;

/// Read and set the system output volume as a scalar in [0.0, 1.0].
pub trait VolumeSink {
    /// Current system volume.
    fn current(&mut self) -> Result<f32, SinkError>;
    /// Set the system volume. Callers pass values already clamped to [0, 1].
    fn set(&mut self, level: f32) -> Result<(), SinkError>;
}

/// The process-wide default audio output endpoint.
pub struct SystemVolume;

impl SystemVolume {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeSink for SystemVolume {
    fn current(&mut self) -> Result<f32, SinkError> {
        platform::get_volume()
    }

    fn set(&mut self, level: f32) -> Result<(), SinkError> {
        platform::set_volume(level.clamp(0.0, 1.0))
    }
}

/// Run a command and return trimmed stdout, mapping failure exit codes to
/// `SinkError::Platform`.
fn run(program: &str, args: &[&str]) -> Result<String, SinkError> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(SinkError::Platform(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(target_os = "macos")]
mod platform {
    use super::{run, SinkError};

    pub fn get_volume() -> Result<f32, SinkError> {
        let out = run(
            "osascript",
            &["-e", "output volume of (get volume settings)"],
        )?;
        let percent: f32 = out
            .parse()
            .map_err(|_| SinkError::Platform(format!("unexpected osascript output: {:?}", out)))?;
        Ok((percent / 100.0).clamp(0.0, 1.0))
    }

    pub fn set_volume(level: f32) -> Result<(), SinkError> {
        let percent = (level * 100.0).round() as u32;
        run(
            "osascript",
            &["-e", &format!("set volume output volume {}", percent)],
        )?;
        Ok(())
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::{run, SinkError};

    const SINK: &str = "@DEFAULT_AUDIO_SINK@";

    pub fn get_volume() -> Result<f32, SinkError> {
        // wpctl prints e.g. "Volume: 0.55" or "Volume: 0.55 [MUTED]"
        let out = run("wpctl", &["get-volume", SINK])?;
        let level = out
            .split_whitespace()
            .nth(1)
            .and_then(|v| v.parse::<f32>().ok())
            .ok_or_else(|| SinkError::Platform(format!("unexpected wpctl output: {:?}", out)))?;
        Ok(level.clamp(0.0, 1.0))
    }

    pub fn set_volume(level: f32) -> Result<(), SinkError> {
        run("wpctl", &["set-volume", SINK, &format!("{:.2}", level)])?;
        Ok(())
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
mod platform {
    use super::SinkError;

    pub fn get_volume() -> Result<f32, SinkError> {
        Err(SinkError::Platform(
            "system volume control is not supported on this platform".into(),
        ))
    }

    pub fn set_volume(_level: f32) -> Result<(), SinkError> {
        Err(SinkError::Platform(
            "system volume control is not supported on this platform".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_missing_program_is_io_error() {
        let result = run("definitely-not-a-real-binary-xyz", &[]);
        assert!(matches!(result, Err(SinkError::Io(_))));
    }

    #[test]
    fn test_run_captures_stdout() {
        let out = run("echo", &["hello"]).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_run_nonzero_exit_is_platform_error() {
        let result = run("false", &[]);
        assert!(matches!(result, Err(SinkError::Platform(_))));
    }
}
