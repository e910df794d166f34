//! Key injection sink.

use std::thread;
use std::time::Duration;

use rdev::{simulate, EventType, Key};

use super::SinkError;

/// Emit a single key press by name. Fire-and-forget from the dispatcher's
/// point of view; errors are logged, never fatal.
pub trait KeySink {
    fn press(&mut self, key: &str) -> Result<(), SinkError>;
}

/// Injects key events into the OS input stream via `rdev`.
pub struct SystemKeys;

impl SystemKeys {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay between press and release so the OS registers both events.
const KEY_EVENT_GAP: Duration = Duration::from_millis(20);

impl KeySink for SystemKeys {
    fn press(&mut self, key: &str) -> Result<(), SinkError> {
        let key = key_by_name(key)
            .ok_or_else(|| SinkError::Platform(format!("unknown key name: {:?}", key)))?;

        simulate(&EventType::KeyPress(key))
            .map_err(|e| SinkError::Platform(format!("key press failed: {:?}", e)))?;
        thread::sleep(KEY_EVENT_GAP);
        simulate(&EventType::KeyRelease(key))
            .map_err(|e| SinkError::Platform(format!("key release failed: {:?}", e)))?;
        Ok(())
    }
}

fn key_by_name(name: &str) -> Option<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "escape" | "esc" => Key::Escape,
        "tab" => Key::Tab,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        _ => return None,
    };
    Some(key)
}
