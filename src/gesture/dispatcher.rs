//! The debounced gesture dispatcher.
//!
//! One dispatcher is constructed per streaming session and owns everything
//! that used to be ambient state in gesture demos: the cooldown timers and
//! the cached volume level. `dispatch` decides at most one action per hand
//! observation, executes the side effect synchronously, and hands the
//! streamer an annotation to draw.

use std::collections::HashMap;
use std::time::Instant;

use crate::actions::Sinks;
use crate::camera::Frame;
use crate::detect::HandObservation;
use crate::overlay::Color;

use super::rules::{GestureAction, RuleSet};

/// Volume change applied per fired VolumeUp/VolumeDown.
const VOLUME_STEP: f32 = 0.01;

/// Where fired-action annotations are drawn on the frame.
const ANNOTATION_ORIGIN: (i32, i32) = (10, 60);

/// Overlay directive returned on a successful fire.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub origin: (i32, i32),
    pub color: Color,
}

/// Result of dispatching one hand observation.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A rule matched and its action ran; draw this annotation.
    Fired(Annotation),
    /// A rule matched but its cooldown has not elapsed. Not an error.
    Suppressed,
    /// No rule matches this (handedness, pattern) pair. Not an error.
    NoMatch,
}

/// Session-scoped gesture state: rule table, per-action cooldowns, sinks,
/// and the cached volume level.
pub struct GestureDispatcher {
    rules: RuleSet,
    sinks: Sinks,
    last_fired: HashMap<GestureAction, Instant>,
    volume: f32,
}

impl GestureDispatcher {
    /// Create a dispatcher for one session. `initial_volume` seeds the
    /// cached level (normally read from the volume sink at session start).
    pub fn new(rules: RuleSet, sinks: Sinks, initial_volume: f32) -> Self {
        Self {
            rules,
            sinks,
            last_fired: HashMap::new(),
            volume: initial_volume.clamp(0.0, 1.0),
        }
    }

    /// The cached volume level, clamped to [0.0, 1.0].
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Decide and execute at most one action for this observation.
    ///
    /// `now` must be monotonically non-decreasing across calls within a
    /// session. An action fires only when strictly more than its cooldown
    /// has elapsed since it last fired; the timer update happens with the
    /// firing decision, so rapid identical detections cannot double-fire.
    /// Multiple hands in one frame dispatch independently.
    pub fn dispatch(
        &mut self,
        observation: &HandObservation,
        frame: &Frame,
        now: Instant,
    ) -> DispatchOutcome {
        let rule = match self.rules.matching(observation.handedness, observation.fingers) {
            Some(rule) => rule,
            None => return DispatchOutcome::NoMatch,
        };
        let (action, cooldown) = (rule.action, rule.cooldown);

        if let Some(&last) = self.last_fired.get(&action) {
            if now.saturating_duration_since(last) <= cooldown {
                log::debug!(
                    "{} hand {}: {} suppressed by cooldown",
                    observation.handedness,
                    observation.fingers,
                    action.name()
                );
                return DispatchOutcome::Suppressed;
            }
        }
        self.last_fired.insert(action, now);

        log::info!(
            "{} hand {}: firing {}",
            observation.handedness,
            observation.fingers,
            action.name()
        );
        DispatchOutcome::Fired(self.fire(action, frame))
    }

    /// Execute the side effect and build the annotation. Sink failures are
    /// logged here and never propagate; one failed volume change must not
    /// stop the video stream.
    fn fire(&mut self, action: GestureAction, frame: &Frame) -> Annotation {
        match action {
            GestureAction::VolumeUp | GestureAction::VolumeDown => {
                self.volume = match action {
                    GestureAction::VolumeUp => (self.volume + VOLUME_STEP).min(1.0),
                    _ => (self.volume - VOLUME_STEP).max(0.0),
                };
                if let Err(e) = self.sinks.volume.set(self.volume) {
                    log::error!("failed to set volume: {}", e);
                }
                Annotation {
                    text: format!("Volume: {}%", (self.volume * 100.0).round() as u32),
                    origin: ANNOTATION_ORIGIN,
                    color: Color::GREEN,
                }
            }
            GestureAction::Screenshot => {
                match self.sinks.screenshots.save(frame) {
                    Ok(path) => log::info!("screenshot saved: {}", path.display()),
                    Err(e) => log::error!("failed to save screenshot: {}", e),
                }
                Annotation {
                    text: "Screenshot Taken!".to_string(),
                    origin: ANNOTATION_ORIGIN,
                    color: Color::GREEN,
                }
            }
            GestureAction::SpacePress => {
                if let Err(e) = self.sinks.keys.press("space") {
                    log::error!("failed to press space: {}", e);
                }
                Annotation {
                    text: "Space Pressed!".to_string(),
                    origin: ANNOTATION_ORIGIN,
                    color: Color::RED,
                }
            }
        }
    }
}
