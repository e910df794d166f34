//! The gesture rule table.
//!
//! Rules are data, not branching logic: each maps one exact
//! (handedness, finger-pattern) pair to an action with its own cooldown.
//! The table is validated once at startup; overlapping patterns are a
//! configuration error, not something resolved by priority at dispatch time.

use std::fmt;
use std::time::Duration;

use crate::detect::{FingerState, Handedness};

/// The actions a gesture can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureAction {
    VolumeUp,
    VolumeDown,
    Screenshot,
    SpacePress,
}

impl GestureAction {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            GestureAction::VolumeUp => "volume-up",
            GestureAction::VolumeDown => "volume-down",
            GestureAction::Screenshot => "screenshot",
            GestureAction::SpacePress => "space-press",
        }
    }
}

/// One row of the gesture table.
#[derive(Debug, Clone)]
pub struct GestureRule {
    pub handedness: Handedness,
    pub pattern: FingerState,
    pub action: GestureAction,
    pub cooldown: Duration,
}

/// Two rules claim the same (handedness, pattern) pair.
#[derive(Debug)]
pub struct RuleConflict {
    pub handedness: Handedness,
    pub pattern: FingerState,
}

impl fmt::Display for RuleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflicting gesture rules for {} hand pattern {}",
            self.handedness, self.pattern
        )
    }
}

impl std::error::Error for RuleConflict {}

/// A validated, immutable set of gesture rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<GestureRule>,
}

impl RuleSet {
    /// Build a rule set, rejecting tables where two rules would match the
    /// same observation.
    pub fn new(rules: Vec<GestureRule>) -> Result<Self, RuleConflict> {
        for (i, a) in rules.iter().enumerate() {
            for b in &rules[i + 1..] {
                if a.handedness == b.handedness && a.pattern == b.pattern {
                    return Err(RuleConflict {
                        handedness: a.handedness,
                        pattern: a.pattern,
                    });
                }
            }
        }
        Ok(Self { rules })
    }

    /// The built-in table:
    ///
    /// | hand  | pattern | action     | cooldown |
    /// |-------|---------|------------|----------|
    /// | Right | TFFFF   | VolumeUp   | 0.2 s    |
    /// | Right | FFFFT   | VolumeDown | 0.2 s    |
    /// | Right | FTTFF   | Screenshot | 5.0 s    |
    /// | Left  | TTTTT   | SpacePress | 1.0 s    |
    pub fn standard() -> Self {
        use GestureAction::*;
        use Handedness::*;

        let rules = vec![
            GestureRule {
                handedness: Right,
                pattern: FingerState([true, false, false, false, false]),
                action: VolumeUp,
                cooldown: Duration::from_millis(200),
            },
            GestureRule {
                handedness: Right,
                pattern: FingerState([false, false, false, false, true]),
                action: VolumeDown,
                cooldown: Duration::from_millis(200),
            },
            GestureRule {
                handedness: Right,
                pattern: FingerState([false, true, true, false, false]),
                action: Screenshot,
                cooldown: Duration::from_secs(5),
            },
            GestureRule {
                handedness: Left,
                pattern: FingerState::ALL,
                action: SpacePress,
                cooldown: Duration::from_secs(1),
            },
        ];

        Self::new(rules).expect("standard rule table is pattern-disjoint")
    }

    /// The rule matching an observation exactly, if any.
    pub fn matching(&self, handedness: Handedness, fingers: FingerState) -> Option<&GestureRule> {
        self.rules
            .iter()
            .find(|r| r.handedness == handedness && r.pattern == fingers)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_validates() {
        let rules = RuleSet::standard();
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_matching_is_exact() {
        let rules = RuleSet::standard();

        let thumb_only = FingerState([true, false, false, false, false]);
        let rule = rules.matching(Handedness::Right, thumb_only).unwrap();
        assert_eq!(rule.action, GestureAction::VolumeUp);

        // Same pattern on the other hand matches nothing.
        assert!(rules.matching(Handedness::Left, thumb_only).is_none());

        // One extra finger breaks the match.
        let thumb_and_index = FingerState([true, true, false, false, false]);
        assert!(rules.matching(Handedness::Right, thumb_and_index).is_none());
    }

    #[test]
    fn test_overlapping_rules_rejected() {
        let pattern = FingerState([true, false, false, false, false]);
        let duplicate = |action| GestureRule {
            handedness: Handedness::Right,
            pattern,
            action,
            cooldown: Duration::from_millis(200),
        };

        let result = RuleSet::new(vec![
            duplicate(GestureAction::VolumeUp),
            duplicate(GestureAction::Screenshot),
        ]);
        let conflict = result.unwrap_err();
        assert_eq!(conflict.handedness, Handedness::Right);
        assert_eq!(conflict.pattern, pattern);
    }

    #[test]
    fn test_same_pattern_different_hands_allowed() {
        let rule = |handedness| GestureRule {
            handedness,
            pattern: FingerState::ALL,
            action: GestureAction::SpacePress,
            cooldown: Duration::from_secs(1),
        };
        assert!(RuleSet::new(vec![rule(Handedness::Left), rule(Handedness::Right)]).is_ok());
    }
}
