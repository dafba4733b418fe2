// Gesture - target actions and display states
//
// Punch, Duck and Block are the playable targets a round can ask for.
// Waiting and Finished are display states only: the renderer shows them,
// but they are never selected as a target and never classified.

use rand::seq::SliceRandom;
use rand::Rng;

/// Gesture shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// Forward jab (positive x)
    Punch,
    /// Drop the wrist (negative z)
    Duck,
    /// Raise the forearm (positive y)
    Block,
    /// Idle screen before the first session
    Waiting,
    /// Session over
    Finished,
}

/// Haptic cue fired when a new target is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintPattern {
    LongPulse,
    DoublePulse,
    ShortPulse,
}

impl Gesture {
    /// Targets eligible for random selection
    pub const PLAYABLE: [Gesture; 3] = [Gesture::Punch, Gesture::Duck, Gesture::Block];

    /// Whether this gesture can be a round target
    pub fn is_playable(&self) -> bool {
        match self {
            Gesture::Punch | Gesture::Duck | Gesture::Block => true,
            Gesture::Waiting | Gesture::Finished => false,
        }
    }

    /// Pick a uniformly random playable target
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Gesture {
        // PLAYABLE is a non-empty const array
        *Self::PLAYABLE.choose(rng).unwrap_or(&Gesture::Punch)
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Gesture::Punch => "PUNCH!",
            Gesture::Duck => "DUCK!",
            Gesture::Block => "BLOCK!",
            Gesture::Waiting => "WAIT.",
            Gesture::Finished => "DONE.",
        }
    }

    /// Vibration pattern announcing this gesture, if any
    pub fn hint_pattern(&self) -> Option<HintPattern> {
        match self {
            Gesture::Punch => Some(HintPattern::LongPulse),
            Gesture::Duck => Some(HintPattern::DoublePulse),
            Gesture::Block => Some(HintPattern::ShortPulse),
            Gesture::Waiting | Gesture::Finished => None,
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
