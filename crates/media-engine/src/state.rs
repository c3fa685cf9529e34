//! Playback state machine

use std::fmt;

/// Where the controller is in the play cycle
///
/// `Idle → Loading → Playing ⇄ Paused → Idle`; `Loading` may fall back to
/// `Idle` when nothing playable is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

impl PlaybackState {
    /// True while an item is loading or loaded
    pub fn is_engaged(&self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    /// Whether the machine allows moving to `next`
    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, next),
            (_, Idle)
                | (_, Loading)
                | (Loading, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
        )
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = PlaybackState::default();
        assert_eq!(state, PlaybackState::Idle);
        assert!(!state.is_engaged());
    }

    #[test]
    fn test_allowed_transitions() {
        use PlaybackState::*;
        assert!(Idle.can_transition_to(Loading));
        assert!(Loading.can_transition_to(Playing));
        assert!(Loading.can_transition_to(Idle));
        assert!(Playing.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Playing));
        assert!(Paused.can_transition_to(Loading));
    }

    #[test]
    fn test_rejected_transitions() {
        use PlaybackState::*;
        assert!(!Idle.can_transition_to(Playing));
        assert!(!Idle.can_transition_to(Paused));
        assert!(!Loading.can_transition_to(Paused));
    }
}
