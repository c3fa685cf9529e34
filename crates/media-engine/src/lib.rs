//! Media Engine - playback, navigation and practice sessions for VerseRec
//!
//! [`NavigationState`] tracks the page or chapter range and the active
//! item. [`PlaybackController`] resolves the active item through the
//! [`AudioResolver`](verserec_content_sources::AudioResolver), hands it to
//! an [`AudioBackend`] and advances when it finishes. [`PracticeSession`]
//! adds recording and uploading on top, with [`MicrophoneCapture`] as the
//! device-backed recorder.

mod backend;
mod capture;
mod controller;
mod decoder;
mod error;
mod navigation;
mod session;
mod state;

pub use backend::{AudioBackend, ClockBackend, FinishSignal, PlaybackEvent};
pub use capture::{input_devices, MicrophoneCapture};
pub use controller::{Outcome, PlaybackController};
pub use decoder::{probe, AudioInfo};
pub use error::{EngineError, EngineResult};
pub use navigation::{NavigationState, Step};
pub use session::PracticeSession;
pub use state::PlaybackState;
pub use verserec_core::PlaybackRate;

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _ = PlaybackState::Idle;
        let _ = ClockBackend::new();
        let _ = PlaybackRate::NORMAL;
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::InvalidState("nothing to record".to_string());
        assert!(format!("{}", error).contains("nothing to record"));
    }
}
