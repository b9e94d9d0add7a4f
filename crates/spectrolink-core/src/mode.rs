use std::fmt;

use crate::error::ModeError;

/// What the acquisition loop does with incoming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Decode and display.
    #[default]
    Idle,
    /// Decode, display and append complete frames to the recording sink.
    Recording,
    /// Drain the device without decoding while a saved record is reviewed.
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    StartRecording,
    StopRecording,
    StartPlayback,
    StopPlayback,
}

impl Mode {
    /// Recording and Playback are only reachable from Idle and only return to it.
    pub fn apply(self, request: ModeRequest) -> Result<Mode, ModeError> {
        use ModeRequest::*;
        match (self, request) {
            (Mode::Idle, StartRecording) => Ok(Mode::Recording),
            (Mode::Recording, StopRecording) => Ok(Mode::Idle),
            (Mode::Idle, StartPlayback) => Ok(Mode::Playback),
            (Mode::Playback, StopPlayback) => Ok(Mode::Idle),
            (from, request) => Err(ModeError::InvalidTransition { from, request }),
        }
    }

    /// Whether live bytes go through the decoder in this mode.
    pub fn decodes(self) -> bool {
        self != Mode::Playback
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Idle => "idle",
            Mode::Recording => "recording",
            Mode::Playback => "playback",
        })
    }
}

impl fmt::Display for ModeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeRequest::StartRecording => "start recording",
            ModeRequest::StopRecording => "stop recording",
            ModeRequest::StartPlayback => "start playback",
            ModeRequest::StopPlayback => "stop playback",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [Mode; 3] = [Mode::Idle, Mode::Recording, Mode::Playback];
    const REQUESTS: [ModeRequest; 4] = [
        ModeRequest::StartRecording,
        ModeRequest::StopRecording,
        ModeRequest::StartPlayback,
        ModeRequest::StopPlayback,
    ];

    #[test]
    fn allowed_transitions() {
        assert_eq!(Mode::Idle.apply(ModeRequest::StartRecording), Ok(Mode::Recording));
        assert_eq!(Mode::Recording.apply(ModeRequest::StopRecording), Ok(Mode::Idle));
        assert_eq!(Mode::Idle.apply(ModeRequest::StartPlayback), Ok(Mode::Playback));
        assert_eq!(Mode::Playback.apply(ModeRequest::StopPlayback), Ok(Mode::Idle));
    }

    #[test]
    fn recording_and_playback_never_touch_directly() {
        for mode in MODES {
            for request in REQUESTS {
                if let Ok(next) = mode.apply(request) {
                    assert!(
                        mode == Mode::Idle || next == Mode::Idle,
                        "{mode} -> {next} via {request}"
                    );
                }
            }
        }
    }

    #[test]
    fn rejected_request_reports_origin() {
        let err = Mode::Recording.apply(ModeRequest::StartRecording).unwrap_err();
        assert_eq!(
            err,
            ModeError::InvalidTransition {
                from: Mode::Recording,
                request: ModeRequest::StartRecording
            }
        );
        assert_eq!(err.to_string(), "cannot start recording while recording");
        assert!(Mode::Idle.apply(ModeRequest::StopPlayback).is_err());
        assert!(Mode::Playback.apply(ModeRequest::StartRecording).is_err());
    }

    #[test]
    fn only_playback_skips_decoding() {
        assert!(Mode::Idle.decodes());
        assert!(Mode::Recording.decodes());
        assert!(!Mode::Playback.decodes());
    }
}
