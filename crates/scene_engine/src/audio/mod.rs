//! Audio seam
//!
//! [`AudioSource`](crate::ecs::components::AudioSource) components queue
//! playback commands and flush them to an [`AudioBackend`] during the loop
//! phase, tagged with the owner's world position.

use crate::ecs::GameObjectId;
use crate::foundation::math::Vec3;

/// Audio system errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Sound resource could not be found
    #[error("Sound not found: {0}")]
    SoundNotFound(String),

    /// Command referenced a source the backend never started
    #[error("No active voice for source")]
    NoVoice,

    /// Backend failed
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Parameters for starting a voice
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    /// Sound resource name
    pub sound: String,
    /// Gain in `[0, 1]`
    pub volume: f32,
    /// Playback rate multiplier
    pub pitch: f32,
    /// Restart when finished
    pub looping: bool,
    /// Attenuation distances; `None` plays without spatialization
    pub spatial: Option<Attenuation>,
}

/// Distance attenuation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    /// Distance at which attenuation starts
    pub min_distance: f32,
    /// Distance beyond which the voice is silent
    pub max_distance: f32,
}

/// Audio backend trait
///
/// Voices are keyed by the owning object; one source drives at most one
/// looping/streamed voice, while one-shots are fire-and-forget.
pub trait AudioBackend {
    /// Start (or restart) the voice of `source`
    fn play(&mut self, source: GameObjectId, request: &PlayRequest, position: Vec3) -> Result<(), AudioError>;

    /// Pause the voice of `source`
    fn pause(&mut self, source: GameObjectId) -> Result<(), AudioError>;

    /// Resume the voice of `source`
    fn resume(&mut self, source: GameObjectId) -> Result<(), AudioError>;

    /// Stop the voice of `source`
    fn stop(&mut self, source: GameObjectId) -> Result<(), AudioError>;

    /// Seek the voice of `source` back to the start
    fn rewind(&mut self, source: GameObjectId) -> Result<(), AudioError>;

    /// Play a one-shot sound at `position`
    fn play_one_shot(&mut self, request: &PlayRequest, position: Vec3) -> Result<(), AudioError>;

    /// Update position and gain of a playing voice
    fn update_voice(&mut self, source: GameObjectId, position: Vec3, volume: f32) -> Result<(), AudioError>;
}

/// Backend that accepts and discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn play(&mut self, _source: GameObjectId, _request: &PlayRequest, _position: Vec3) -> Result<(), AudioError> {
        Ok(())
    }

    fn pause(&mut self, _source: GameObjectId) -> Result<(), AudioError> {
        Ok(())
    }

    fn resume(&mut self, _source: GameObjectId) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self, _source: GameObjectId) -> Result<(), AudioError> {
        Ok(())
    }

    fn rewind(&mut self, _source: GameObjectId) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_one_shot(&mut self, _request: &PlayRequest, _position: Vec3) -> Result<(), AudioError> {
        Ok(())
    }

    fn update_voice(&mut self, _source: GameObjectId, _position: Vec3, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }
}

/// A backend call, as stored by [`RecordingAudio`]
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    /// [`AudioBackend::play`]
    Play {
        /// Source object
        source: GameObjectId,
        /// Voice parameters
        request: PlayRequest,
        /// World position at flush time
        position: Vec3,
    },
    /// [`AudioBackend::pause`]
    Pause(GameObjectId),
    /// [`AudioBackend::resume`]
    Resume(GameObjectId),
    /// [`AudioBackend::stop`]
    Stop(GameObjectId),
    /// [`AudioBackend::rewind`]
    Rewind(GameObjectId),
    /// [`AudioBackend::play_one_shot`]
    OneShot {
        /// Voice parameters
        request: PlayRequest,
        /// Where the sound plays
        position: Vec3,
    },
    /// [`AudioBackend::update_voice`]
    Update {
        /// Source object
        source: GameObjectId,
        /// World position
        position: Vec3,
        /// Effective gain
        volume: f32,
    },
}

/// Backend that records every call in order
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    /// Calls received so far
    pub calls: Vec<AudioCall>,
}

impl RecordingAudio {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls other than per-frame voice updates
    pub fn commands(&self) -> Vec<&AudioCall> {
        self.calls
            .iter()
            .filter(|call| !matches!(call, AudioCall::Update { .. }))
            .collect()
    }
}

impl AudioBackend for RecordingAudio {
    fn play(&mut self, source: GameObjectId, request: &PlayRequest, position: Vec3) -> Result<(), AudioError> {
        self.calls.push(AudioCall::Play {
            source,
            request: request.clone(),
            position,
        });
        Ok(())
    }

    fn pause(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.calls.push(AudioCall::Pause(source));
        Ok(())
    }

    fn resume(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.calls.push(AudioCall::Resume(source));
        Ok(())
    }

    fn stop(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.calls.push(AudioCall::Stop(source));
        Ok(())
    }

    fn rewind(&mut self, source: GameObjectId) -> Result<(), AudioError> {
        self.calls.push(AudioCall::Rewind(source));
        Ok(())
    }

    fn play_one_shot(&mut self, request: &PlayRequest, position: Vec3) -> Result<(), AudioError> {
        self.calls.push(AudioCall::OneShot {
            request: request.clone(),
            position,
        });
        Ok(())
    }

    fn update_voice(&mut self, source: GameObjectId, position: Vec3, volume: f32) -> Result<(), AudioError> {
        self.calls.push(AudioCall::Update {
            source,
            position,
            volume,
        });
        Ok(())
    }
}
