//! Audio source component
//!
//! Playback calls only update local state and queue a command. The queue is
//! flushed to the frame's [`AudioBackend`](crate::audio::AudioBackend) in the
//! loop phase, when the owner's world position is known.
//!
//! Each command is delivered on its own; a backend failure is logged and the
//! rest of the queue still goes out. A source dropped while the backend holds
//! its voice is reported to the [`World`](crate::ecs::World), which stops the
//! voice on the next loop phase.

use crate::audio::{Attenuation, PlayRequest};
use crate::ecs::component::{
    component_state_accessors, parse_attribute, Attribute, AttributeError, Component, ComponentContext,
    ComponentKind, ComponentState, ComponentType,
};
use crate::ecs::GameObjectId;
use crate::foundation::math::Vec3;

/// Playback state of the source's voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not playing
    #[default]
    Stopped,
    /// Playing
    Playing,
    /// Paused mid-sound
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Play,
    Pause,
    Resume,
    Stop,
    Rewind,
    OneShot(Option<Vec3>),
}

/// Audio source component
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    state: ComponentState,
    sound: Option<String>,
    playback: PlaybackState,
    pending: Vec<Command>,
    auto_started: bool,
    voice: bool,
    /// Playback rate multiplier
    pub pitch: f32,
    /// Gain in `[0, 1]`
    pub volume: f32,
    /// Silence without stopping
    pub mute: bool,
    /// Non-spatial music voice
    pub music: bool,
    /// Restart when finished
    pub looping: bool,
    /// Start playing on the first loop phase
    pub start_playing: bool,
    /// Audible at full volume from anywhere
    pub everywhere: bool,
    /// Distance beyond which the voice is silent
    pub max_distance: f32,
    /// Distance at which attenuation starts
    pub min_distance: f32,
}

impl AudioSource {
    /// Source with no sound assigned
    pub fn with_owner(owner: GameObjectId) -> Self {
        Self {
            state: ComponentState::new(owner),
            sound: None,
            playback: PlaybackState::Stopped,
            pending: Vec::new(),
            auto_started: false,
            voice: false,
            pitch: 1.0,
            volume: 1.0,
            mute: false,
            music: false,
            looping: false,
            start_playing: false,
            everywhere: false,
            max_distance: 20.0,
            min_distance: 5.0,
        }
    }

    /// Sound resource name
    pub fn sound(&self) -> Option<&str> {
        self.sound.as_deref()
    }

    /// Assign the sound resource
    pub fn set_sound(&mut self, sound: impl Into<String>) {
        self.sound = Some(sound.into());
    }

    /// Current playback state
    pub const fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Whether the voice is playing
    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    /// Whether the backend holds a voice for this source: a play went out
    /// and no stop has followed it
    pub const fn has_voice(&self) -> bool {
        self.voice
    }

    /// Commands waiting for the next loop phase
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    /// Start from the beginning. Returns `false` without a sound.
    pub fn play(&mut self) -> bool {
        if self.sound.is_none() {
            log::debug!("audio source has no sound to play");
            return false;
        }
        self.playback = PlaybackState::Playing;
        self.pending.push(Command::Play);
        true
    }

    /// Pause a playing voice
    pub fn pause(&mut self) -> bool {
        if self.playback != PlaybackState::Playing {
            return false;
        }
        self.playback = PlaybackState::Paused;
        self.pending.push(Command::Pause);
        true
    }

    /// Resume a paused voice
    pub fn resume(&mut self) -> bool {
        if self.playback != PlaybackState::Paused {
            return false;
        }
        self.playback = PlaybackState::Playing;
        self.pending.push(Command::Resume);
        true
    }

    /// Stop the voice
    pub fn stop(&mut self) -> bool {
        if self.playback == PlaybackState::Stopped {
            return false;
        }
        self.playback = PlaybackState::Stopped;
        self.pending.push(Command::Stop);
        true
    }

    /// Seek back to the start without changing state
    pub fn rewind(&mut self) -> bool {
        if self.playback == PlaybackState::Stopped {
            return false;
        }
        self.pending.push(Command::Rewind);
        true
    }

    /// Fire the sound once at the owner's position
    pub fn play_one_shot(&mut self) -> bool {
        self.queue_one_shot(None)
    }

    /// Fire the sound once at `position`
    pub fn play_one_shot_at(&mut self, position: Vec3) -> bool {
        self.queue_one_shot(Some(position))
    }

    fn queue_one_shot(&mut self, position: Option<Vec3>) -> bool {
        if self.sound.is_none() {
            return false;
        }
        self.pending.push(Command::OneShot(position));
        true
    }

    fn effective_volume(&self) -> f32 {
        if self.mute {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        }
    }

    fn request(&self, sound: &str) -> PlayRequest {
        PlayRequest {
            sound: sound.to_string(),
            volume: self.effective_volume(),
            pitch: self.pitch,
            looping: self.looping,
            spatial: (!self.music && !self.everywhere).then_some(Attenuation {
                min_distance: self.min_distance,
                max_distance: self.max_distance,
            }),
        }
    }

    fn flush(&mut self, ctx: &mut ComponentContext<'_, '_>) {
        let owner = ctx.owner;
        let owner_name = ctx.owner_name;
        let position = ctx.world_position();
        let audio = &mut *ctx.frame.audio;
        let sound = self.sound.clone().unwrap_or_default();
        let mut play_failed = false;

        for command in std::mem::take(&mut self.pending) {
            let result = match command {
                Command::Play => audio.play(owner, &self.request(&sound), position),
                Command::Pause => audio.pause(owner),
                Command::Resume => audio.resume(owner),
                Command::Stop => audio.stop(owner),
                Command::Rewind => audio.rewind(owner),
                Command::OneShot(at) => {
                    let mut request = self.request(&sound);
                    request.looping = false;
                    audio.play_one_shot(&request, at.unwrap_or(position))
                }
            };

            match (command, result) {
                (Command::Play, Ok(())) => {
                    self.voice = true;
                    play_failed = false;
                }
                (Command::Stop, Ok(())) => self.voice = false,
                (Command::Play, Err(e)) => {
                    log::warn!("'{}': could not play '{}': {}", owner_name, sound, e);
                    play_failed = true;
                }
                (command, Err(e)) => log::warn!("'{}': audio {:?} failed: {}", owner_name, command, e),
                _ => {}
            }
        }

        if play_failed && !self.voice {
            self.playback = PlaybackState::Stopped;
        }

        if self.is_playing() {
            if let Err(e) = audio.update_voice(owner, position, self.effective_volume()) {
                log::debug!("'{}': voice update failed: {}", owner_name, e);
            }
        }
    }
}

impl Component for AudioSource {
    component_state_accessors!();

    fn on_loop(&mut self, ctx: &mut ComponentContext<'_, '_>) {
        if self.start_playing && !self.auto_started {
            self.auto_started = true;
            self.play();
        }

        self.flush(ctx);
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("sound", "string", self.sound().unwrap_or("")),
            Attribute::new("pitch", "f32", self.pitch),
            Attribute::new("volume", "f32", self.volume),
            Attribute::new("mute", "bool", self.mute),
            Attribute::new("music", "bool", self.music),
            Attribute::new("loop", "bool", self.looping),
            Attribute::new("start_playing", "bool", self.start_playing),
            Attribute::new("everywhere", "bool", self.everywhere),
            Attribute::new("max_distance", "f32", self.max_distance),
            Attribute::new("min_distance", "f32", self.min_distance),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "sound" => self.set_sound(value.trim()),
            "pitch" => self.pitch = parse_attribute(name, value, "f32")?,
            "volume" => self.volume = parse_attribute(name, value, "f32")?,
            "mute" => self.mute = parse_attribute(name, value, "bool")?,
            "music" => self.music = parse_attribute(name, value, "bool")?,
            "loop" => self.looping = parse_attribute(name, value, "bool")?,
            "start_playing" => self.start_playing = parse_attribute(name, value, "bool")?,
            "everywhere" => self.everywhere = parse_attribute(name, value, "bool")?,
            "max_distance" => self.max_distance = parse_attribute(name, value, "f32")?,
            "min_distance" => self.min_distance = parse_attribute(name, value, "f32")?,
            _ => return Err(AttributeError::unknown(ComponentKind::AudioSource, name)),
        }
        Ok(())
    }
}

impl ComponentType for AudioSource {
    const KIND: ComponentKind = ComponentKind::AudioSource;

    fn new(owner: GameObjectId) -> Self {
        Self::with_owner(owner)
    }

    stored_in_slot!(audio_source);
}
