//! Sound playback requests.
//!
//! The game talks to an [`AudioSystem`]; the default [`LoggingAudio`]
//! tracks sounds and playbacks and logs them without producing output.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

pub trait AudioSystem {
    /// Registers `path` once and returns the same id on later calls
    fn create_or_get_sound(&mut self, path: &str) -> SoundId;
    fn start_sound(&mut self, sound: SoundId, looped: bool, volume: f32) -> PlaybackId;
    fn stop_sound(&mut self, playback: PlaybackId);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playback {
    pub sound: SoundId,
    pub looped: bool,
    pub volume: f32,
}

#[derive(Debug, Default)]
pub struct LoggingAudio {
    sounds: Vec<String>,
    active: HashMap<PlaybackId, Playback>,
    next_playback: u64,
}

impl LoggingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sound_path(&self, sound: SoundId) -> Option<&str> {
        self.sounds.get(sound.0).map(String::as_str)
    }

    pub fn active_playbacks(&self) -> usize {
        self.active.len()
    }
}

impl AudioSystem for LoggingAudio {
    fn create_or_get_sound(&mut self, path: &str) -> SoundId {
        if let Some(i) = self.sounds.iter().position(|s| s == path) {
            return SoundId(i);
        }
        if !std::path::Path::new(path).exists() {
            tracing::warn!("Sound file {} not found", path);
        }
        self.sounds.push(path.to_string());
        SoundId(self.sounds.len() - 1)
    }

    fn start_sound(&mut self, sound: SoundId, looped: bool, volume: f32) -> PlaybackId {
        let id = PlaybackId(self.next_playback);
        self.next_playback += 1;
        tracing::debug!(
            "Start sound {} (looped: {}, volume: {:.2})",
            self.sound_path(sound).unwrap_or("<unknown>"),
            looped,
            volume
        );
        // One-shots finish immediately since nothing is mixed
        if looped {
            self.active.insert(id, Playback { sound, looped, volume });
        }
        id
    }

    fn stop_sound(&mut self, playback: PlaybackId) {
        if let Some(p) = self.active.remove(&playback) {
            tracing::debug!("Stop sound {}", self.sound_path(p.sound).unwrap_or("<unknown>"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sounds_are_registered_once() {
        let mut audio = LoggingAudio::new();
        let a = audio.create_or_get_sound("Data/Audio/Click.mp3");
        let b = audio.create_or_get_sound("Data/Audio/Music.mp3");
        assert_ne!(a, b);
        assert_eq!(audio.create_or_get_sound("Data/Audio/Click.mp3"), a);
        assert_eq!(audio.sound_path(b), Some("Data/Audio/Music.mp3"));
    }

    #[test]
    fn test_looped_playback_is_tracked_until_stopped() {
        let mut audio = LoggingAudio::new();
        let music = audio.create_or_get_sound("music");
        let click = audio.create_or_get_sound("click");
        let playback = audio.start_sound(music, true, 0.5);
        audio.start_sound(click, false, 1.0);
        assert_eq!(audio.active_playbacks(), 1);
        audio.stop_sound(playback);
        assert_eq!(audio.active_playbacks(), 0);
        // Stopping twice is harmless
        audio.stop_sound(playback);
    }
}
