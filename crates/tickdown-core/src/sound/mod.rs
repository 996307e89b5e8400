//! Completion sound selection and the notifier boundary.
//!
//! The engine does not play audio. It hands the configured [`SoundSource`]
//! to a [`CompletionNotifier`] once per finished run and logs whatever error
//! comes back.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SoundError;

/// Built-in completion sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetSound {
    Bell,
    Chime,
    Digital,
    Birds,
}

impl PresetSound {
    pub const ALL: [PresetSound; 4] = [
        PresetSound::Bell,
        PresetSound::Chime,
        PresetSound::Digital,
        PresetSound::Birds,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PresetSound::Bell => "bell",
            PresetSound::Chime => "chime",
            PresetSound::Digital => "digital",
            PresetSound::Birds => "birds",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(id.trim()))
    }
}

/// Extensions accepted for user-supplied sounds.
pub const CUSTOM_SOUND_EXTENSIONS: [&str; 5] = ["mp3", "wav", "ogg", "m4a", "flac"];

/// What to play when a run finishes.
///
/// Serialized as a plain string (a preset id or a path) so it reads
/// naturally in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SoundSource {
    Preset(PresetSound),
    Custom(PathBuf),
}

impl SoundSource {
    /// Preset ids map to presets; anything else is taken as a file path.
    pub fn parse(raw: &str) -> Self {
        match PresetSound::from_id(raw) {
            Some(preset) => SoundSource::Preset(preset),
            None => SoundSource::Custom(PathBuf::from(raw.trim())),
        }
    }

    /// Check that a custom sound can plausibly be played.
    ///
    /// # Errors
    ///
    /// Returns [`SoundError::FileNotFound`] if the file is missing and
    /// [`SoundError::UnsupportedFormat`] for unknown extensions.
    pub fn validate(&self) -> Result<(), SoundError> {
        match self {
            SoundSource::Preset(_) => Ok(()),
            SoundSource::Custom(path) => validate_custom(path),
        }
    }
}

impl Default for SoundSource {
    fn default() -> Self {
        SoundSource::Preset(PresetSound::Bell)
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundSource::Preset(p) => f.write_str(p.id()),
            SoundSource::Custom(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<String> for SoundSource {
    fn from(raw: String) -> Self {
        SoundSource::parse(&raw)
    }
}

impl From<SoundSource> for String {
    fn from(sound: SoundSource) -> Self {
        sound.to_string()
    }
}

fn validate_custom(path: &Path) -> Result<(), SoundError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !CUSTOM_SOUND_EXTENSIONS.contains(&ext.as_str()) {
        return Err(SoundError::UnsupportedFormat(path.display().to_string()));
    }
    if !path.is_file() {
        return Err(SoundError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Receives the completion signal.
pub trait CompletionNotifier: Send {
    /// Called exactly once per finished run.
    ///
    /// # Errors
    ///
    /// Returns a [`SoundError`] if the sound cannot be played. The engine
    /// logs it and stays finished.
    fn notify_completion(&mut self, sound: &SoundSource) -> Result<(), SoundError>;

    /// Stop a sound that is still pending or playing. Called on reset.
    fn silence(&mut self) {}
}

/// Notifier that does nothing; used when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl CompletionNotifier for SilentNotifier {
    fn notify_completion(&mut self, _sound: &SoundSource) -> Result<(), SoundError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognises_presets_case_insensitively() {
        assert_eq!(SoundSource::parse("Chime"), SoundSource::Preset(PresetSound::Chime));
        assert_eq!(
            SoundSource::parse("/tmp/alarm.wav"),
            SoundSource::Custom(PathBuf::from("/tmp/alarm.wav"))
        );
    }

    #[test]
    fn presets_always_validate() {
        for p in PresetSound::ALL {
            assert!(SoundSource::Preset(p).validate().is_ok());
        }
    }

    #[test]
    fn custom_sound_requires_known_extension() {
        let err = SoundSource::parse("notes.txt").validate().unwrap_err();
        assert!(matches!(err, SoundError::UnsupportedFormat(_)));
    }

    #[test]
    fn custom_sound_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ding.mp3");
        let missing = SoundSource::Custom(path.clone());
        assert!(matches!(missing.validate(), Err(SoundError::FileNotFound(_))));

        std::fs::write(&path, b"ID3").unwrap();
        assert!(SoundSource::Custom(path).validate().is_ok());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&SoundSource::default()).unwrap();
        assert_eq!(json, r#""bell""#);
        let back: SoundSource = serde_json::from_str(r#""/sounds/gong.ogg""#).unwrap();
        assert_eq!(back, SoundSource::Custom(PathBuf::from("/sounds/gong.ogg")));
    }
}
