//! Terminal completion notifier.
//!
//! Audio playback lives outside this crate; in the terminal we ring the
//! bell and say which sound would have played.

use std::io::Write;

use tickdown_core::{CompletionNotifier, SoundError, SoundSource};
use tracing::debug;

pub struct TerminalBell {
    volume: u32,
}

impl TerminalBell {
    pub fn new(volume: u32) -> Self {
        Self {
            volume: volume.min(100),
        }
    }
}

impl CompletionNotifier for TerminalBell {
    fn notify_completion(&mut self, sound: &SoundSource) -> Result<(), SoundError> {
        sound.validate()?;
        if self.volume == 0 {
            debug!(%sound, "volume is 0, skipping bell");
            return Ok(());
        }

        let mut err = std::io::stderr().lock();
        write!(err, "\x07")
            .and_then(|()| writeln!(err, "Time's up! ({sound}, volume {})", self.volume))
            .and_then(|()| err.flush())
            .map_err(|e| SoundError::Playback(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_custom_file_is_reported() {
        let mut bell = TerminalBell::new(50);
        let err = bell
            .notify_completion(&SoundSource::parse("/definitely/not/here.wav"))
            .unwrap_err();
        assert!(matches!(err, SoundError::FileNotFound(_)));
    }

    #[test]
    fn muted_preset_succeeds() {
        let mut bell = TerminalBell::new(0);
        assert!(bell.notify_completion(&SoundSource::default()).is_ok());
    }
}
