//! Reading text aloud through a platform speech engine.

use crate::preferences::SpeechPrefs;

/// A text-to-speech backend.
pub trait SpeechEngine {
    fn speak(&mut self, text: &str, voice: Option<&str>, rate: f32);
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

/// Tracks playback state over a [`SpeechEngine`].
pub struct Narrator<E: SpeechEngine> {
    engine: E,
    is_speaking: bool,
    is_paused: bool,
}

impl<E: SpeechEngine> Narrator<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            is_speaking: false,
            is_paused: false,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Speak `text` with the stored voice and rate, replacing any current utterance.
    pub fn speak(&mut self, text: &str, prefs: &SpeechPrefs) {
        self.stop();
        self.engine.speak(text, prefs.voice(), prefs.rate());
        self.is_speaking = true;
        self.is_paused = false;
    }

    pub fn pause(&mut self) {
        self.engine.pause();
        self.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.engine.resume();
        self.is_paused = false;
    }

    pub fn stop(&mut self) {
        self.engine.cancel();
        self.is_speaking = false;
        self.is_paused = false;
    }

    /// The engine reports the utterance ended or failed.
    pub fn finished(&mut self) {
        self.is_speaking = false;
        self.is_paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[derive(Default)]
    struct RecordingEngine {
        calls: Vec<String>,
    }

    impl SpeechEngine for RecordingEngine {
        fn speak(&mut self, text: &str, voice: Option<&str>, rate: f32) {
            self.calls
                .push(format!("speak:{text}:{}:{rate}", voice.unwrap_or("-")));
        }
        fn pause(&mut self) {
            self.calls.push("pause".to_string());
        }
        fn resume(&mut self) {
            self.calls.push("resume".to_string());
        }
        fn cancel(&mut self) {
            self.calls.push("cancel".to_string());
        }
    }

    #[test]
    fn test_speak_cancels_first_and_uses_prefs() {
        let mut prefs = SpeechPrefs::load(Storage::in_memory());
        prefs.set_rate(1.5);
        let mut narrator = Narrator::new(RecordingEngine::default());

        narrator.speak("Roll two dice.", &prefs);
        assert!(narrator.is_speaking());
        assert_eq!(
            narrator.engine().calls,
            vec!["cancel", "speak:Roll two dice.:-:1.5"]
        );
    }

    #[test]
    fn test_pause_resume_finish() {
        let prefs = SpeechPrefs::load(Storage::in_memory());
        let mut narrator = Narrator::new(RecordingEngine::default());
        narrator.speak("Hi", &prefs);

        narrator.pause();
        assert!(narrator.is_paused());
        narrator.resume();
        assert!(!narrator.is_paused());

        narrator.finished();
        assert!(!narrator.is_speaking());
    }
}
