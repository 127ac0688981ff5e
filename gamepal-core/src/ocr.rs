//! Extracting rule text from photos through an external recognizer.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR failed: {0}")]
    Recognition(String),

    #[error("Unreadable image: {0}")]
    Image(String),
}

/// Reports recognition progress as a fraction in `[0, 1]`.
pub type ProgressFn<'a> = &'a (dyn Fn(f32) + Send + Sync);

/// An OCR engine.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in `image` using the engine language code `language` (e.g. `eng`).
    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: ProgressFn<'_>,
    ) -> Result<String, OcrError>;
}

/// Engine language for a UI locale; unknown locales read as English.
pub fn language_for_locale(locale: &str) -> &'static str {
    match locale {
        "fr" => "fra",
        "en" => "eng",
        "de" => "deu",
        "es" => "spa",
        "it" => "ita",
        _ => "eng",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    pub is_loading: bool,
    /// Percent, 0 to 100.
    pub progress: u8,
    pub extracted_text: String,
    pub last_error: Option<String>,
}

struct ScanGuard<'a>(&'a watch::Sender<ScanState>);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|state| state.is_loading = false);
    }
}

/// Runs recognitions and publishes their state.
pub struct Scanner<R: TextRecognizer> {
    recognizer: R,
    state: watch::Sender<ScanState>,
}

impl<R: TextRecognizer> Scanner<R> {
    pub fn new(recognizer: R) -> Self {
        let (state, _) = watch::channel(ScanState::default());
        Self { recognizer, state }
    }

    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    pub async fn extract_text(&self, image: &[u8], locale: &str) -> Result<String, OcrError> {
        self.state.send_replace(ScanState {
            is_loading: true,
            ..ScanState::default()
        });
        let _loading = ScanGuard(&self.state);

        let on_progress = |fraction: f32| {
            let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
            self.state.send_modify(|state| state.progress = percent);
        };

        match self
            .recognizer
            .recognize(image, language_for_locale(locale), &on_progress)
            .await
        {
            Ok(text) => {
                self.state
                    .send_modify(|state| state.extracted_text = text.clone());
                Ok(text)
            }
            Err(err) => {
                warn!(locale, error = %err, "text recognition failed");
                let message = err.to_string();
                self.state
                    .send_modify(|state| state.last_error = Some(message));
                Err(err)
            }
        }
    }

    pub fn reset(&self) {
        self.state.send_replace(ScanState::default());
    }
}
