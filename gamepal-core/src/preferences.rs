//! Display, theme, language and speech preferences.
//!
//! Each store persists its value and then applies it to a [`Document`], the
//! surface the front end renders on.

use crate::storage::{keys, Persisted, Storage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Where preferences take visible effect.
pub trait Document: Send + Sync {
    fn set_font_size(&self, size: &str);
    fn set_class(&self, name: &str, enabled: bool);
    fn set_cookie(&self, name: &str, value: &str);
    fn cookie(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Default)]
struct DocumentState {
    font_size: Option<String>,
    classes: BTreeSet<String>,
    cookies: HashMap<String, String>,
}

/// A [`Document`] that only records what was applied. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    state: Arc<Mutex<DocumentState>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn font_size(&self) -> Option<String> {
        self.state().font_size.clone()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.state().classes.contains(name)
    }
}

impl Document for MemoryDocument {
    fn set_font_size(&self, size: &str) {
        self.state().font_size = Some(size.to_string());
    }

    fn set_class(&self, name: &str, enabled: bool) {
        let mut state = self.state();
        if enabled {
            state.classes.insert(name.to_string());
        } else {
            state.classes.remove(name);
        }
    }

    fn set_cookie(&self, name: &str, value: &str) {
        self.state()
            .cookies
            .insert(name.to_string(), value.to_string());
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.state().cookies.get(name).cloned()
    }
}

// ============================================================================
// Settings
// ============================================================================

pub const DYSLEXIA_CLASS: &str = "dyslexia-mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Root font size in CSS pixels.
    pub fn css_value(&self) -> &'static str {
        match self {
            FontSize::Small => "14px",
            FontSize::Medium => "16px",
            FontSize::Large => "18px",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "small" => Some(FontSize::Small),
            "medium" => Some(FontSize::Medium),
            "large" => Some(FontSize::Large),
            _ => None,
        }
    }
}

/// Missing fields in stored settings take their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub font_size: FontSize,
    pub is_dyslexia_mode: bool,
}

pub struct SettingsStore {
    settings: Persisted<Settings>,
    document: Arc<dyn Document>,
}

impl SettingsStore {
    pub fn load(storage: Storage, document: Arc<dyn Document>) -> Self {
        let store = Self {
            settings: Persisted::load(storage, keys::SETTINGS, Settings::default()),
            document,
        };
        store.apply();
        store
    }

    pub fn settings(&self) -> Settings {
        *self.settings.get()
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.settings.update(|s| s.font_size = size);
        self.apply();
    }

    pub fn set_dyslexia_mode(&mut self, enabled: bool) {
        self.settings.update(|s| s.is_dyslexia_mode = enabled);
        self.apply();
    }

    fn apply(&self) {
        let settings = self.settings.get();
        self.document
            .set_font_size(settings.font_size.css_value());
        self.document
            .set_class(DYSLEXIA_CLASS, settings.is_dyslexia_mode);
    }

    pub fn reload(&mut self) {
        self.settings.reload();
        self.apply();
    }

    pub fn clear(&mut self) {
        self.settings.clear();
        self.apply();
    }
}

// ============================================================================
// Theme
// ============================================================================

pub const LIGHT_CLASS: &str = "light";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

pub struct ThemeStore {
    storage: Storage,
    document: Arc<dyn Document>,
    theme: Theme,
}

impl ThemeStore {
    /// Stored values other than `dark`/`light` are ignored.
    pub fn load(storage: Storage, document: Arc<dyn Document>) -> Self {
        let theme = Self::stored(&storage);
        let store = Self {
            storage,
            document,
            theme,
        };
        store.apply();
        store
    }

    fn stored(storage: &Storage) -> Theme {
        storage
            .load_raw(keys::THEME)
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, theme: Theme) {
        self.theme = theme;
        self.storage.save_raw(keys::THEME, theme.as_str());
        self.apply();
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled());
        self.theme
    }

    fn apply(&self) {
        self.document
            .set_class(LIGHT_CLASS, self.theme == Theme::Light);
    }

    pub fn reload(&mut self) {
        self.theme = Self::stored(&self.storage);
        self.apply();
    }

    pub fn clear(&mut self) {
        self.storage.clear(keys::THEME);
        self.theme = Theme::default();
        self.apply();
    }
}

// ============================================================================
// Locale
// ============================================================================

pub const LOCALE_COOKIE: &str = "gamepal-locale";
pub const SUPPORTED_LOCALES: &[&str] = &["en", "fr"];
pub const DEFAULT_LOCALE: &str = "en";

/// UI language, kept in a cookie rather than key-value storage.
pub struct LocaleStore {
    document: Arc<dyn Document>,
    locale: &'static str,
}

impl LocaleStore {
    pub fn load(document: Arc<dyn Document>) -> Self {
        let locale = Self::stored(document.as_ref());
        Self { document, locale }
    }

    fn stored(document: &dyn Document) -> &'static str {
        document
            .cookie(LOCALE_COOKIE)
            .and_then(|code| Self::supported(&code))
            .unwrap_or(DEFAULT_LOCALE)
    }

    fn supported(code: &str) -> Option<&'static str> {
        let code = code.trim().to_lowercase();
        SUPPORTED_LOCALES.iter().copied().find(|l| *l == code)
    }

    pub fn locale(&self) -> &'static str {
        self.locale
    }

    /// Switch language. Unknown codes fall back to the default. Returns the locale in effect.
    pub fn set(&mut self, code: &str) -> &'static str {
        self.locale = Self::supported(code).unwrap_or_else(|| {
            debug!(code, "unsupported locale; using default");
            DEFAULT_LOCALE
        });
        self.document.set_cookie(LOCALE_COOKIE, self.locale);
        self.locale
    }

    /// Re-read the cookie.
    pub fn reload(&mut self) {
        self.locale = Self::stored(self.document.as_ref());
    }
}

// ============================================================================
// Speech
// ============================================================================

pub const MIN_SPEECH_RATE: f32 = 0.5;
pub const MAX_SPEECH_RATE: f32 = 2.0;
pub const DEFAULT_SPEECH_RATE: f32 = 1.0;

/// Preferred voice and speaking rate.
pub struct SpeechPrefs {
    storage: Storage,
    voice: Option<String>,
    rate: f32,
}

impl SpeechPrefs {
    pub fn load(storage: Storage) -> Self {
        let (voice, rate) = Self::stored(&storage);
        Self {
            storage,
            voice,
            rate,
        }
    }

    fn stored(storage: &Storage) -> (Option<String>, f32) {
        let voice = storage.load_raw(keys::TTS_VOICE).filter(|v| !v.is_empty());
        let rate = storage
            .load_raw(keys::TTS_RATE)
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|rate| rate.is_finite())
            .map_or(DEFAULT_SPEECH_RATE, clamp_rate);
        (voice, rate)
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn set_voice(&mut self, voice: &str) {
        self.voice = Some(voice.to_string());
        self.storage.save_raw(keys::TTS_VOICE, voice);
    }

    /// Store `rate` clamped to the supported range.
    pub fn set_rate(&mut self, rate: f32) -> f32 {
        self.rate = if rate.is_finite() {
            clamp_rate(rate)
        } else {
            DEFAULT_SPEECH_RATE
        };
        self.storage
            .save_raw(keys::TTS_RATE, &self.rate.to_string());
        self.rate
    }

    pub fn reload(&mut self) {
        (self.voice, self.rate) = Self::stored(&self.storage);
    }

    pub fn clear(&mut self) {
        self.storage.clear(keys::TTS_VOICE);
        self.storage.clear(keys::TTS_RATE);
        self.voice = None;
        self.rate = DEFAULT_SPEECH_RATE;
    }
}

fn clamp_rate(rate: f32) -> f32 {
    rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE)
}
