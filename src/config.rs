// ABOUTME: Configuration module for the vocab-slides application
// ABOUTME: Provides configuration settings and environment variable handling

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration for the application
pub struct Config {
    /// Language code sent to the speech synthesizer
    pub tts_lang: String,
    /// Locale of the vocabulary source text
    pub source_locale: String,
    /// Locale translations are produced in
    pub target_locale: String,
    /// API key for the image search service, if configured
    pub image_api_key: Option<String>,
    /// Directory where media assets are staged
    pub media_dir: PathBuf,
    /// Image substituted when search returns nothing
    pub fallback_image: Option<PathBuf>,
    /// Whether missing translations are filled automatically
    pub auto_translate: bool,
    /// Timeout applied to outbound HTTP requests
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let media_dir = PathBuf::from("media");
        let fallback_image = Some(media_dir.join("fallback.png"));
        Self {
            tts_lang: "zh".to_string(),
            source_locale: "zh-CN".to_string(),
            target_locale: "en".to_string(),
            image_api_key: None,
            media_dir,
            fallback_image,
            auto_translate: true,
            request_timeout_ms: 10000, // 10 seconds
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tts_lang = env::var("VOCAB_TTS_LANG").unwrap_or(defaults.tts_lang);
        let source_locale = env::var("VOCAB_SOURCE_LOCALE").unwrap_or(defaults.source_locale);
        let target_locale = env::var("VOCAB_TARGET_LOCALE").unwrap_or(defaults.target_locale);
        let image_api_key = env::var("PIXABAY_API_KEY").ok().filter(|k| !k.is_empty());
        let media_dir = env::var("VOCAB_MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.media_dir);
        let fallback_image = env::var("VOCAB_FALLBACK_IMAGE")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(media_dir.join("fallback.png")));
        let auto_translate = env::var("VOCAB_AUTO_TRANSLATE")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);
        let request_timeout_ms = env::var("VOCAB_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_ms);

        Self {
            tts_lang,
            source_locale,
            target_locale,
            image_api_key,
            media_dir,
            fallback_image,
            auto_translate,
            request_timeout_ms,
        }
    }

    /// Timeout for outbound HTTP requests as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
