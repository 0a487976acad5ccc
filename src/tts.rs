// ABOUTME: Speech synthesis for vocabulary audio clips
// ABOUTME: Fetches spoken MP3 audio from the Google Translate TTS endpoint

use crate::assets::{AssetArena, AssetHandle, AssetKind};
use crate::errors::{Result, VocabError};
use log::{debug, info};
use std::time::Duration;

pub const GOOGLE_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Produces an audio clip for a piece of vocabulary text
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str, arena: &mut AssetArena) -> Result<AssetHandle>;
}

/// Speech synthesis backed by the public Google Translate TTS endpoint
pub struct GoogleSpeech {
    client: reqwest::blocking::Client,
    lang: String,
}

impl GoogleSpeech {
    pub fn new(lang: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            lang: lang.to_string(),
        })
    }
}

impl SpeechSynthesizer for GoogleSpeech {
    fn synthesize(&self, text: &str, arena: &mut AssetArena) -> Result<AssetHandle> {
        let url = format!(
            "{}?ie=UTF-8&client=tw-ob&tl={}&q={}",
            GOOGLE_TTS_URL,
            self.lang,
            urlencoding::encode(text)
        );
        debug!("Requesting speech audio for '{}'", text);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(VocabError::SynthesisError(format!(
                "Speech endpoint returned HTTP {} for '{}'",
                response.status(),
                text
            )));
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(VocabError::SynthesisError(format!(
                "Speech endpoint returned no audio for '{}'",
                text
            )));
        }

        let path = arena.transient_path(text, "mp3");
        std::fs::write(&path, &bytes)?;
        info!("Synthesized {} bytes of audio for '{}'", bytes.len(), text);
        Ok(arena.register(path, AssetKind::Audio, true))
    }
}
