// ABOUTME: Machine translation for vocabulary entries missing a translation
// ABOUTME: Uses the public Google Translate endpoint with sentinel fallback

use crate::errors::{Result, VocabError};
use crate::vocab::VocabularyEntry;
use log::{debug, info, warn};
use std::time::Duration;

pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Translates a piece of source-language text
pub trait Translator {
    fn translate(&self, text: &str) -> Result<String>;
}

/// Translation backed by the public Google Translate endpoint
pub struct GoogleTranslate {
    client: reqwest::blocking::Client,
    source: String,
    target: String,
}

impl GoogleTranslate {
    pub fn new(source: &str, target: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            source: source.to_string(),
            target: target.to_string(),
        })
    }
}

impl Translator for GoogleTranslate {
    fn translate(&self, text: &str) -> Result<String> {
        let url = format!(
            "{}?client=gtx&dt=t&sl={}&tl={}&q={}",
            GOOGLE_TRANSLATE_URL,
            self.source,
            self.target,
            urlencoding::encode(text)
        );
        debug!("Requesting translation for '{}'", text);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(VocabError::TranslationError(format!(
                "Translation endpoint returned HTTP {} for '{}'",
                response.status(),
                text
            )));
        }

        // The gtx response is a nested array; the first element lists
        // translated segments, each with the text at position 0.
        let value: serde_json::Value = response.json()?;
        let segments = value.get(0).and_then(|v| v.as_array()).ok_or_else(|| {
            VocabError::TranslationError("Unexpected translation response shape".to_string())
        })?;

        let mut translated = String::new();
        for segment in segments {
            if let Some(part) = segment.get(0).and_then(|p| p.as_str()) {
                translated.push_str(part);
            }
        }

        let translated = translated.trim().to_string();
        if translated.is_empty() {
            return Err(VocabError::TranslationError(format!(
                "Translation response contained no text for '{}'",
                text
            )));
        }
        Ok(translated)
    }
}

/// Visible stand-in used when translation fails for an entry
pub fn translation_sentinel(text: &str) -> String {
    format!("[translation failed: {}]", text)
}

/// Fill in missing translations in place, returning how many were filled.
///
/// Entries whose translation is absent or blank get a machine translation;
/// if that fails they get the sentinel text so the slide still shows
/// something recognizable.
pub fn fill_missing_translations(
    entries: &mut [VocabularyEntry],
    translator: &dyn Translator,
) -> usize {
    let mut filled = 0;
    for entry in entries.iter_mut() {
        let missing = entry
            .target_text
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);
        if !missing {
            continue;
        }
        let translated = match translator.translate(&entry.source_text) {
            Ok(text) => {
                info!("Translated '{}' to '{}'", entry.source_text, text);
                text
            }
            Err(e) => {
                warn!("Translation failed for '{}': {}", entry.source_text, e);
                translation_sentinel(&entry.source_text)
            }
        };
        entry.target_text = Some(translated);
        filled += 1;
    }
    filled
}
