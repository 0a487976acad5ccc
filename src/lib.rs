// ABOUTME: Library module for the vocab-slides program.
// ABOUTME: Contains core functionality for building vocabulary PPTX decks.

// Reexport modules
pub mod assets;
pub mod config;
pub mod deck;
pub mod errors;
pub mod images;
pub mod ooxml;
pub mod pinyin;
pub mod pptx;
pub mod slides;
pub mod slidexml;
pub mod template;
pub mod translate;
pub mod tts;
pub mod utils;
pub mod vocab;

// Reexport common types and functions
pub use assets::{AssetArena, AssetHandle, AssetKind};
pub use config::Config;
pub use deck::{generate_deck, DeckReport};
pub use errors::{Result, VocabError};
pub use images::{DisabledImageSearch, ImageRetriever, PixabaySearch};
pub use pinyin::transliterate;
pub use pptx::{finalize, GeneratedSlide, MediaPart, Presentation};
pub use slides::{assemble_slides, AssemblyStats};
pub use template::{ContentRole, SlideTemplate, TemplateSlots};
pub use translate::{fill_missing_translations, GoogleTranslate, Translator};
pub use tts::{GoogleSpeech, SpeechSynthesizer};
pub use vocab::{is_end_sentinel, parse_vocab_lines, read_vocab_csv, VocabularyEntry};

#[cfg(test)]
mod tests;
