// ABOUTME: End-to-end deck generation pipeline
// ABOUTME: Wires vocabulary, template, synthesis, and packaging together

use crate::assets::AssetArena;
use crate::config::Config;
use crate::errors::Result;
use crate::images::{DisabledImageSearch, ImageRetriever, PixabaySearch};
use crate::pptx::{finalize, Presentation};
use crate::slides::{assemble_slides, AssemblyStats};
use crate::template::SlideTemplate;
use crate::translate::{fill_missing_translations, GoogleTranslate};
use crate::tts::GoogleSpeech;
use crate::vocab::{ensure_not_empty, VocabularyEntry};
use log::info;
use std::path::{Path, PathBuf};

/// Summary of a finished deck generation run
pub struct DeckReport {
    pub output_path: PathBuf,
    pub slides: usize,
    pub stats: AssemblyStats,
}

/// Generate a vocabulary deck from entries, a template, and configuration
pub fn generate_deck(
    mut entries: Vec<VocabularyEntry>,
    template_path: &Path,
    output_path: &Path,
    config: &Config,
) -> Result<DeckReport> {
    ensure_not_empty(&entries)?;

    if config.auto_translate {
        let missing = entries
            .iter()
            .any(|e| e.target_text.as_deref().map(|t| t.trim().is_empty()).unwrap_or(true));
        if missing {
            let translator = GoogleTranslate::new(
                &config.source_locale,
                &config.target_locale,
                config.request_timeout(),
            )?;
            let filled = fill_missing_translations(&mut entries, &translator);
            info!("Filled {} missing translations", filled);
        }
    }

    let template = SlideTemplate::load(template_path)?;
    let mut presentation = Presentation::from_template(template);

    let speech = GoogleSpeech::new(&config.tts_lang, config.request_timeout())?;
    let retriever: Box<dyn ImageRetriever> = match &config.image_api_key {
        Some(key) => Box::new(PixabaySearch::new(key, config.request_timeout())?),
        None => {
            info!("No image API key configured; relying on the fallback image");
            Box::new(DisabledImageSearch)
        }
    };

    let mut arena = AssetArena::create(&config.media_dir)?;
    let assembled = assemble_slides(
        &mut presentation,
        &entries,
        &speech,
        retriever.as_ref(),
        config.fallback_image.as_deref(),
        &mut arena,
    );
    let stats = match assembled {
        Ok(stats) => stats,
        Err(e) => {
            arena.cleanup();
            return Err(e);
        }
    };

    let slides = presentation.generated_count();
    let output_path = finalize(presentation, output_path, &mut arena)?;
    info!("Created {:?} with {} slides", output_path, slides);

    Ok(DeckReport {
        output_path,
        slides,
        stats,
    })
}
