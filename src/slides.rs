// ABOUTME: Slide assembly engine turning vocabulary entries into deck slides
// ABOUTME: Fills template placeholders and attaches audio and image media

use crate::assets::{AssetArena, AssetHandle, AssetKind};
use crate::errors::{Result, VocabError};
use crate::images::{derive_image_query, ImageRetriever};
use crate::ooxml::{
    media_content_type, next_rel_id, parse_relationships, Relationship, REL_TYPE_AUDIO,
    REL_TYPE_IMAGE, REL_TYPE_MEDIA,
};
use crate::pinyin::transliterate;
use crate::pptx::{GeneratedSlide, MediaPart, Presentation};
use crate::slidexml::{
    append_shapes, audio_shape_xml, hotspot_shape_xml, picture_shape_xml,
    set_placeholder_texts, AUDIO_LEFT_EMU, AUDIO_SIZE_EMU, AUDIO_TOP_EMU, IMAGE_LEFT_EMU,
    IMAGE_TOP_EMU, IMAGE_WIDTH_EMU,
};
use crate::template::{ContentRole, PlaceholderSlot, TemplateSlots};
use crate::tts::SpeechSynthesizer;
use crate::vocab::VocabularyEntry;
use log::{debug, info, warn};
use std::path::Path;

const AUDIO_POSTER_NAME: &str = "audio-icon.png";

// Generated shape ids start well above anything a template slide uses
const FIRST_SHAPE_ID: u32 = 900;

/// Counters describing how assembly went
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyStats {
    pub slides: usize,
    pub audio_clips: usize,
    pub audio_failures: usize,
    pub images_retrieved: usize,
    pub image_fallbacks: usize,
    pub images_missing: usize,
}

/// Build one slide per vocabulary entry.
///
/// Failures while decorating a slide degrade that slide rather than dropping
/// it: the deck always gains exactly one slide per entry. Audio and image
/// problems are logged and counted in the returned stats.
pub fn assemble_slides(
    presentation: &mut Presentation,
    entries: &[VocabularyEntry],
    speech: &dyn SpeechSynthesizer,
    images: &dyn ImageRetriever,
    fallback_image: Option<&Path>,
    arena: &mut AssetArena,
) -> Result<AssemblyStats> {
    let slots = presentation.slots().clone();
    let seed_xml = presentation.template_slide_xml().to_string();
    let seed_rels = parse_relationships(presentation.template_slide_rels())?;

    let fallback_handle = match fallback_image {
        Some(path) => stage_fallback_image(path, arena),
        None => None,
    };

    let mut stats = AssemblyStats::default();
    let total = entries.len();
    for (index, entry) in entries.iter().enumerate() {
        info!(
            "Assembling slide {}/{} for '{}'",
            index + 1,
            total,
            entry.source_text
        );
        let slide = match build_entry_slide(
            &seed_xml,
            &seed_rels,
            &slots,
            entry,
            speech,
            images,
            fallback_handle.as_ref(),
            arena,
            &mut stats,
        ) {
            Ok(slide) => slide,
            Err(e) => {
                warn!(
                    "Falling back to a bare slide for '{}': {}",
                    entry.source_text, e
                );
                GeneratedSlide {
                    xml: seed_xml.clone(),
                    rels: seed_rels.clone(),
                    media: Vec::new(),
                }
            }
        };
        presentation.append_slide(slide);
        stats.slides += 1;
    }

    info!(
        "Assembled {} slides ({} audio clips, {} audio failures, {} searched images, {} fallbacks, {} without images)",
        stats.slides,
        stats.audio_clips,
        stats.audio_failures,
        stats.images_retrieved,
        stats.image_fallbacks,
        stats.images_missing
    );
    Ok(stats)
}

fn build_entry_slide(
    seed_xml: &str,
    seed_rels: &[Relationship],
    slots: &TemplateSlots,
    entry: &VocabularyEntry,
    speech: &dyn SpeechSynthesizer,
    images: &dyn ImageRetriever,
    fallback: Option<&AssetHandle>,
    arena: &mut AssetArena,
    stats: &mut AssemblyStats,
) -> Result<GeneratedSlide> {
    let phonetic = transliterate(&entry.source_text);
    let target = entry.target_text.as_deref().unwrap_or("");

    let mut texts: Vec<(u32, &str)> = Vec::new();
    if let Some(slot) = slots.get(ContentRole::Title) {
        texts.push((slot.index, entry.source_text.as_str()));
    }
    if let Some(slot) = slots.get(ContentRole::Subtitle) {
        texts.push((slot.index, target));
    }
    if let Some(slot) = slots.get(ContentRole::Phonetic) {
        texts.push((slot.index, phonetic.as_str()));
    }

    let mut builder = SlideBuilder::new(seed_xml, seed_rels, &texts)?;

    match slots.get(ContentRole::Media) {
        Some(slot) => match speech.synthesize(&entry.source_text, arena) {
            Ok(handle) => {
                builder.attach_audio(&handle, slot, &entry.source_text)?;
                stats.audio_clips += 1;
            }
            Err(e) => {
                warn!("Audio unavailable for '{}': {}", entry.source_text, e);
                stats.audio_failures += 1;
            }
        },
        None => debug!(
            "Template has no media placeholder; skipping audio for '{}'",
            entry.source_text
        ),
    }

    let retrieved = if target.trim().is_empty() {
        None
    } else {
        let query = derive_image_query(target);
        match images.retrieve(&query, arena) {
            Ok(found) => found,
            Err(e) => {
                warn!("Image search failed for '{}': {}", query, e);
                None
            }
        }
    };
    match retrieved {
        Some(handle) => {
            builder.attach_image(&handle, &entry.source_text)?;
            stats.images_retrieved += 1;
        }
        None => match fallback {
            Some(handle) => {
                builder.attach_image(handle, &entry.source_text)?;
                stats.image_fallbacks += 1;
            }
            None => stats.images_missing += 1,
        },
    }

    builder.finish()
}

/// Accumulates one slide's XML, relationships, media, and appended shapes
struct SlideBuilder {
    xml: String,
    rels: Vec<Relationship>,
    media: Vec<MediaPart>,
    fragments: Vec<String>,
    next_shape_id: u32,
}

impl SlideBuilder {
    fn new(seed_xml: &str, seed_rels: &[Relationship], texts: &[(u32, &str)]) -> Result<Self> {
        let xml = set_placeholder_texts(seed_xml, texts)?;
        Ok(Self {
            xml,
            rels: seed_rels.to_vec(),
            media: Vec::new(),
            fragments: Vec::new(),
            next_shape_id: FIRST_SHAPE_ID,
        })
    }

    fn add_rel(&mut self, rel_type: &str, target: &str) -> String {
        let rid = format!("rId{}", next_rel_id(&self.rels));
        self.rels.push(Relationship {
            id: rid.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: None,
        });
        rid
    }

    fn take_shape_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    fn attach_audio(
        &mut self,
        handle: &AssetHandle,
        slot: &PlaceholderSlot,
        label: &str,
    ) -> Result<()> {
        let bytes = std::fs::read(&handle.path)?;
        let filename = media_filename(&handle.path)?;
        let target = format!("../media/{}", filename);

        let audio_rid = self.add_rel(REL_TYPE_AUDIO, &target);
        let media_rid = self.add_rel(REL_TYPE_MEDIA, &target);
        let poster_rid =
            self.add_rel(REL_TYPE_IMAGE, &format!("../media/{}", AUDIO_POSTER_NAME));
        self.media.push(MediaPart { filename, bytes });
        self.media.push(MediaPart {
            filename: AUDIO_POSTER_NAME.to_string(),
            bytes: poster_image_png()?,
        });

        let (x, y) = slot.offset.unwrap_or((AUDIO_LEFT_EMU, AUDIO_TOP_EMU));
        let (cx, cy) = slot.extent.unwrap_or((AUDIO_SIZE_EMU, AUDIO_SIZE_EMU));

        let audio_id = self.take_shape_id();
        self.fragments.push(audio_shape_xml(
            audio_id,
            &format!("Audio {}", label),
            &audio_rid,
            &media_rid,
            &poster_rid,
            x,
            y,
            cx,
            cy,
        ));
        let hotspot_id = self.take_shape_id();
        self.fragments.push(hotspot_shape_xml(
            hotspot_id,
            &format!("Play {}", label),
            x,
            y,
            cx,
            cy,
        ));
        Ok(())
    }

    fn attach_image(&mut self, handle: &AssetHandle, label: &str) -> Result<()> {
        let bytes = std::fs::read(&handle.path)?;
        let filename = media_filename(&handle.path)?;

        // Preserve the image's aspect ratio at a fixed display width
        let height = match image::image_dimensions(&handle.path) {
            Ok((w, h)) if w > 0 => {
                (IMAGE_WIDTH_EMU as i128 * i128::from(h) / i128::from(w)) as i64
            }
            _ => IMAGE_WIDTH_EMU,
        };

        let rid = self.add_rel(REL_TYPE_IMAGE, &format!("../media/{}", filename));
        self.media.push(MediaPart { filename, bytes });

        let shape_id = self.take_shape_id();
        self.fragments.push(picture_shape_xml(
            shape_id,
            &format!("Illustration {}", label),
            &rid,
            IMAGE_LEFT_EMU,
            IMAGE_TOP_EMU,
            IMAGE_WIDTH_EMU,
            height,
        ));
        Ok(())
    }

    fn finish(self) -> Result<GeneratedSlide> {
        let xml = append_shapes(&self.xml, &self.fragments)?;
        Ok(GeneratedSlide {
            xml,
            rels: self.rels,
            media: self.media,
        })
    }
}

/// Register the configured fallback image for reuse across slides.
///
/// Formats the package cannot declare a content type for are converted to a
/// transient PNG copy; the user's file is never modified. Anything unusable
/// degrades to running without a fallback instead of failing the batch.
fn stage_fallback_image(path: &Path, arena: &mut AssetArena) -> Option<AssetHandle> {
    if !path.exists() {
        warn!(
            "Fallback image {:?} does not exist; slides without search hits get no image",
            path
        );
        return None;
    }
    let packageable = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .and_then(|ext| media_content_type(&ext))
        .map_or(false, |content_type| content_type.starts_with("image/"));
    if packageable {
        return Some(arena.register(path.to_path_buf(), AssetKind::Image, false));
    }
    match convert_fallback_to_png(path, arena) {
        Ok(handle) => {
            info!("Converted fallback image {:?} to a PNG copy for packaging", path);
            Some(handle)
        }
        Err(e) => {
            warn!(
                "Fallback image {:?} is not usable ({}); slides without search hits get no image",
                path, e
            );
            None
        }
    }
}

fn convert_fallback_to_png(path: &Path, arena: &mut AssetArena) -> Result<AssetHandle> {
    let img = image::open(path).map_err(|e| {
        VocabError::ValidationError(format!("Fallback file does not decode as an image: {}", e))
    })?;
    let png_path = arena.transient_path(&path.to_string_lossy(), "png");
    img.save_with_format(&png_path, image::ImageFormat::Png)
        .map_err(|e| {
            VocabError::ValidationError(format!("Failed to write PNG copy: {}", e))
        })?;
    Ok(arena.register(png_path, AssetKind::Image, true))
}

fn media_filename(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| {
            VocabError::PptxError(format!("Asset path has no usable filename: {:?}", path))
        })
}

fn poster_image_png() -> Result<Vec<u8>> {
    let pixel = image::Rgba([0u8, 0, 0, 0]);
    let img = image::RgbaImage::from_pixel(1, 1, pixel);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .map_err(|e| VocabError::PptxError(format!("Failed to encode poster image: {}", e)))?;
    Ok(bytes)
}
