// ABOUTME: PPTX package assembly for the vocab-slides application
// ABOUTME: Holds generated slides and writes the finished PowerPoint file

use crate::assets::AssetArena;
use crate::errors::Result;
use crate::ooxml::{
    ensure_pptx_extension, next_rel_id, parse_relationships, relationships_xml,
    rewrite_app_slide_count, rewrite_content_types, rewrite_core_modified,
    rewrite_slide_id_list, Relationship, REL_TYPE_SLIDE,
};
use crate::template::{SlideTemplate, TemplateSlots};
use crate::utils::ensure_parent_directory_exists;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::{write::FileOptions, ZipWriter};

/// A media file embedded alongside a slide
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One generated slide ready to be packaged
pub struct GeneratedSlide {
    pub xml: String,
    pub rels: Vec<Relationship>,
    pub media: Vec<MediaPart>,
}

/// An in-progress presentation cloned from a template package.
///
/// The template's seed slide stays part of the deck while slides are
/// assembled and is stripped at finalization, so a saved deck holds only
/// the generated slides numbered sequentially from one.
pub struct Presentation {
    parts: BTreeMap<String, Vec<u8>>,
    content_types_xml: String,
    presentation_xml: String,
    presentation_rels: String,
    template_slots: TemplateSlots,
    template_slide_xml: String,
    template_slide_rels: String,
    seed_present: bool,
    slides: Vec<GeneratedSlide>,
}

impl Presentation {
    pub fn from_template(template: SlideTemplate) -> Self {
        Self {
            parts: template.parts,
            content_types_xml: template.content_types_xml,
            presentation_xml: template.presentation_xml,
            presentation_rels: template.presentation_rels,
            template_slots: template.slots,
            template_slide_xml: template.slide_xml,
            template_slide_rels: template.slide_rels,
            seed_present: true,
            slides: Vec::new(),
        }
    }

    pub fn slots(&self) -> &TemplateSlots {
        &self.template_slots
    }

    pub fn template_slide_xml(&self) -> &str {
        &self.template_slide_xml
    }

    pub fn template_slide_rels(&self) -> &str {
        &self.template_slide_rels
    }

    pub fn append_slide(&mut self, slide: GeneratedSlide) {
        self.slides.push(slide);
    }

    /// Slides the deck currently holds, seed slide included while present
    pub fn slide_count(&self) -> usize {
        self.slides.len() + usize::from(self.seed_present)
    }

    pub fn generated_count(&self) -> usize {
        self.slides.len()
    }

    /// Drop the template's seed slide from the deck
    pub fn strip_template_slide(&mut self) {
        if self.seed_present {
            debug!("Stripping template seed slide from the deck");
            self.seed_present = false;
        }
    }

    /// Write the deck to disk, renumbering slides sequentially
    pub fn save(&self, output_path: &Path) -> Result<PathBuf> {
        let output_path = ensure_pptx_extension(output_path);
        ensure_parent_directory_exists(&output_path)?;

        // Seed slide first when still present, then generated slides in order
        let mut saved: Vec<(&str, Vec<Relationship>, &[MediaPart])> = Vec::new();
        if self.seed_present {
            saved.push((
                &self.template_slide_xml,
                parse_relationships(&self.template_slide_rels)?,
                &[],
            ));
        }
        for slide in &self.slides {
            saved.push((&slide.xml, slide.rels.clone(), &slide.media));
        }
        let slide_total = saved.len();

        let mut media_extensions: BTreeSet<String> = BTreeSet::new();
        for (_, _, media) in &saved {
            for part in *media {
                if let Some(ext) = Path::new(&part.filename).extension().and_then(|e| e.to_str())
                {
                    media_extensions.insert(ext.to_lowercase());
                }
            }
        }
        let media_extensions: Vec<String> = media_extensions.into_iter().collect();

        let content_types =
            rewrite_content_types(&self.content_types_xml, slide_total, &media_extensions)?;

        // Presentation-level rels keep everything except old slide entries;
        // each saved slide gets a fresh rId and a 256-based slide id.
        let mut presentation_rels: Vec<Relationship> =
            parse_relationships(&self.presentation_rels)?
                .into_iter()
                .filter(|rel| rel.rel_type != REL_TYPE_SLIDE)
                .collect();
        let mut next_id = next_rel_id(&presentation_rels);
        let mut slide_ids: Vec<(u32, String)> = Vec::new();
        for index in 0..slide_total {
            let rid = format!("rId{}", next_id);
            next_id += 1;
            presentation_rels.push(Relationship {
                id: rid.clone(),
                rel_type: REL_TYPE_SLIDE.to_string(),
                target: format!("slides/slide{}.xml", index + 1),
                target_mode: None,
            });
            slide_ids.push((256 + index as u32, rid));
        }
        let presentation_xml = rewrite_slide_id_list(&self.presentation_xml, &slide_ids)?;

        info!(
            "Saving presentation with {} slides to {:?}",
            slide_total, output_path
        );

        let file = std::fs::File::create(&output_path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();
        let mut written: HashSet<String> = HashSet::new();

        let write_part = |zip: &mut ZipWriter<std::fs::File>,
                              written: &mut HashSet<String>,
                              name: &str,
                              bytes: &[u8]|
         -> Result<()> {
            if !written.insert(name.to_string()) {
                return Ok(());
            }
            zip.start_file(name, options)?;
            zip.write_all(bytes)?;
            Ok(())
        };

        write_part(
            &mut zip,
            &mut written,
            "[Content_Types].xml",
            content_types.as_bytes(),
        )?;
        write_part(
            &mut zip,
            &mut written,
            "ppt/presentation.xml",
            presentation_xml.as_bytes(),
        )?;
        write_part(
            &mut zip,
            &mut written,
            "ppt/_rels/presentation.xml.rels",
            relationships_xml(&presentation_rels).as_bytes(),
        )?;

        for (index, (xml, rels, media)) in saved.iter().enumerate() {
            let slide_name = format!("ppt/slides/slide{}.xml", index + 1);
            let rels_name = format!("ppt/slides/_rels/slide{}.xml.rels", index + 1);
            write_part(&mut zip, &mut written, &slide_name, xml.as_bytes())?;
            write_part(
                &mut zip,
                &mut written,
                &rels_name,
                relationships_xml(rels).as_bytes(),
            )?;
            for part in *media {
                let media_name = format!("ppt/media/{}", part.filename);
                write_part(&mut zip, &mut written, &media_name, &part.bytes)?;
            }
        }

        // Document property updates are best-effort: a part that cannot be
        // rewritten is carried through unchanged.
        let modified = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        for (name, bytes) in &self.parts {
            if name.starts_with("ppt/slides/") {
                continue;
            }
            let rewritten = if name == "docProps/app.xml" {
                rewrite_app_slide_count(&String::from_utf8_lossy(bytes), slide_total)
            } else if name == "docProps/core.xml" {
                rewrite_core_modified(&String::from_utf8_lossy(bytes), &modified)
            } else {
                write_part(&mut zip, &mut written, name, bytes)?;
                continue;
            };
            match rewritten {
                Ok(updated) => write_part(&mut zip, &mut written, name, updated.as_bytes())?,
                Err(e) => {
                    warn!("Keeping {} unchanged; rewrite failed: {}", name, e);
                    write_part(&mut zip, &mut written, name, bytes)?;
                }
            }
        }

        zip.finish()?;
        info!("Presentation saved to {:?}", output_path);
        Ok(output_path)
    }
}

/// Strip the seed slide, save the deck, and clean up staged assets.
///
/// Asset cleanup runs whether or not the save succeeds.
pub fn finalize(
    mut presentation: Presentation,
    output_path: &Path,
    arena: &mut AssetArena,
) -> Result<PathBuf> {
    presentation.strip_template_slide();
    let result = presentation.save(output_path);
    arena.cleanup();
    result
}
