// ABOUTME: Template deck loading and placeholder discovery
// ABOUTME: Reads a one-slide PPTX and maps content roles to its placeholders

use crate::errors::{Result, VocabError};
use crate::ooxml::{is_slide_part, placeholder_index};
use crate::utils::validate_file_exists;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// The kinds of content a slide can carry, each bound to a placeholder index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    Title,
    Subtitle,
    Phonetic,
    Media,
}

impl ContentRole {
    pub const ALL: [ContentRole; 4] = [
        ContentRole::Title,
        ContentRole::Subtitle,
        ContentRole::Phonetic,
        ContentRole::Media,
    ];

    /// Placeholder index this role binds to in the template slide
    pub fn placeholder_index(self) -> u32 {
        match self {
            ContentRole::Title => 0,
            ContentRole::Subtitle => 1,
            ContentRole::Phonetic => 14,
            ContentRole::Media => 15,
        }
    }

    pub fn from_placeholder_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(ContentRole::Title),
            1 => Some(ContentRole::Subtitle),
            14 => Some(ContentRole::Phonetic),
            15 => Some(ContentRole::Media),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentRole::Title => "title",
            ContentRole::Subtitle => "subtitle",
            ContentRole::Phonetic => "phonetic",
            ContentRole::Media => "media",
        }
    }
}

/// A placeholder found in the template slide, with its position if declared
#[derive(Debug, Clone)]
pub struct PlaceholderSlot {
    pub index: u32,
    pub offset: Option<(i64, i64)>,
    pub extent: Option<(i64, i64)>,
}

/// Which content roles the template slide actually provides.
///
/// Slides are filled by capability: roles the template lacks are skipped
/// rather than treated as errors.
#[derive(Debug, Clone, Default)]
pub struct TemplateSlots {
    title: Option<PlaceholderSlot>,
    subtitle: Option<PlaceholderSlot>,
    phonetic: Option<PlaceholderSlot>,
    media: Option<PlaceholderSlot>,
}

impl TemplateSlots {
    pub fn get(&self, role: ContentRole) -> Option<&PlaceholderSlot> {
        match role {
            ContentRole::Title => self.title.as_ref(),
            ContentRole::Subtitle => self.subtitle.as_ref(),
            ContentRole::Phonetic => self.phonetic.as_ref(),
            ContentRole::Media => self.media.as_ref(),
        }
    }

    pub fn set(&mut self, role: ContentRole, slot: PlaceholderSlot) {
        let target = match role {
            ContentRole::Title => &mut self.title,
            ContentRole::Subtitle => &mut self.subtitle,
            ContentRole::Phonetic => &mut self.phonetic,
            ContentRole::Media => &mut self.media,
        };
        *target = Some(slot);
    }

    pub fn is_empty(&self) -> bool {
        ContentRole::ALL.iter().all(|role| self.get(*role).is_none())
    }
}

/// A loaded template package, split into the parts slide generation rewrites
pub struct SlideTemplate {
    /// Parts carried through to the output unchanged
    pub parts: BTreeMap<String, Vec<u8>>,
    pub slide_xml: String,
    pub slide_rels: String,
    pub slide_part_name: String,
    pub content_types_xml: String,
    pub presentation_xml: String,
    pub presentation_rels: String,
    pub slots: TemplateSlots,
}

impl SlideTemplate {
    /// Load a template deck, requiring exactly one slide in the package
    pub fn load(path: &Path) -> Result<Self> {
        validate_file_exists(path)?;
        if let Ok(metadata) = std::fs::metadata(path) {
            if let Ok(modified) = metadata.modified() {
                let modified: DateTime<Local> = modified.into();
                debug!(
                    "Template {:?} last modified {}",
                    path,
                    modified.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        info!("Loading slide template from {:?}", path);

        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let mut parts: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            parts.insert(name, bytes);
        }

        let slide_parts: Vec<String> = parts
            .keys()
            .filter(|name| is_slide_part(name))
            .cloned()
            .collect();
        let slide_part_name = match slide_parts.as_slice() {
            [single] => single.clone(),
            [] => {
                return Err(VocabError::TemplateError(format!(
                    "Template {:?} contains no slides; expected exactly one",
                    path
                )))
            }
            many => {
                return Err(VocabError::TemplateError(format!(
                    "Template {:?} contains {} slides; expected exactly one",
                    path,
                    many.len()
                )))
            }
        };

        let slide_xml = take_text_part(&mut parts, &slide_part_name)?;
        let slide_rels = take_text_part(&mut parts, &slide_rels_name(&slide_part_name))?;
        let content_types_xml = take_text_part(&mut parts, "[Content_Types].xml")?;
        let presentation_xml = take_text_part(&mut parts, "ppt/presentation.xml")?;
        let presentation_rels = take_text_part(&mut parts, "ppt/_rels/presentation.xml.rels")?;

        let slots = parse_template_slots(&slide_xml)?;
        if slots.is_empty() {
            warn!("Template slide declares none of the expected placeholders");
        }
        for role in ContentRole::ALL {
            match slots.get(role) {
                Some(slot) => debug!(
                    "Template provides {} placeholder at idx {}",
                    role.label(),
                    slot.index
                ),
                None => debug!("Template has no {} placeholder", role.label()),
            }
        }

        Ok(Self {
            parts,
            slide_xml,
            slide_rels,
            slide_part_name,
            content_types_xml,
            presentation_xml,
            presentation_rels,
            slots,
        })
    }
}

fn take_text_part(parts: &mut BTreeMap<String, Vec<u8>>, name: &str) -> Result<String> {
    let bytes = parts.remove(name).ok_or_else(|| {
        VocabError::TemplateError(format!("Template is missing required part '{}'", name))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        VocabError::TemplateError(format!("Part '{}' is not valid UTF-8: {}", name, e))
    })
}

fn slide_rels_name(slide_part_name: &str) -> String {
    match slide_part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", slide_part_name),
    }
}

struct ShapeProbe {
    index: Option<u32>,
    offset: Option<(i64, i64)>,
    extent: Option<(i64, i64)>,
}

/// Walk the slide XML and record which placeholder roles its shapes provide
pub fn parse_template_slots(slide_xml: &str) -> Result<TemplateSlots> {
    let mut reader = Reader::from_str(slide_xml);
    let mut slots = TemplateSlots::default();
    let mut stack: Vec<ShapeProbe> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"p:sp" => {
                stack.push(ShapeProbe {
                    index: None,
                    offset: None,
                    extent: None,
                });
            }
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"p:ph" => {
                    if let Some(probe) = stack.last_mut() {
                        if probe.index.is_none() {
                            probe.index = Some(placeholder_index(&e)?);
                        }
                    }
                }
                b"a:off" => {
                    if let Some(probe) = stack.last_mut() {
                        if probe.offset.is_none() {
                            probe.offset = parse_point(&e, b"x", b"y")?;
                        }
                    }
                }
                b"a:ext" => {
                    if let Some(probe) = stack.last_mut() {
                        if probe.extent.is_none() {
                            probe.extent = parse_point(&e, b"cx", b"cy")?;
                        }
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"p:sp" => {
                if let Some(probe) = stack.pop() {
                    if let Some(index) = probe.index {
                        if let Some(role) = ContentRole::from_placeholder_index(index) {
                            if slots.get(role).is_none() {
                                slots.set(
                                    role,
                                    PlaceholderSlot {
                                        index,
                                        offset: probe.offset,
                                        extent: probe.extent,
                                    },
                                );
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(slots)
}

fn parse_point(e: &BytesStart, first: &[u8], second: &[u8]) -> Result<Option<(i64, i64)>> {
    let mut a: Option<i64> = None;
    let mut b: Option<i64> = None;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?;
        if attr.key.as_ref() == first {
            a = value.parse::<i64>().ok();
        } else if attr.key.as_ref() == second {
            b = value.parse::<i64>().ok();
        }
    }
    Ok(match (a, b) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    })
}
