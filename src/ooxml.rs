// ABOUTME: Shared OOXML package helpers for PPTX generation
// ABOUTME: Handles relationships, content types, and presentation part rewrites

use crate::errors::{Result, VocabError};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::{Path, PathBuf};

pub const REL_TYPE_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_TYPE_AUDIO: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/audio";
// Modern media embeds use the 2007 Microsoft extension relationship
pub const REL_TYPE_MEDIA: &str = "http://schemas.microsoft.com/office/2007/relationships/media";

pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Escape special characters for XML attribute and text content
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Whether a package part name is a slide part
pub fn is_slide_part(name: &str) -> bool {
    name.starts_with("ppt/slides/slide") && name.ends_with(".xml")
}

/// A single entry from an OPC relationships part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub target_mode: Option<String>,
}

/// Parse the Relationship elements out of a .rels part
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut target_mode = None;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"TargetMode" => target_mode = Some(value),
                        _ => {}
                    }
                }
                rels.push(Relationship {
                    id,
                    rel_type,
                    target,
                    target_mode,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

/// Serialize relationships back into a .rels part
pub fn relationships_xml(rels: &[Relationship]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for rel in rels {
        xml.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"",
            escape_xml(&rel.id),
            escape_xml(&rel.rel_type),
            escape_xml(&rel.target)
        ));
        if let Some(mode) = &rel.target_mode {
            xml.push_str(&format!(" TargetMode=\"{}\"", escape_xml(mode)));
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    xml
}

/// First unused rId number across a relationship set
pub fn next_rel_id(rels: &[Relationship]) -> u32 {
    rels.iter()
        .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .map(|n| n + 1)
        .unwrap_or(1)
}

/// Content type for a lowercased media file extension, if the package
/// writer knows how to declare it
pub fn media_content_type(extension: &str) -> Option<&'static str> {
    match extension {
        "mp3" => Some("audio/mpeg"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Rebuild [Content_Types].xml for the generated slide set.
///
/// Keeps the template's defaults and non-slide overrides, registers the
/// media extensions we ship, and declares one override per generated slide.
pub fn rewrite_content_types(
    xml: &str,
    slide_count: usize,
    media_extensions: &[String],
) -> Result<String> {
    let mut defaults: Vec<(String, String)> = Vec::new();
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"Default" => {
                    let mut extension = String::new();
                    let mut content_type = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"Extension" => extension = value,
                            b"ContentType" => content_type = value,
                            _ => {}
                        }
                    }
                    defaults.push((extension, content_type));
                }
                b"Override" => {
                    let mut part_name = String::new();
                    let mut content_type = String::new();
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"PartName" => part_name = value,
                            b"ContentType" => content_type = value,
                            _ => {}
                        }
                    }
                    if !part_name.starts_with("/ppt/slides/") {
                        overrides.push((part_name, content_type));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    for extension in media_extensions {
        let extension = extension.to_lowercase();
        if defaults
            .iter()
            .any(|(e, _)| e.eq_ignore_ascii_case(&extension))
        {
            continue;
        }
        let content_type = match media_content_type(&extension) {
            Some(content_type) => content_type,
            None => {
                return Err(VocabError::PptxError(format!(
                    "No content type known for media extension '{}'",
                    extension
                )))
            }
        };
        defaults.push((extension, content_type.to_string()));
    }

    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    );
    for (extension, content_type) in &defaults {
        out.push_str(&format!(
            "<Default Extension=\"{}\" ContentType=\"{}\"/>",
            escape_xml(extension),
            escape_xml(content_type)
        ));
    }
    for index in 1..=slide_count {
        out.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"{}\"/>",
            index, SLIDE_CONTENT_TYPE
        ));
    }
    for (part_name, content_type) in &overrides {
        out.push_str(&format!(
            "<Override PartName=\"{}\" ContentType=\"{}\"/>",
            escape_xml(part_name),
            escape_xml(content_type)
        ));
    }
    out.push_str("</Types>");
    Ok(out)
}

fn write_slide_id_entries(writer: &mut Writer<Vec<u8>>, slides: &[(u32, String)]) -> Result<()> {
    for (id, rid) in slides {
        let mut sld = BytesStart::new("p:sldId");
        sld.push_attribute(("id", id.to_string().as_str()));
        sld.push_attribute(("r:id", rid.as_str()));
        writer.write_event(Event::Empty(sld))?;
    }
    Ok(())
}

/// Replace the slide id list in presentation.xml with the given entries
pub fn rewrite_slide_id_list(xml: &str, slides: &[(u32, String)]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"p:sldIdLst" => {
                reader.read_to_end(e.name())?;
                writer.write_event(Event::Start(e))?;
                write_slide_id_entries(&mut writer, slides)?;
                writer.write_event(Event::End(BytesEnd::new("p:sldIdLst")))?;
            }
            Event::Empty(e) if e.name().as_ref() == b"p:sldIdLst" => {
                writer.write_event(Event::Start(e))?;
                write_slide_id_entries(&mut writer, slides)?;
                writer.write_event(Event::End(BytesEnd::new("p:sldIdLst")))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| VocabError::XmlError(e.to_string()))
}

/// Update the modified timestamp recorded in docProps/core.xml
pub fn rewrite_core_modified(xml: &str, timestamp: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut in_modified = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"dcterms:modified" => {
                in_modified = true;
                writer.write_event(Event::Start(e))?;
                writer.write_event(Event::Text(BytesText::new(timestamp)))?;
            }
            Event::Text(_) if in_modified => {}
            Event::End(e) if e.name().as_ref() == b"dcterms:modified" => {
                in_modified = false;
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| VocabError::XmlError(e.to_string()))
}

/// Update the slide count recorded in docProps/app.xml
pub fn rewrite_app_slide_count(xml: &str, slide_count: usize) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut in_slides = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"Slides" => {
                in_slides = true;
                writer.write_event(Event::Start(e))?;
                writer.write_event(Event::Text(BytesText::new(&slide_count.to_string())))?;
            }
            Event::Text(_) if in_slides => {}
            Event::End(e) if e.name().as_ref() == b"Slides" => {
                in_slides = false;
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| VocabError::XmlError(e.to_string()))
}

/// Resolve the placeholder index of a `p:ph` element.
///
/// An explicit idx attribute wins; otherwise title placeholders map to 0,
/// subtitles to 1, and anything else defaults to 0.
pub fn placeholder_index(ph: &BytesStart) -> Result<u32> {
    let mut idx: Option<u32> = None;
    let mut ph_type: Option<String> = None;
    for attr in ph.attributes().flatten() {
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"idx" => idx = value.parse::<u32>().ok(),
            b"type" => ph_type = Some(value),
            _ => {}
        }
    }
    if let Some(idx) = idx {
        return Ok(idx);
    }
    Ok(match ph_type.as_deref() {
        Some("subTitle") => 1,
        _ => 0,
    })
}

/// Append a .pptx extension when the output path lacks one
pub fn ensure_pptx_extension(path: &Path) -> PathBuf {
    let is_pptx = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pptx"))
        .unwrap_or(false);
    if is_pptx {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".pptx");
        PathBuf::from(name)
    }
}
