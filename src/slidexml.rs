// ABOUTME: Slide XML mutation helpers for cloned template slides
// ABOUTME: Replaces placeholder text and appends picture, audio, and hotspot shapes

use crate::errors::{Result, VocabError};
use crate::ooxml::{escape_xml, placeholder_index};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

// Slide geometry in English Metric Units (914400 per inch)
pub const EMU_PER_INCH: i64 = 914_400;

// Illustration image placement: right half of the slide body
pub const IMAGE_LEFT_EMU: i64 = 4_754_880;
pub const IMAGE_TOP_EMU: i64 = 1_097_280;
pub const IMAGE_WIDTH_EMU: i64 = 3_840_480;

// Default audio icon placement when the template gives no position:
// a one-inch icon inset half an inch from the top-left corner
pub const AUDIO_LEFT_EMU: i64 = EMU_PER_INCH / 2;
pub const AUDIO_TOP_EMU: i64 = EMU_PER_INCH / 2;
pub const AUDIO_SIZE_EMU: i64 = EMU_PER_INCH;

const MEDIA_EXT_URI: &str = "{DAA4B4D4-6D71-4841-9C94-3DE7FCFB9230}";

/// Replace the text of the given placeholders in a slide.
///
/// Each entry pairs a placeholder index with its new text. The text body's
/// properties are kept; every existing paragraph is dropped and replaced
/// with a single plain run. Placeholders not listed are left untouched.
pub fn set_placeholder_texts(slide_xml: &str, texts: &[(u32, &str)]) -> Result<String> {
    let mut reader = Reader::from_str(slide_xml);
    let mut writer = Writer::new(Vec::new());
    let mut sp_stack: Vec<Option<u32>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"p:sp" => {
                sp_stack.push(None);
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) if e.name().as_ref() == b"p:sp" => {
                sp_stack.pop();
                writer.write_event(Event::End(e))?;
            }
            Event::Start(e) if e.name().as_ref() == b"p:ph" => {
                record_placeholder(&mut sp_stack, &e)?;
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) if e.name().as_ref() == b"p:ph" => {
                record_placeholder(&mut sp_stack, &e)?;
                writer.write_event(Event::Empty(e))?;
            }
            Event::Start(e) if e.name().as_ref() == b"p:txBody" => {
                let replacement = sp_stack.last().copied().flatten().and_then(|idx| {
                    texts
                        .iter()
                        .find(|(index, _)| *index == idx)
                        .map(|(_, text)| *text)
                });
                writer.write_event(Event::Start(e))?;
                if let Some(text) = replacement {
                    rewrite_text_body(&mut reader, &mut writer, text)?;
                }
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| VocabError::XmlError(e.to_string()))
}

fn record_placeholder(sp_stack: &mut [Option<u32>], ph: &BytesStart) -> Result<()> {
    if let Some(slot) = sp_stack.last_mut() {
        if slot.is_none() {
            *slot = Some(placeholder_index(ph)?);
        }
    }
    Ok(())
}

/// Copy a text body through, dropping its paragraphs and appending one run
fn rewrite_text_body(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<Vec<u8>>,
    text: &str,
) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"a:p" => {
                reader.read_to_end(e.name())?;
            }
            Event::Empty(e) if e.name().as_ref() == b"a:p" => {}
            Event::End(e) if e.name().as_ref() == b"p:txBody" => {
                write_plain_paragraph(writer, text)?;
                writer.write_event(Event::End(e))?;
                return Ok(());
            }
            Event::Eof => {
                return Err(VocabError::XmlError(
                    "Unexpected end of slide XML inside a text body".to_string(),
                ))
            }
            event => writer.write_event(event)?,
        }
    }
}

fn write_plain_paragraph(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("a:p")))?;
    writer.write_event(Event::Start(BytesStart::new("a:r")))?;
    writer.write_event(Event::Start(BytesStart::new("a:t")))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("a:t")))?;
    writer.write_event(Event::End(BytesEnd::new("a:r")))?;
    writer.write_event(Event::End(BytesEnd::new("a:p")))?;
    Ok(())
}

/// Picture shape showing a downloaded illustration image
pub fn picture_shape_xml(
    shape_id: u32,
    name: &str,
    image_rid: &str,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        id = shape_id,
        name = escape_xml(name),
        rid = image_rid,
        x = x,
        y = y,
        cx = cx,
        cy = cy
    )
}

/// Audio clip shape with its poster frame and modern media embed
pub fn audio_shape_xml(
    shape_id: u32,
    name: &str,
    audio_rid: &str,
    media_rid: &str,
    poster_rid: &str,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"><a:hlinkClick r:id="" action="ppaction://media"/></p:cNvPr><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr><a:audioFile r:link="{audio}"/><p:extLst><p:ext uri="{ext_uri}"><p14:media xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main" r:embed="{media}"/></p:ext></p:extLst></p:nvPr></p:nvPicPr><p:blipFill><a:blip r:embed="{poster}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        id = shape_id,
        name = escape_xml(name),
        audio = audio_rid,
        ext_uri = MEDIA_EXT_URI,
        media = media_rid,
        poster = poster_rid,
        x = x,
        y = y,
        cx = cx,
        cy = cy
    )
}

/// Invisible click target covering the audio icon; clicking plays the clip
pub fn hotspot_shape_xml(shape_id: u32, name: &str, x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"><a:hlinkClick r:id="" action="ppaction://media"/></p:cNvPr><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/><a:ln><a:noFill/></a:ln></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody></p:sp>"#,
        id = shape_id,
        name = escape_xml(name),
        x = x,
        y = y,
        cx = cx,
        cy = cy
    )
}

/// Insert shape fragments just before the end of the slide's shape tree
pub fn append_shapes(slide_xml: &str, fragments: &[String]) -> Result<String> {
    if fragments.is_empty() {
        return Ok(slide_xml.to_string());
    }
    let insert_at = slide_xml
        .rfind("</p:spTree>")
        .ok_or_else(|| VocabError::XmlError("Slide XML has no shape tree".to_string()))?;
    let mut out = String::with_capacity(
        slide_xml.len() + fragments.iter().map(|f| f.len()).sum::<usize>(),
    );
    out.push_str(&slide_xml[..insert_at]);
    for fragment in fragments {
        out.push_str(fragment);
    }
    out.push_str(&slide_xml[insert_at..]);
    Ok(out)
}
