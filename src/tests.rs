use super::*;
use crate::images::derive_image_query;
use crate::ooxml::{
    ensure_pptx_extension, media_content_type, next_rel_id, parse_relationships,
    placeholder_index, relationships_xml, rewrite_app_slide_count, rewrite_content_types,
    rewrite_slide_id_list,
};
use crate::slidexml::{
    append_shapes, audio_shape_xml, hotspot_shape_xml, picture_shape_xml, set_placeholder_texts,
};
use crate::template::parse_template_slots;
use crate::translate::translation_sentinel;
use crate::vocab::parse_vocab_line;
use quick_xml::events::BytesStart;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

fn create_temp_csv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write to temp file");
    file
}

fn sample_slide_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="685800" y="1122363"/><a:ext cx="7772400" cy="2387600"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Click to add title</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Subtitle 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Click to add subtitle</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="4" name="Pinyin 3"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="14"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>pinyin</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="5" name="Media 4"/><p:cNvSpPr/><p:nvPr><p:ph idx="15"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="457200"/><a:ext cx="914400" cy="914400"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
}

struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(&self, text: &str) -> Result<String> {
        Ok(format!("{}-en", text))
    }
}

struct FailingTranslator;

impl Translator for FailingTranslator {
    fn translate(&self, text: &str) -> Result<String> {
        Err(VocabError::TranslationError(format!(
            "no service for {}",
            text
        )))
    }
}

#[test]
fn test_transliterate_basic_mandarin() {
    assert_eq!(transliterate("你好"), "nǐ hǎo");
    assert_eq!(transliterate("谢谢"), "xiè xiè");
}

#[test]
fn test_transliterate_mixed_text() {
    assert_eq!(transliterate("你好ABC"), "nǐ hǎo ABC");
    assert_eq!(transliterate("ABC 你好"), "ABC nǐ hǎo");
    assert_eq!(transliterate(""), "");
}

#[test]
fn test_transliterate_is_deterministic() {
    let first = transliterate("我喜欢学习中文");
    let second = transliterate("我喜欢学习中文");
    assert_eq!(first, second);
}

#[test]
fn test_parse_vocab_line_splits_on_first_comma() {
    let entry = parse_vocab_line("你好, hello, there").expect("Expected an entry");
    assert_eq!(entry.source_text, "你好");
    assert_eq!(entry.target_text.as_deref(), Some("hello, there"));

    let entry = parse_vocab_line("谢谢").expect("Expected an entry");
    assert_eq!(entry.source_text, "谢谢");
    assert_eq!(entry.target_text, None);

    assert!(parse_vocab_line("   ").is_none());
}

#[test]
fn test_parse_vocab_lines_stops_at_sentinel() {
    let entries = parse_vocab_lines(["你好,hello", "", "谢谢", "DONE", "再见,goodbye"]);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].target_text.as_deref(), Some("hello"));
    assert_eq!(entries[1].source_text, "谢谢");
    assert_eq!(entries[1].target_text, None);
}

#[test]
fn test_end_sentinel_is_case_insensitive() {
    assert!(is_end_sentinel("done"));
    assert!(is_end_sentinel(" DONE "));
    assert!(!is_end_sentinel("done?"));
    assert!(!is_end_sentinel("你好"));
}

#[test]
fn test_read_vocab_csv_basic() {
    let csv_file = create_temp_csv_file("你好,hello\n谢谢,thank you\n\n再见\n");
    let entries = read_vocab_csv(csv_file.path()).expect("Failed to read vocab");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].source_text, "你好");
    assert_eq!(entries[0].target_text.as_deref(), Some("hello"));
    assert_eq!(entries[1].target_text.as_deref(), Some("thank you"));
    assert_eq!(entries[2].source_text, "再见");
    assert_eq!(entries[2].target_text, None);
}

#[test]
fn test_read_vocab_csv_missing_file() {
    let result = read_vocab_csv(Path::new("/nonexistent/vocab.csv"));
    assert!(matches!(result, Err(VocabError::PathNotFoundError(_))));
}

#[test]
fn test_asset_stem_is_stable_and_short() {
    let first = AssetArena::stem_for("你好");
    let second = AssetArena::stem_for("你好");
    let other = AssetArena::stem_for("谢谢");
    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(first.len(), 10);
    assert!(first.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn test_asset_arena_cleanup_removes_transient_files() {
    let media_dir = TempDir::new().expect("Failed to create temp dir");
    let mut arena = AssetArena::create(media_dir.path()).expect("Failed to create arena");

    let transient = arena.transient_path("你好", "mp3");
    std::fs::write(&transient, b"audio").expect("Failed to write transient asset");
    arena.register(transient.clone(), AssetKind::Audio, true);

    let keeper = media_dir.path().join("fallback.png");
    std::fs::write(&keeper, b"image").expect("Failed to write fallback");
    arena.register(keeper.clone(), AssetKind::Image, false);

    arena.cleanup();
    assert!(!transient.exists(), "Transient asset should be removed");
    assert!(keeper.exists(), "Non-transient asset should survive cleanup");

    // A second cleanup is a no-op
    arena.cleanup();
    assert!(keeper.exists());
}

#[test]
fn test_fill_missing_translations_only_fills_gaps() {
    let mut entries = vec![
        VocabularyEntry::new("你好", Some("hello".to_string())),
        VocabularyEntry::new("谢谢", None),
    ];
    let filled = fill_missing_translations(&mut entries, &EchoTranslator);
    assert_eq!(filled, 1);
    assert_eq!(entries[0].target_text.as_deref(), Some("hello"));
    assert_eq!(entries[1].target_text.as_deref(), Some("谢谢-en"));
}

#[test]
fn test_fill_missing_translations_uses_sentinel_on_failure() {
    let mut entries = vec![VocabularyEntry::new("你好", None)];
    let filled = fill_missing_translations(&mut entries, &FailingTranslator);
    assert_eq!(filled, 1);
    assert_eq!(
        entries[0].target_text.as_deref(),
        Some("[translation failed: 你好]")
    );
    assert_eq!(translation_sentinel("谢谢"), "[translation failed: 谢谢]");
}

#[test]
fn test_derive_image_query_joins_and_encodes() {
    assert_eq!(derive_image_query("hello"), "hello");
    assert_eq!(derive_image_query("thank you"), "thank+you");
    assert_eq!(derive_image_query("  spaced   words  "), "spaced+words");
    assert_eq!(derive_image_query("r&b music"), "r%26b+music");
}

#[test]
fn test_disabled_image_search_never_finds_images() {
    let media_dir = TempDir::new().expect("Failed to create temp dir");
    let mut arena = AssetArena::create(media_dir.path()).expect("Failed to create arena");
    let result = DisabledImageSearch
        .retrieve("cat", &mut arena)
        .expect("Lookup should not error");
    assert!(result.is_none());
    arena.cleanup();
}

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.tts_lang, "zh");
    assert_eq!(config.source_locale, "zh-CN");
    assert_eq!(config.target_locale, "en");
    assert!(config.auto_translate);
    assert_eq!(config.media_dir, PathBuf::from("media"));
    assert_eq!(
        config.fallback_image,
        Some(PathBuf::from("media").join("fallback.png"))
    );
    assert_eq!(
        config.request_timeout(),
        std::time::Duration::from_millis(10000)
    );
}

#[test]
fn test_ensure_pptx_extension() {
    assert_eq!(
        ensure_pptx_extension(Path::new("deck.pptx")),
        PathBuf::from("deck.pptx")
    );
    assert_eq!(
        ensure_pptx_extension(Path::new("deck.PPTX")),
        PathBuf::from("deck.PPTX")
    );
    assert_eq!(
        ensure_pptx_extension(Path::new("deck")),
        PathBuf::from("deck.pptx")
    );
    assert_eq!(
        ensure_pptx_extension(Path::new("deck.ppt")),
        PathBuf::from("deck.ppt.pptx")
    );
}

#[test]
fn test_relationships_round_trip() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="https://example.com/pic.png" TargetMode="External"/></Relationships>"#;
    let rels = parse_relationships(xml).expect("Failed to parse relationships");
    assert_eq!(rels.len(), 2);
    assert_eq!(rels[0].id, "rId1");
    assert!(rels[0].target.contains("slideLayout1.xml"));
    assert_eq!(rels[1].target_mode.as_deref(), Some("External"));

    let serialized = relationships_xml(&rels);
    let reparsed = parse_relationships(&serialized).expect("Failed to reparse relationships");
    assert_eq!(rels, reparsed);

    assert_eq!(next_rel_id(&rels), 3);
    assert_eq!(next_rel_id(&[]), 1);
}

#[test]
fn test_rewrite_content_types_registers_slides_and_media() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#;
    let rewritten =
        rewrite_content_types(xml, 2, &["mp3".to_string(), "png".to_string()])
            .expect("Failed to rewrite content types");

    assert!(rewritten.contains(r#"<Default Extension="mp3" ContentType="audio/mpeg"/>"#));
    assert!(rewritten.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
    assert!(rewritten.contains(r#"<Default Extension="rels""#));
    assert!(rewritten.contains(r#"PartName="/ppt/slides/slide1.xml""#));
    assert!(rewritten.contains(r#"PartName="/ppt/slides/slide2.xml""#));
    assert!(rewritten.contains(r#"PartName="/ppt/presentation.xml""#));
    // The template's own slide override must not be duplicated
    assert_eq!(rewritten.matches("/ppt/slides/slide1.xml").count(), 1);
}

#[test]
fn test_media_content_type_covers_shipped_formats_only() {
    assert_eq!(media_content_type("mp3"), Some("audio/mpeg"));
    assert_eq!(media_content_type("png"), Some("image/png"));
    assert_eq!(media_content_type("jpg"), Some("image/jpeg"));
    assert_eq!(media_content_type("jpeg"), Some("image/jpeg"));
    assert_eq!(media_content_type("gif"), Some("image/gif"));
    assert_eq!(media_content_type("bmp"), None);
    assert_eq!(media_content_type("webp"), None);
    assert_eq!(media_content_type(""), None);
}

#[test]
fn test_rewrite_slide_id_list_replaces_entries() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#;
    let rewritten = rewrite_slide_id_list(
        xml,
        &[(256, "rId7".to_string()), (257, "rId8".to_string())],
    )
    .expect("Failed to rewrite slide id list");

    assert!(rewritten.contains(r#"<p:sldId id="256" r:id="rId7"/>"#));
    assert!(rewritten.contains(r#"<p:sldId id="257" r:id="rId8"/>"#));
    assert!(!rewritten.contains("rId2"));
    assert!(rewritten.contains("sldMasterIdLst"));
    assert!(rewritten.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
}

#[test]
fn test_rewrite_app_slide_count() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Slides>1</Slides><Notes>0</Notes></Properties>"#;
    let rewritten = rewrite_app_slide_count(xml, 5).expect("Failed to rewrite app properties");
    assert!(rewritten.contains("<Slides>5</Slides>"));
    assert!(rewritten.contains("<Notes>0</Notes>"));
}

#[test]
fn test_placeholder_index_resolution() {
    let mut ph = BytesStart::new("p:ph");
    ph.push_attribute(("type", "ctrTitle"));
    assert_eq!(placeholder_index(&ph).unwrap(), 0);

    let mut ph = BytesStart::new("p:ph");
    ph.push_attribute(("type", "subTitle"));
    assert_eq!(placeholder_index(&ph).unwrap(), 1);

    let mut ph = BytesStart::new("p:ph");
    ph.push_attribute(("type", "body"));
    ph.push_attribute(("idx", "14"));
    assert_eq!(placeholder_index(&ph).unwrap(), 14);

    let ph = BytesStart::new("p:ph");
    assert_eq!(placeholder_index(&ph).unwrap(), 0);
}

#[test]
fn test_set_placeholder_texts_replaces_listed_placeholders() {
    let texts = vec![(0u32, "你好"), (1u32, "hello")];
    let rewritten =
        set_placeholder_texts(sample_slide_xml(), &texts).expect("Failed to rewrite slide");

    assert!(rewritten.contains("<a:t>你好</a:t>"));
    assert!(rewritten.contains("<a:t>hello</a:t>"));
    assert!(!rewritten.contains("Click to add title"));
    assert!(!rewritten.contains("Click to add subtitle"));
    // The placeholder we did not touch keeps its text
    assert!(rewritten.contains("<a:t>pinyin</a:t>"));
    // Body properties survive the paragraph replacement
    assert!(rewritten.contains("<a:bodyPr/>"));
}

#[test]
fn test_set_placeholder_texts_escapes_markup() {
    let texts = vec![(0u32, "a<b & c")];
    let rewritten =
        set_placeholder_texts(sample_slide_xml(), &texts).expect("Failed to rewrite slide");
    assert!(rewritten.contains("a&lt;b &amp; c"));
}

#[test]
fn test_audio_shape_links_media_relationships() {
    let shape = audio_shape_xml(
        900, "Audio 你好", "rId7", "rId8", "rId9", 0, 0, 914400, 914400,
    );
    assert!(shape.contains(r#"<a:audioFile r:link="rId7"/>"#));
    assert!(shape.contains(r#"r:embed="rId8""#));
    assert!(shape.contains(r#"<a:blip r:embed="rId9"/>"#));
    assert!(shape.contains("ppaction://media"));
}

#[test]
fn test_hotspot_shape_is_invisible() {
    let shape = hotspot_shape_xml(901, "Play 你好", 0, 0, 914400, 914400);
    assert!(shape.contains("<a:noFill/>"));
    assert!(shape.contains("ppaction://media"));
    assert!(shape.contains(r#"<a:ext cx="914400" cy="914400"/>"#));
}

#[test]
fn test_append_shapes_inserts_before_tree_end() {
    let fragment = picture_shape_xml(902, "Illustration", "rId5", 0, 0, 100, 100);
    let rewritten =
        append_shapes(sample_slide_xml(), &[fragment.clone()]).expect("Failed to append shapes");
    let tree_end = rewritten.find("</p:spTree>").expect("Shape tree should close");
    let fragment_at = rewritten.find(&fragment).expect("Fragment should be present");
    assert!(fragment_at < tree_end);
}

#[test]
fn test_parse_template_slots_finds_all_roles() {
    let slots = parse_template_slots(sample_slide_xml()).expect("Failed to parse slots");
    assert!(!slots.is_empty());

    let title = slots.get(ContentRole::Title).expect("Title slot expected");
    assert_eq!(title.index, 0);
    assert_eq!(title.offset, Some((685800, 1122363)));

    assert!(slots.get(ContentRole::Subtitle).is_some());
    assert!(slots.get(ContentRole::Phonetic).is_some());

    let media = slots.get(ContentRole::Media).expect("Media slot expected");
    assert_eq!(media.index, 15);
    assert_eq!(media.offset, Some((457200, 457200)));
    assert_eq!(media.extent, Some((914400, 914400)));
}

#[test]
fn test_parse_template_slots_handles_plain_shapes() {
    let xml = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Box"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sld>"#;
    let slots = parse_template_slots(xml).expect("Failed to parse slots");
    assert!(slots.is_empty());
}

#[test]
fn test_content_role_placeholder_mapping() {
    for role in ContentRole::ALL {
        assert_eq!(
            ContentRole::from_placeholder_index(role.placeholder_index()),
            Some(role)
        );
    }
    assert_eq!(ContentRole::from_placeholder_index(7), None);
}
