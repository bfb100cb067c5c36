use super::{authored_source, authored_template, init_logging, layout_of};
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::pptx::presentation::read_slide_ids;
use crate::ooxml::pptx::reindex::verify_consistency;
use crate::ooxml::pptx::shapes::scan_shapes;
use crate::ooxml::pptx::{
    ContentSlideRecord, DeckGenerator, GeneratorOptions, SkipReason, TemplateSource, inspect,
};
use proptest::prelude::*;

fn records() -> Vec<ContentSlideRecord> {
    vec![
        ContentSlideRecord::new("title", "Quarterly Review"),
        ContentSlideRecord::new("content", "Agenda").with_lines(["Results", "Outlook", "Questions"]),
        ContentSlideRecord::new("unknown-type", "Appendix").with_lines(["Backup data"]),
    ]
}

#[test]
fn test_scenario_a_unknown_type_uses_general_layout() {
    init_logging();
    let deck = DeckGenerator::default().generate(&authored_source(), &records()).unwrap();
    assert_eq!(deck.slide_count, 3);
    assert!(deck.is_complete());

    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    assert_eq!(layout_of(&package, "/ppt/slides/slide1.xml"), "/ppt/slideLayouts/slideLayout1.xml");
    assert_eq!(layout_of(&package, "/ppt/slides/slide2.xml"), "/ppt/slideLayouts/slideLayout2.xml");
    // "content" is the first general-layout alias present in the template.
    assert_eq!(layout_of(&package, "/ppt/slides/slide3.xml"), "/ppt/slideLayouts/slideLayout2.xml");

    let summary = inspect(&package, 200).unwrap();
    assert_eq!(
        summary.titles().collect::<Vec<_>>(),
        vec!["Quarterly Review", "Agenda", "Appendix"]
    );

    let body = scan_shapes(package.xml_text("/ppt/slides/slide2.xml").unwrap()).unwrap();
    let body = body.first_placeholder(&["body"]).unwrap();
    assert_eq!(body.paragraphs, vec!["Results", "Outlook", "Questions"]);
}

#[test]
fn test_scenario_b_single_notes_master() {
    init_logging();
    let mut records = records();
    records[1] = records[1].clone().with_notes("Spend two minutes here");

    let deck = DeckGenerator::default().generate(&authored_source(), &records).unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();

    assert_eq!(package.numbered_parts("/ppt/notesMasters", "notesMaster").len(), 1);
    let notes = package.numbered_parts("/ppt/notesSlides", "notesSlide");
    assert_eq!(notes.len(), 1);

    let noted = package.part("/ppt/slides/slide2.xml").unwrap();
    let edge = noted.rels().part_with_reltype(rt::NOTES_SLIDE).unwrap();
    assert_eq!(edge.target_partname().unwrap(), notes[0].1);
    for plain in ["/ppt/slides/slide1.xml", "/ppt/slides/slide3.xml"] {
        assert_eq!(package.part(plain).unwrap().rels().by_type(rt::NOTES_SLIDE).count(), 0);
    }

    let pres = package.part("/ppt/presentation.xml").unwrap();
    assert_eq!(pres.rels().by_type(rt::NOTES_MASTER).count(), 1);
    assert!(pres.xml_text().unwrap().contains("notesMasterIdLst"));

    let notes_part = package.part(notes[0].1.as_str()).unwrap();
    assert_eq!(notes_part.rels().by_type(rt::NOTES_MASTER).count(), 1);
    assert_eq!(notes_part.rels().by_type(rt::SLIDE).count(), 1);

    let summary = inspect(&package, 80).unwrap();
    assert!(!summary.slides[0].has_notes);
    assert!(summary.slides[1].has_notes);
    assert_eq!(summary.slides[1].notes.as_deref(), Some("Spend two minutes here"));
}

#[test]
fn test_scenario_c_title_is_escaped() {
    init_logging();
    let records = vec![ContentSlideRecord::new("title", "Q&A <Session>")];
    let deck = DeckGenerator::default().generate(&authored_source(), &records).unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();

    let xml = package.xml_text("/ppt/slides/slide1.xml").unwrap();
    assert!(xml.contains("Q&amp;A &lt;Session&gt;"));
    assert!(!xml.contains("{{TITLE}}"));

    let summary = inspect(&package, 80).unwrap();
    assert_eq!(summary.slides[0].title.as_deref(), Some("Q&A <Session>"));
}

#[test]
fn test_scenario_d_missing_backing_slide_is_skipped() {
    init_logging();
    let mut authored = authored_template();
    authored.package.remove_part("/ppt/slides/slide3.xml");
    let source = TemplateSource::try_from(&authored).unwrap();

    let records = vec![
        ContentSlideRecord::new("title", "Hello"),
        ContentSlideRecord::new("quote", "Stay hungry"),
        ContentSlideRecord::new("content", "Plan").with_lines(["One"]),
    ];
    let deck = DeckGenerator::default().generate(&source, &records).unwrap();

    assert_eq!(deck.slide_count, records.len() - 1);
    assert_eq!(deck.skipped.len(), 1);
    assert_eq!(deck.skipped[0].index, 1);
    assert_eq!(deck.skipped[0].semantic_type, "quote");
    assert_eq!(
        deck.skipped[0].reason,
        SkipReason::MissingSourceSlide {
            layout: "quote".to_string(),
            slide: 3
        }
    );

    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    verify_consistency(&package).unwrap();
    let summary = inspect(&package, 80).unwrap();
    assert_eq!(summary.titles().collect::<Vec<_>>(), vec!["Hello", "Plan"]);
    assert_eq!(layout_of(&package, "/ppt/slides/slide2.xml"), "/ppt/slideLayouts/slideLayout2.xml");
}

#[test]
fn test_pattern_layout_tags_replaced() {
    init_logging();
    let records = vec![ContentSlideRecord::new("quote", "Less is more").with_lines(["Mies", "1947"])];
    let options = GeneratorOptions::new().with_body_separator(", ");
    let deck = DeckGenerator::new(options).generate(&authored_source(), &records).unwrap();

    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    let tree = scan_shapes(package.xml_text("/ppt/slides/slide1.xml").unwrap()).unwrap();
    let texts: Vec<String> = tree.shapes.iter().map(|s| s.text()).collect();
    assert_eq!(texts, vec!["Less is more", "Mies, 1947"]);
}

#[test]
fn test_template_slides_do_not_leak() {
    init_logging();
    let records = vec![ContentSlideRecord::new("content", "Only slide")];
    let deck = DeckGenerator::default().generate(&authored_source(), &records).unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();

    assert_eq!(package.numbered_parts("/ppt/slides", "slide").len(), 1);
    assert_eq!(package.content_types().overrides_with(ct::PML_SLIDE).count(), 1);
    let ids = read_slide_ids(package.xml_text("/ppt/presentation.xml").unwrap()).unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].id, 256);
    assert!(package.xml_text("/docProps/app.xml").unwrap().contains("<Slides>1</Slides>"));
}

#[test]
fn test_every_output_slide_has_rels() {
    let deck = DeckGenerator::default().generate(&authored_source(), &records()).unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(deck.bytes)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    for n in 1..=3 {
        assert!(names.contains(&format!("ppt/slides/_rels/slide{}.xml.rels", n).as_str()));
    }
    assert!(names.contains(&"[Content_Types].xml"));
    assert!(names.contains(&"_rels/.rels"));
}

#[test]
fn test_output_is_deterministic() {
    let source = authored_source();
    let mut records = records();
    records[0] = records[0].clone().with_notes("Welcome everyone");

    let generator = DeckGenerator::default();
    let first = generator.generate(&source, &records).unwrap();
    let second = generator.generate(&source, &records).unwrap();
    assert_eq!(first.bytes, second.bytes);

    let fresh = DeckGenerator::default().generate(&authored_source(), &records).unwrap();
    assert_eq!(first.bytes, fresh.bytes);
}

#[test]
fn test_empty_record_list() {
    let deck = DeckGenerator::default().generate(&authored_source(), &[]).unwrap();
    assert_eq!(deck.slide_count, 0);
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    verify_consistency(&package).unwrap();
    assert!(!package.xml_text("/ppt/presentation.xml").unwrap().contains("sldIdLst"));
}

fn semantic_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("title".to_string()),
        Just("content".to_string()),
        Just("quote".to_string()),
        Just("Bullets".to_string()),
        "[a-z_-]{0,12}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_one_slide_per_record(types in prop::collection::vec(semantic_type(), 1..8)) {
        let records: Vec<ContentSlideRecord> = types
            .iter()
            .enumerate()
            .map(|(i, t)| ContentSlideRecord::new(t.clone(), format!("Slide {}", i)).with_lines(["a", "b"]))
            .collect();
        let deck = DeckGenerator::default().generate(&authored_source(), &records).unwrap();
        prop_assert_eq!(deck.slide_count, records.len());
        prop_assert!(deck.skipped.is_empty());

        let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
        verify_consistency(&package).unwrap();
        // Quote slides carry their title in a text box, so look at the previews.
        let summary = inspect(&package, 40).unwrap();
        prop_assert_eq!(summary.slide_count(), records.len());
        for (i, slide) in summary.slides.iter().enumerate() {
            let expected = format!("Slide {}", i);
            prop_assert!(slide.text_preview.starts_with(&expected), "{:?}", slide.text_preview);
        }
    }
}

#[test]
fn test_manifest_pattern_placeholder_uses_declared_type() {
    use crate::ooxml::pptx::{
        LayoutDefinition, LayoutManifest, LayoutManifestEntry, Placeholder, PlaceholderSpec, TemplateAuthor,
    };

    init_logging();
    let authored = TemplateAuthor::new()
        .build(&[LayoutDefinition::new("quote").with_placeholder(PlaceholderSpec::textbox("{{COURSE_NAME}}"))])
        .unwrap();
    let course = Placeholder {
        ph_type: "title".to_string(),
        ..Placeholder::pattern("{{COURSE_NAME}}")
    };
    let manifest = LayoutManifest::new(vec![LayoutManifestEntry::new("quote", 1).with_placeholder(course)]);
    let source = TemplateSource::from_bytes(authored.to_bytes().unwrap()).with_manifest(manifest);

    let deck = DeckGenerator::default()
        .generate(&source, &[ContentSlideRecord::new("quote", "Rust 101")])
        .unwrap();
    assert!(deck.is_complete());

    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    let xml = package.xml_text("/ppt/slides/slide1.xml").unwrap();
    assert!(xml.contains("Rust 101"));
    assert!(!xml.contains("{{COURSE_NAME}}"));
}
