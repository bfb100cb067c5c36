use super::{authored_source, authored_template, foreign_potx, foreign_presentation, init_logging, layout_of};
use crate::ooxml::error::OoxmlError;
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::pptx::presentation::{read_section_slide_ids, read_slide_ids};
use crate::ooxml::pptx::reindex::verify_consistency;
use crate::ooxml::pptx::shapes::scan_shapes;
use crate::ooxml::pptx::{
    ContentSlideRecord, DeckGenerator, DirTemplateStore, GenerationJob, GeneratorOptions, LayoutStrategy,
    MatchRule, TemplateSource, TemplateStore, inspect, match_layout,
};

fn foreign_package() -> OpcPackage {
    OpcPackage::from_bytes(&foreign_presentation()).unwrap()
}

#[test]
fn test_discovers_layouts_from_slides() {
    init_logging();
    let layouts = LayoutStrategy::Heuristic.resolve(&foreign_package()).unwrap();

    let names: Vec<&str> = layouts.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Title Slide", "Closing"]);
    let sources: Vec<u32> = layouts.iter().map(|e| e.source_slide).collect();
    assert_eq!(sources, vec![1, 3]);
    assert_eq!(layouts.first().layout_type.as_deref(), Some("title"));
    assert_eq!(layouts.entries()[1].layout_type, None);

    // Title placeholder plus the tagged text box.
    assert_eq!(layouts.first().placeholders.len(), 2);
    assert!(layouts.first().placeholders[1].is_pattern());
}

#[test]
fn test_matching_rules_on_discovered_layouts() {
    let layouts = LayoutStrategy::Heuristic.resolve(&foreign_package()).unwrap();
    let aliases = GeneratorOptions::default().default_aliases;

    let title = match_layout(&layouts, "title", &aliases);
    assert_eq!((title.entry.name.as_str(), title.rule), ("Title Slide", MatchRule::LayoutType));

    let closing = match_layout(&layouts, "CLOSING", &aliases);
    assert_eq!((closing.entry.name.as_str(), closing.rule), ("Closing", MatchRule::Name));

    let unknown = match_layout(&layouts, "timeline", &aliases);
    assert_eq!((unknown.entry.name.as_str(), unknown.rule), ("Title Slide", MatchRule::First));
}

#[test]
fn test_fills_foreign_deck() {
    init_logging();
    let records = vec![
        ContentSlideRecord::new("title", "Welcome").with_lines(["Line one", "Line two"]),
        ContentSlideRecord::new("closing", "Goodbye").with_lines(["Questions?", "Contact us"]),
    ];
    let deck = DeckGenerator::default()
        .generate_from_bytes(&foreign_presentation(), &records)
        .unwrap();
    assert_eq!(deck.slide_count, 2);

    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    verify_consistency(&package).unwrap();
    assert_eq!(layout_of(&package, "/ppt/slides/slide1.xml"), "/ppt/slideLayouts/slideLayout1.xml");

    let first = scan_shapes(package.xml_text("/ppt/slides/slide1.xml").unwrap()).unwrap();
    assert_eq!(first.first_placeholder(&["title"]).unwrap().text(), "Welcome");
    assert!(first.shapes[1].text().contains("Line one"));
    assert!(first.shapes[1].text().contains("Line two"));

    let second = scan_shapes(package.xml_text("/ppt/slides/slide2.xml").unwrap()).unwrap();
    assert_eq!(second.first_placeholder(&["title"]).unwrap().text(), "Goodbye");
    assert_eq!(
        second.first_placeholder(&["body"]).unwrap().paragraphs,
        vec!["Questions?", "Contact us"]
    );

    let app = package.xml_text("/docProps/app.xml").unwrap();
    assert!(app.contains("<Slides>2</Slides>"));
    assert!(app.contains("<Notes>0</Notes>"));
}

#[test]
fn test_template_notes_dropped_by_default() {
    let records = vec![ContentSlideRecord::new("closing", "Bye")];
    let deck = DeckGenerator::default()
        .generate_from_bytes(&foreign_presentation(), &records)
        .unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();

    assert!(package.numbered_parts("/ppt/notesSlides", "notesSlide").is_empty());
    assert!(package.numbered_parts("/ppt/notesMasters", "notesMaster").is_empty());
    let slide = package.part("/ppt/slides/slide1.xml").unwrap();
    assert_eq!(slide.rels().by_type(rt::NOTES_SLIDE).count(), 0);
    assert_eq!(package.content_types().overrides_with(ct::PML_NOTES_SLIDE).count(), 0);
}

#[test]
fn test_template_notes_carried_over() {
    init_logging();
    let records = vec![
        ContentSlideRecord::new("closing", "Bye"),
        ContentSlideRecord::new("closing", "Bye again").with_notes("Own notes"),
        ContentSlideRecord::new("title", "No notes here"),
    ];
    let options = GeneratorOptions::new().with_drop_template_notes(false);
    let deck = DeckGenerator::new(options)
        .generate_from_bytes(&foreign_presentation(), &records)
        .unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();

    let summary = inspect(&package, 80).unwrap();
    let notes: Vec<Option<&str>> = summary.slides.iter().map(|s| s.notes.as_deref()).collect();
    assert_eq!(notes, vec![Some("Closing remarks"), Some("Own notes"), None]);
    assert_eq!(package.numbered_parts("/ppt/notesMasters", "notesMaster").len(), 1);
    assert!(package.xml_text("/docProps/app.xml").unwrap().contains("<Notes>2</Notes>"));
}

#[test]
fn test_notes_disabled() {
    let records = vec![ContentSlideRecord::new("title", "Hi").with_notes("ignored")];
    let options = GeneratorOptions::new().with_emit_notes(false);
    let deck = DeckGenerator::new(options)
        .generate(&authored_source(), &records)
        .unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    assert!(package.numbered_parts("/ppt/notesSlides", "notesSlide").is_empty());
}

#[test]
fn test_potx_becomes_presentation() {
    let records = vec![ContentSlideRecord::new("title", "From a template file")];
    let deck = DeckGenerator::default()
        .generate_from_bytes(&foreign_potx(), &records)
        .unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();

    assert_eq!(
        package.content_types().override_for("/ppt/presentation.xml"),
        Some(ct::PML_PRESENTATION_MAIN)
    );
    assert_eq!(
        package.part("/ppt/presentation.xml").unwrap().content_type(),
        ct::PML_PRESENTATION_MAIN
    );
    assert_eq!(deck.slide_count, 1);
}

#[test]
fn test_sections_and_custom_shows_follow_output() {
    init_logging();
    let mut package = foreign_package();
    let pres = package.part_mut("/ppt/presentation.xml").unwrap();
    let xml = pres.xml_text().unwrap().replace(
        "</p:presentation>",
        concat!(
            r#"<p:custShowLst><p:custShow name="Short" id="0"><p:sldLst><p:sld r:id="rId4"/></p:sldLst></p:custShow></p:custShowLst>"#,
            r#"<p:extLst><p:ext uri="{521415D9-36F7-43E2-AB2F-B90AF26B5E84}">"#,
            r#"<p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main">"#,
            r#"<p14:section name="Opening" id="{6A1D0B4E-0001-4C2A-9A55-000000000001}"><p14:sldIdLst>"#,
            r#"<p14:sldId id="256"/><p14:sldId id="257"/><p14:sldId id="258"/></p14:sldIdLst></p14:section>"#,
            r#"<p14:section name="Backup" id="{6A1D0B4E-0002-4C2A-9A55-000000000002}"><p14:sldIdLst/></p14:section>"#,
            r#"</p14:sectionLst></p:ext></p:extLst></p:presentation>"#
        ),
    );
    pres.set_xml(xml);
    let bytes = package.to_bytes().unwrap();

    let records = vec![ContentSlideRecord::new("title", "Only slide")];
    let deck = DeckGenerator::default().generate_from_bytes(&bytes, &records).unwrap();
    let package = OpcPackage::from_bytes(&deck.bytes).unwrap();
    verify_consistency(&package).unwrap();

    let xml = package.xml_text("/ppt/presentation.xml").unwrap();
    let ids: Vec<u32> = read_slide_ids(xml).unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![256]);
    assert_eq!(read_section_slide_ids(xml).unwrap(), vec![vec![256], vec![]]);
    assert!(!xml.contains("custShowLst"));
    assert!(xml.contains(r#"<p14:section name="Backup""#));
}

#[test]
fn test_template_without_layouts() {
    let mut package = foreign_package();
    package.remove_part("/ppt/slides/slide1.xml");
    package.remove_part("/ppt/slides/slide3.xml");
    let bytes = package.to_bytes().unwrap();

    let err = DeckGenerator::default()
        .generate_from_bytes(&bytes, &[ContentSlideRecord::new("title", "x")])
        .unwrap_err();
    assert!(matches!(err, OoxmlError::NoLayouts(_)));
}

#[test]
fn test_batch_keeps_job_order() {
    init_logging();
    let jobs = vec![
        GenerationJob {
            source: authored_source(),
            records: vec![ContentSlideRecord::new("title", "A")],
        },
        GenerationJob {
            source: TemplateSource::from_bytes(foreign_presentation()),
            records: vec![
                ContentSlideRecord::new("title", "B1"),
                ContentSlideRecord::new("closing", "B2"),
            ],
        },
        GenerationJob {
            source: TemplateSource::from_bytes(b"not a zip".to_vec()),
            records: vec![ContentSlideRecord::new("title", "C")],
        },
    ];

    let results = DeckGenerator::default().generate_batch(&jobs);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().slide_count, 1);
    assert_eq!(results[1].as_ref().unwrap().slide_count, 2);
    assert!(results[2].is_err());
}

#[test]
fn test_store_round_trip() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = DirTemplateStore::new(dir.path());
    store.save("brand", &authored_template()).unwrap();
    store.save_bytes("foreign", &foreign_presentation(), None).unwrap();
    assert_eq!(store.ids().unwrap(), vec!["brand", "foreign"]);

    let brand = store.load("brand").unwrap();
    assert!(!brand.strategy().is_heuristic());
    assert!(store.load("foreign").unwrap().strategy().is_heuristic());

    let generator = DeckGenerator::default();
    let records = vec![ContentSlideRecord::new("quote", "Stored")];
    let deck = generator.generate_from_store(&store, "brand", &records).unwrap();
    let summary = inspect(&OpcPackage::from_bytes(&deck.bytes).unwrap(), 40).unwrap();
    assert_eq!(summary.slides[0].text_preview, "Stored");

    let err = generator.generate_from_store(&store, "missing", &records).unwrap_err();
    assert!(matches!(err, OoxmlError::TemplateNotFound(_)));
}
