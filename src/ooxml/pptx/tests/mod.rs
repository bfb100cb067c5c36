//! End-to-end tests of the template pipeline.
//!
//! Two kinds of template are used: one built with [`TemplateAuthor`] (with a
//! manifest) and a small hand-zipped "foreign" deck that has to be
//! discovered heuristically.

mod foreign;
mod scenarios;

use crate::ooxml::opc::OpcPackage;
use crate::ooxml::pptx::manifest::Geometry;
use crate::ooxml::pptx::template::notes_slide_xml;
use crate::ooxml::pptx::{
    AuthoredTemplate, LayoutDefinition, PlaceholderSpec, TemplateAuthor, TemplateSource, TextAlign,
};
use std::io::Write;
use std::sync::Once;
use zip::write::SimpleFileOptions;

static INIT: Once = Once::new();

/// Route `log` output through the test harness (`RUST_LOG=debug` to see it).
pub(super) fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn geometry(y: i64, cy: i64) -> Geometry {
    Geometry {
        x: 457_200,
        y,
        cx: 8_229_600,
        cy,
    }
}

/// Layouts `title`, `content` and `quote`, backed by slides 1, 2 and 3.
pub(super) fn authored_template() -> AuthoredTemplate {
    let layouts = [
        LayoutDefinition::new("title")
            .with_layout_type("title")
            .with_placeholder(
                PlaceholderSpec::new("ctrTitle", "{{TITLE}}")
                    .with_geometry(geometry(2_130_425, 1_470_025))
                    .with_font_size(44),
            )
            .with_placeholder(
                PlaceholderSpec::new("subTitle", "{{SUBTITLE}}")
                    .with_idx(1)
                    .with_geometry(geometry(3_886_200, 1_752_600))
                    .without_bullets(),
            ),
        LayoutDefinition::new("content")
            .with_layout_type("obj")
            .with_placeholder(PlaceholderSpec::new("title", "").with_geometry(geometry(274_638, 1_143_000)))
            .with_placeholder(
                PlaceholderSpec::new("body", "")
                    .with_idx(1)
                    .with_geometry(geometry(1_600_200, 4_525_963)),
            ),
        LayoutDefinition::new("quote")
            .with_placeholder(
                PlaceholderSpec::textbox("{{HEADLINE}}")
                    .with_geometry(geometry(1_600_200, 2_000_000))
                    .with_font_size(32)
                    .with_align(TextAlign::Center),
            )
            .with_placeholder(
                PlaceholderSpec::textbox("{{TEXT}}")
                    .with_geometry(geometry(3_800_000, 1_000_000))
                    .with_color("7F7F7F"),
            ),
    ];
    TemplateAuthor::new()
        .with_title("Scenario Brand")
        .build(&layouts)
        .unwrap()
}

/// The authored template with its manifest.
pub(super) fn authored_source() -> TemplateSource {
    TemplateSource::try_from(&authored_template()).unwrap()
}

/// Zip `(member, text)` pairs into package bytes.
pub(super) fn zip_parts(parts: &[(&str, String)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, text) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(text.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/{}" Target="{}"/>"#,
            id, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn slide(name: Option<&str>, shapes: &str) -> String {
    let name = name.map(|n| format!(r#" name="{}""#, n)).unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld{name}><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sld>"#
    )
}

fn sp(id: u32, ph: &str, body: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Shape {id}"/><p:cNvSpPr/><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/>{body}</p:sp>"#
    )
}

fn text_body(text: &str) -> String {
    format!(r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p></p:txBody>"#, text)
}

const PRES_MAIN: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const POTX_MAIN: &str = "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml";

/// A deck written by some other tool, without a manifest:
///
/// - slide 1 uses layout "Title Slide" (`type="title"`): a title placeholder
///   holding `{{TITLE}}` and a text box holding `{{BODY}}`
/// - slide 2 is decoration only
/// - slide 3 is named "Closing": a title placeholder with plain text, an
///   empty body placeholder, and a notes slide
pub(super) fn foreign_template(main_content_type: &str) -> Vec<u8> {
    let content_types = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="{}"/>"#,
            r#"<Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            r#"<Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            r#"<Override PartName="/ppt/slides/slide3.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>"#,
            r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            "</Types>"
        ),
        main_content_type
    );

    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/><p:sldId id="258" r:id="rId4"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    );

    let layout = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout {NS} type="title"><p:cSld name="Title Slide"><p:spTree/></p:cSld></p:sldLayout>"#
    );

    let slide1 = slide(
        None,
        &[
            sp(2, r#"<p:ph type="title"/>"#, &text_body("{{TITLE}}")),
            sp(3, "", &text_body("{{BODY}}")),
        ]
        .concat(),
    );
    let slide2 = slide(Some("Decor"), &sp(2, "", &text_body("Just a logo")));
    let slide3 = slide(
        Some("Closing"),
        &[
            sp(2, r#"<p:ph type="title"/>"#, &text_body("Thanks")),
            sp(3, r#"<p:ph type="body" idx="1"/>"#, ""),
        ]
        .concat(),
    );

    let app = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Slides>3</Slides><Notes>1</Notes></Properties>"#;

    zip_parts(&[
        ("[Content_Types].xml", content_types),
        (
            "_rels/.rels",
            rels(&[
                ("rId1", "officeDocument/2006/relationships/officeDocument", "ppt/presentation.xml"),
                ("rId2", "officeDocument/2006/relationships/extended-properties", "docProps/app.xml"),
            ]),
        ),
        ("docProps/app.xml", app.to_string()),
        ("ppt/presentation.xml", presentation),
        (
            "ppt/_rels/presentation.xml.rels",
            rels(&[
                ("rId2", "officeDocument/2006/relationships/slide", "slides/slide1.xml"),
                ("rId3", "officeDocument/2006/relationships/slide", "slides/slide2.xml"),
                ("rId4", "officeDocument/2006/relationships/slide", "slides/slide3.xml"),
            ]),
        ),
        ("ppt/slideLayouts/slideLayout1.xml", layout),
        ("ppt/slides/slide1.xml", slide1),
        (
            "ppt/slides/_rels/slide1.xml.rels",
            rels(&[("rId1", "officeDocument/2006/relationships/slideLayout", "../slideLayouts/slideLayout1.xml")]),
        ),
        ("ppt/slides/slide2.xml", slide2),
        ("ppt/slides/slide3.xml", slide3),
        (
            "ppt/slides/_rels/slide3.xml.rels",
            rels(&[("rId1", "officeDocument/2006/relationships/notesSlide", "../notesSlides/notesSlide1.xml")]),
        ),
        ("ppt/notesSlides/notesSlide1.xml", notes_slide_xml("Closing remarks")),
        (
            "ppt/notesSlides/_rels/notesSlide1.xml.rels",
            rels(&[("rId1", "officeDocument/2006/relationships/slide", "../slides/slide3.xml")]),
        ),
    ])
}

pub(super) fn foreign_presentation() -> Vec<u8> {
    foreign_template(PRES_MAIN)
}

pub(super) fn foreign_potx() -> Vec<u8> {
    foreign_template(POTX_MAIN)
}

/// Partname of the slide layout used by `slide`.
pub(super) fn layout_of(package: &OpcPackage, slide: &str) -> String {
    package
        .part(slide)
        .unwrap()
        .rels()
        .part_with_reltype(crate::ooxml::opc::constants::relationship_type::SLIDE_LAYOUT)
        .unwrap()
        .target_partname()
        .unwrap()
        .to_string()
}
