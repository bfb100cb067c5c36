//! Static part XML for authored templates and generated notes.
//!
//! These are the smallest documents PowerPoint opens without repair: one
//! theme, one slide master with title and body styles, a notes master, and
//! the presentation-level property parts.

use crate::common::xml::escape_xml;
use crate::ooxml::pptx::presentation::SlideIdEntry;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as FmtWrite;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Namespace declarations shared by every PresentationML part root.
pub const PML_NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#,
);

/// Non-visual and geometry properties of a shape tree root.
pub const SPTREE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
);

/// Default 4:3 slide size in EMU.
pub const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// First id of the slide master / slide layout id space.
pub const MIN_MASTER_ID: u32 = 2_147_483_648;

const CLR_MAP: &str = r#"bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink""#;

/// `presentation.xml` with one master and the given slides.
pub fn presentation_xml(master_r_id: &str, slides: &[SlideIdEntry], cx: i64, cy: i64) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, PML_NAMESPACES);
    let _ = write!(
        xml,
        r#"<p:sldMasterIdLst><p:sldMasterId id="{}" r:id="{}"/></p:sldMasterIdLst>"#,
        MIN_MASTER_ID, master_r_id
    );
    if !slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for slide in slides {
            let _ = write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, slide.id, slide.r_id);
        }
        xml.push_str("</p:sldIdLst>");
    }
    let _ = write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, cx, cy);
    let _ = write!(xml, r#"<p:notesSz cx="{}" cy="{}"/>"#, cy, cx);
    xml.push_str("</p:presentation>");
    xml
}

/// Slide master with title and body placeholders; `layouts` pairs each
/// layout id with its relationship id.
pub fn slide_master_xml(layouts: &[(u32, String)]) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, "<p:sldMaster {}>", PML_NAMESPACES);
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    xml.push_str(SPTREE_HEADER);
    xml.push_str(&master_placeholder(2, "Title Placeholder 1", "title", None, (457_200, 274_638, 8_229_600, 1_143_000), "Click to edit Master title style"));
    xml.push_str(&master_placeholder(3, "Text Placeholder 2", "body", Some(1), (457_200, 1_600_200, 8_229_600, 4_525_963), "Click to edit Master text styles"));
    xml.push_str("</p:spTree></p:cSld>");
    let _ = write!(xml, "<p:clrMap {}/>", CLR_MAP);
    xml.push_str("<p:sldLayoutIdLst>");
    for (id, r_id) in layouts {
        let _ = write!(xml, r#"<p:sldLayoutId id="{}" r:id="{}"/>"#, id, r_id);
    }
    xml.push_str("</p:sldLayoutIdLst>");
    xml.push_str("<p:txStyles>");
    xml.push_str(r#"<p:titleStyle><a:lvl1pPr algn="l" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:spcBef><a:spcPct val="0"/></a:spcBef><a:buNone/><a:defRPr sz="4400" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#);
    xml.push_str(r#"<p:bodyStyle><a:lvl1pPr marL="342900" indent="-342900" algn="l" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:spcBef><a:spcPct val="20000"/></a:spcBef><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/><a:defRPr sz="3200" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#);
    xml.push_str(r#"<p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr></p:otherStyle>"#);
    xml.push_str("</p:txStyles></p:sldMaster>");
    xml
}

fn master_placeholder(
    id: u32,
    name: &str,
    ph_type: &str,
    idx: Option<u32>,
    (x, y, cx, cy): (i64, i64, i64, i64),
    prompt: &str,
) -> String {
    let idx = idx.map(|i| format!(r#" idx="{}""#, i)).unwrap_or_default();
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#,
            r#"<p:nvPr><p:ph type="{ph_type}"{idx}/></p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{prompt}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        ),
        id = id,
        name = name,
        ph_type = ph_type,
        idx = idx,
        x = x,
        y = y,
        cx = cx,
        cy = cy,
        prompt = escape_xml(prompt),
    )
}

/// Slide layout named `name` holding `shapes` (already serialized).
pub fn slide_layout_xml(name: &str, layout_type: Option<&str>, shapes: &str) -> String {
    let mut xml = String::with_capacity(1024 + shapes.len());
    xml.push_str(XML_DECLARATION);
    let layout_type = layout_type
        .map(|t| format!(r#" type="{}""#, escape_xml(t)))
        .unwrap_or_default();
    let _ = write!(xml, r#"<p:sldLayout {}{} preserve="1">"#, PML_NAMESPACES, layout_type);
    let _ = write!(xml, r#"<p:cSld name="{}"><p:spTree>"#, escape_xml(name));
    xml.push_str(SPTREE_HEADER);
    xml.push_str(shapes);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    xml
}

/// Slide named `name` holding `shapes` (already serialized).
pub fn slide_xml(name: &str, shapes: &str) -> String {
    let mut xml = String::with_capacity(1024 + shapes.len());
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, "<p:sld {}>", PML_NAMESPACES);
    let _ = write!(xml, r#"<p:cSld name="{}"><p:spTree>"#, escape_xml(name));
    xml.push_str(SPTREE_HEADER);
    xml.push_str(shapes);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    xml
}

/// Notes slide carrying `notes`, one paragraph per line.
pub fn notes_slide_xml(notes: &str) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, "<p:notes {}>", PML_NAMESPACES);
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(SPTREE_HEADER);

    // Slide image placeholder
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#);

    // Notes text shape
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#);
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    for line in notes.lines() {
        let _ = write!(
            xml,
            r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
            escape_xml(line)
        );
    }
    if notes.lines().next().is_none() {
        xml.push_str("<a:p/>");
    }
    xml.push_str("</p:txBody></p:sp>");

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>");
    xml
}

/// Notes master with slide image and notes body placeholders.
pub fn notes_master_xml() -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, "<p:notesMaster {}>", PML_NAMESPACES);
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    xml.push_str(SPTREE_HEADER);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg" idx="2"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="1143000" y="685800"/><a:ext cx="4572000" cy="3429000"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr></p:sp>"#);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" sz="quarter" idx="3"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="685800" y="4343400"/><a:ext cx="5486400" cy="4114800"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>Click to edit Master text styles</a:t></a:r></a:p></p:txBody></p:sp>"#);
    xml.push_str("</p:spTree></p:cSld>");
    let _ = write!(xml, "<p:clrMap {}/>", CLR_MAP);
    xml.push_str(r#"<p:notesStyle><a:lvl1pPr marL="0" algn="l" rtl="0"><a:defRPr sz="1200" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:notesStyle>"#);
    xml.push_str("</p:notesMaster>");
    xml
}

/// A complete theme named `name`.
pub fn theme_xml(name: &str) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    let _ = write!(
        xml,
        r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="{}"><a:themeElements>"#,
        escape_xml(name)
    );

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (slot, rgb) in [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ] {
        let _ = write!(xml, r#"<a:{slot}><a:srgbClr val="{rgb}"/></a:{slot}>"#);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    xml.push_str(r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#);
    xml.push_str(r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#);
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#);
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for w in [9525, 25400, 38100] {
        let _ = write!(
            xml,
            r#"<a:ln w="{w}" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/></a:ln>"#
        );
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}

pub fn pres_props_xml() -> String {
    format!(r#"{}<p:presentationPr {}/>"#, XML_DECLARATION, PML_NAMESPACES)
}

pub fn view_props_xml() -> String {
    format!(
        r#"{}<p:viewPr {}><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECLARATION, PML_NAMESPACES
    )
}

pub fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECLARATION
    )
}

/// Extended properties with a slide count.
pub fn app_xml(slides: usize) -> String {
    format!(
        concat!(
            "{}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>{}</Application><Slides>{}</Slides><Notes>0</Notes><PresentationFormat>On-screen Show (4:3)</PresentationFormat>",
            "</Properties>"
        ),
        XML_DECLARATION,
        env!("CARGO_PKG_NAME"),
        slides
    )
}

/// Core properties stamped with `created` as both creation and modification time.
pub fn core_xml(title: &str, created: DateTime<Utc>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title><cp:revision>1</cp:revision>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        decl = XML_DECLARATION,
        title = escape_xml(title),
        stamp = stamp
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::presentation::read_slide_ids;
    use crate::ooxml::pptx::shapes::scan_shapes;
    use chrono::TimeZone;

    fn well_formed(xml: &str) -> bool {
        let mut reader = quick_xml::Reader::from_reader(xml.as_bytes());
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => return true,
                Ok(_) => {},
                Err(_) => return false,
            }
        }
    }

    #[test]
    fn test_parts_are_well_formed() {
        let slides = [SlideIdEntry { id: 256, r_id: "rId2".to_string() }];
        for xml in [
            presentation_xml("rId1", &slides, DEFAULT_SLIDE_WIDTH, DEFAULT_SLIDE_HEIGHT),
            slide_master_xml(&[(MIN_MASTER_ID + 1, "rId1".to_string())]),
            slide_layout_xml("Title & Content", Some("obj"), ""),
            slide_xml("Title & Content", ""),
            notes_slide_xml("a < b\nsecond"),
            notes_master_xml(),
            theme_xml("Office Theme"),
            pres_props_xml(),
            view_props_xml(),
            table_styles_xml(),
            app_xml(3),
            core_xml("Q&A", Utc::now()),
        ] {
            assert!(well_formed(&xml), "not well-formed: {}", xml);
        }
    }

    #[test]
    fn test_presentation_lists_slides() {
        let slides = [
            SlideIdEntry { id: 256, r_id: "rId2".to_string() },
            SlideIdEntry { id: 257, r_id: "rId3".to_string() },
        ];
        let xml = presentation_xml("rId1", &slides, DEFAULT_SLIDE_WIDTH, DEFAULT_SLIDE_HEIGHT);
        assert_eq!(read_slide_ids(&xml).unwrap(), slides);
    }

    #[test]
    fn test_notes_slide_text() {
        let tree = scan_shapes(&notes_slide_xml("Q&A <Session>\nthen lunch")).unwrap();
        let body = tree.first_placeholder(&["body"]).unwrap();
        assert_eq!(body.paragraphs, vec!["Q&A <Session>", "then lunch"]);
    }

    #[test]
    fn test_core_timestamp() {
        let created = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        let xml = core_xml("Deck", created);
        assert!(xml.contains("<dcterms:created xsi:type=\"dcterms:W3CDTF\">2024-05-17T09:30:00Z</dcterms:created>"));
    }
}
