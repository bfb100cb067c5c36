//! Building templates from explicit layout definitions.
//!
//! The author writes one slide master, a slide layout per definition and a
//! sample slide per layout. Sample slides hold exactly the shapes that the
//! resolver's discovery treats as placeholders, so a template produced here
//! resolves heuristically to the same layouts its manifest declares.
//!
//! # Examples
//!
//! ```
//! use slideforge::ooxml::pptx::{LayoutDefinition, PlaceholderSpec, TemplateAuthor};
//! use slideforge::ooxml::pptx::manifest::Geometry;
//!
//! let title = LayoutDefinition::new("title")
//!     .with_layout_type("title")
//!     .with_placeholder(
//!         PlaceholderSpec::new("ctrTitle", "{{TITLE}}")
//!             .with_geometry(Geometry { x: 685_800, y: 2_130_425, cx: 7_772_400, cy: 1_470_025 })
//!             .with_font_size(44),
//!     );
//! let authored = TemplateAuthor::new().build(&[title]).unwrap();
//! assert_eq!(authored.manifest.layouts[0].source_slide, 1);
//! ```

use crate::common::xml::escape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, Part};
use crate::ooxml::pptx::manifest::{Geometry, LayoutManifest, LayoutManifestEntry, TEXTBOX_TYPE};
use crate::ooxml::pptx::presentation::{MIN_SLIDE_ID, SlideIdEntry};
use crate::ooxml::pptx::resolver::{LayoutStrategy, placeholders_from_tree, slide_partname};
use crate::ooxml::pptx::shapes::scan_shapes;
use crate::ooxml::pptx::template::{
    DEFAULT_SLIDE_HEIGHT, DEFAULT_SLIDE_WIDTH, MIN_MASTER_ID, app_xml, core_xml,
    pres_props_xml, presentation_xml, slide_layout_xml, slide_master_xml, slide_xml,
    table_styles_xml, theme_xml, view_props_xml,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    fn as_ooxml(self) -> &'static str {
        match self {
            TextAlign::Left => "l",
            TextAlign::Center => "ctr",
            TextAlign::Right => "r",
            TextAlign::Justify => "just",
        }
    }
}

/// One placeholder of a layout definition.
///
/// `ph_type` is an OOXML placeholder type (`title`, `body`, ...) or
/// `textbox` for a plain text box, which only becomes a placeholder when
/// its text carries a `{{NAME}}` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    #[serde(rename = "type")]
    pub ph_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prompt or tagged text; one paragraph per line
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub geometry: Geometry,
    /// Font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    /// `RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(default)]
    pub no_bullets: bool,
}

impl PlaceholderSpec {
    pub fn new(ph_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ph_type: ph_type.into(),
            idx: None,
            name: None,
            text: text.into(),
            geometry: Geometry::default(),
            font_size: None,
            color: None,
            align: None,
            no_bullets: false,
        }
    }

    /// A plain text box with tagged text.
    pub fn textbox(text: impl Into<String>) -> Self {
        Self::new(TEXTBOX_TYPE, text)
    }

    pub fn with_idx(mut self, idx: u32) -> Self {
        self.idx = Some(idx);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_font_size(mut self, points: u32) -> Self {
        self.font_size = Some(points);
        self
    }

    pub fn with_color(mut self, rgb: impl Into<String>) -> Self {
        self.color = Some(rgb.into());
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn without_bullets(mut self) -> Self {
        self.no_bullets = true;
        self
    }

    fn is_textbox(&self) -> bool {
        self.ph_type == TEXTBOX_TYPE
    }
}

/// A filled rectangle drawn on the layout. Never a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub name: String,
    pub geometry: Geometry,
    /// `RRGGBB`
    pub fill: String,
}

/// Everything needed to author one layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<String>,
    #[serde(default)]
    pub placeholders: Vec<PlaceholderSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<Decoration>,
    #[serde(default)]
    pub default: bool,
}

impl LayoutDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout_type: None,
            placeholders: Vec::new(),
            decorations: Vec::new(),
            default: false,
        }
    }

    pub fn with_layout_type(mut self, layout_type: impl Into<String>) -> Self {
        self.layout_type = Some(layout_type.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderSpec) -> Self {
        self.placeholders.push(placeholder);
        self
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decorations.push(decoration);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// Parse a YAML list of layout definitions.
pub fn definitions_from_yaml(yaml: &str) -> Result<Vec<LayoutDefinition>> {
    serde_saphyr::from_str(yaml)
        .map_err(|e| OoxmlError::Manifest(format!("Failed to parse layout definitions: {}", e)))
}

/// A freshly built template and the manifest describing it.
#[derive(Debug, Clone)]
pub struct AuthoredTemplate {
    pub package: OpcPackage,
    pub manifest: LayoutManifest,
}

impl AuthoredTemplate {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.package.to_bytes()?)
    }

    /// Write the template to `path` and its manifest next to it as
    /// `<stem>.manifest.yaml`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.package.save(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| OoxmlError::InvalidTemplate(format!("bad template path {}", path.display())))?;
        std::fs::write(path.with_file_name(format!("{}.manifest.yaml", stem)), self.manifest.to_yaml()?)?;
        Ok(())
    }
}

/// Builder for new templates.
#[derive(Debug, Clone)]
pub struct TemplateAuthor {
    title: String,
    slide_width: i64,
    slide_height: i64,
    created: DateTime<Utc>,
}

impl Default for TemplateAuthor {
    fn default() -> Self {
        Self {
            title: "Template".to_string(),
            slide_width: DEFAULT_SLIDE_WIDTH,
            slide_height: DEFAULT_SLIDE_HEIGHT,
            created: DateTime::<Utc>::default(),
        }
    }
}

impl TemplateAuthor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Slide size in EMU.
    pub fn with_slide_size(mut self, cx: i64, cy: i64) -> Self {
        self.slide_width = cx;
        self.slide_height = cy;
        self
    }

    /// Creation timestamp written to the core properties.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Build a template holding one layout and one sample slide per
    /// definition, in order.
    ///
    /// # Errors
    /// [`OoxmlError::NoLayouts`] for an empty list, [`OoxmlError::InvalidTemplate`]
    /// for bad definitions, and [`OoxmlError::InconsistentTemplate`] when the
    /// result does not resolve to the layouts it was built from.
    pub fn build(&self, layouts: &[LayoutDefinition]) -> Result<AuthoredTemplate> {
        if layouts.is_empty() {
            return Err(OoxmlError::NoLayouts("no layout definitions given".to_string()));
        }
        for layout in layouts {
            validate_definition(layout)?;
        }

        let mut package = OpcPackage::new();
        let pres_name = PackURI::new("/ppt/presentation.xml")?;
        let master_name = PackURI::new("/ppt/slideMasters/slideMaster1.xml")?;
        let theme_name = PackURI::new("/ppt/theme/theme1.xml")?;

        let mut pres = Part::xml(pres_name.clone(), ct::PML_PRESENTATION_MAIN, String::new());
        let master_r_id = pres.rels_mut().add(rt::SLIDE_MASTER, &master_name);
        let mut master = Part::xml(master_name.clone(), ct::PML_SLIDE_MASTER, String::new());

        let mut entries = Vec::with_capacity(layouts.len());
        let mut layout_ids = Vec::with_capacity(layouts.len());
        let mut slide_ids = Vec::with_capacity(layouts.len());

        for (k, definition) in (1u32..).zip(layouts) {
            let layout_name = PackURI::new(format!("/ppt/slideLayouts/slideLayout{}.xml", k))?;
            let layout_xml = slide_layout_xml(
                &definition.name,
                definition.layout_type.as_deref(),
                &layout_shapes(definition)?,
            );

            // The sample slide copies what discovery sees as placeholders.
            let tree = scan_shapes(&layout_xml)?;
            let found = placeholders_from_tree(&tree);
            let shapes: String = found
                .iter()
                .map(|(i, _)| &layout_xml[tree.shapes[*i].span.clone()])
                .collect();
            let slide_name = slide_partname(k)?;
            let mut slide = Part::xml(slide_name.clone(), ct::PML_SLIDE, slide_xml(&definition.name, &shapes));

            let mut layout = Part::xml(layout_name.clone(), ct::PML_SLIDE_LAYOUT, layout_xml);
            layout.rels_mut().add(rt::SLIDE_MASTER, &master_name);
            slide.rels_mut().add(rt::SLIDE_LAYOUT, &layout_name);
            layout_ids.push((MIN_MASTER_ID + k, master.rels_mut().add(rt::SLIDE_LAYOUT, &layout_name)));
            slide_ids.push(SlideIdEntry {
                id: MIN_SLIDE_ID + k - 1,
                r_id: pres.rels_mut().add(rt::SLIDE, &slide_name),
            });

            let mut entry = LayoutManifestEntry::new(definition.name.clone(), k);
            entry.layout_type = definition.layout_type.clone();
            entry.default = definition.default;
            entry.placeholders = found.into_iter().map(|(_, ph)| ph).collect();
            entries.push(entry);

            package.put_part(layout);
            package.put_part(slide);
        }

        master.rels_mut().add(rt::THEME, &theme_name);
        master.set_xml(slide_master_xml(&layout_ids));
        package.put_part(master);
        package.put_part(Part::xml(theme_name.clone(), ct::OFC_THEME, theme_xml(&self.title)));

        for (name, content_type, reltype, xml) in [
            ("/ppt/presProps.xml", ct::PML_PRES_PROPS, rt::PRES_PROPS, pres_props_xml()),
            ("/ppt/viewProps.xml", ct::PML_VIEW_PROPS, rt::VIEW_PROPS, view_props_xml()),
            ("/ppt/tableStyles.xml", ct::PML_TABLE_STYLES, rt::TABLE_STYLES, table_styles_xml()),
        ] {
            let partname = PackURI::new(name)?;
            pres.rels_mut().add(reltype, &partname);
            package.put_part(Part::xml(partname, content_type, xml));
        }
        pres.rels_mut().add(rt::THEME, &theme_name);
        pres.set_xml(presentation_xml(&master_r_id, &slide_ids, self.slide_width, self.slide_height));
        package.put_part(pres);
        package.rels_mut().add(rt::OFFICE_DOCUMENT, &pres_name);

        let core_name = PackURI::new("/docProps/core.xml")?;
        let app_name = PackURI::new("/docProps/app.xml")?;
        package.put_part(Part::xml(core_name.clone(), ct::OPC_CORE_PROPERTIES, core_xml(&self.title, self.created)));
        package.put_part(Part::xml(app_name.clone(), ct::OFC_EXTENDED_PROPERTIES, app_xml(layouts.len())));
        package.rels_mut().add(rt::CORE_PROPERTIES, &core_name);
        package.rels_mut().add(rt::EXTENDED_PROPERTIES, &app_name);

        let manifest = LayoutManifest::new(entries);
        manifest.validate()?;
        check_self_consistency(&package, &manifest)?;

        log::debug!("authored template '{}' with {} layouts", self.title, manifest.len());
        Ok(AuthoredTemplate { package, manifest })
    }
}

fn validate_definition(layout: &LayoutDefinition) -> Result<()> {
    let invalid = |what: String| OoxmlError::InvalidTemplate(format!("layout '{}': {}", layout.name, what));

    if layout.name.trim().is_empty() {
        return Err(invalid("empty layout name".to_string()));
    }
    for spec in &layout.placeholders {
        if spec.ph_type.is_empty() {
            return Err(invalid("placeholder without a type".to_string()));
        }
        if spec.geometry.cx < 0 || spec.geometry.cy < 0 {
            return Err(invalid(format!("negative size on {} placeholder", spec.ph_type)));
        }
        if let Some(color) = &spec.color {
            if !is_rgb(color) {
                return Err(invalid(format!("color '{}' is not RRGGBB", color)));
            }
        }
    }
    for decoration in &layout.decorations {
        if !is_rgb(&decoration.fill) {
            return Err(invalid(format!("fill '{}' is not RRGGBB", decoration.fill)));
        }
    }
    Ok(())
}

fn is_rgb(value: &str) -> bool {
    value.len() == 6 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Serialized shapes of a layout: decorations first, then placeholders.
fn layout_shapes(layout: &LayoutDefinition) -> Result<String> {
    let mut xml = String::new();
    let mut next_id = 2u32;

    for decoration in &layout.decorations {
        let Geometry { x, y, cx, cy } = decoration.geometry;
        let _ = write!(
            xml,
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#,
                r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
            ),
            next_id,
            escape_xml(&decoration.name),
            x,
            y,
            cx,
            cy,
            decoration.fill.to_ascii_uppercase()
        );
        next_id += 1;
    }

    for spec in &layout.placeholders {
        xml.push_str(&placeholder_shape(next_id, spec));
        next_id += 1;
    }
    Ok(xml)
}

fn placeholder_shape(id: u32, spec: &PlaceholderSpec) -> String {
    let name = spec.name.clone().unwrap_or_else(|| {
        let kind = if spec.is_textbox() { "TextBox" } else { "Placeholder" };
        format!("{} {}", kind, id - 1)
    });

    let mut xml = String::with_capacity(512);
    let _ = write!(xml, r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/>"#, id, escape_xml(&name));
    if spec.is_textbox() {
        xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
    } else {
        xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>"#);
        let _ = write!(xml, r#"<p:ph type="{}""#, escape_xml(&spec.ph_type));
        if let Some(idx) = spec.idx {
            let _ = write!(xml, r#" idx="{}""#, idx);
        }
        xml.push_str("/></p:nvPr></p:nvSpPr>");
    }

    let Geometry { x, y, cx, cy } = spec.geometry;
    let _ = write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#,
        x, y, cx, cy
    );
    if spec.is_textbox() {
        xml.push_str("<a:noFill/>");
    }
    xml.push_str("</p:spPr>");

    xml.push_str(r#"<p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>"#);
    let p_pr = paragraph_properties(spec);
    let r_pr = run_properties(spec);
    if spec.text.is_empty() {
        let _ = write!(xml, "<a:p>{}</a:p>", p_pr);
    }
    for line in spec.text.lines() {
        let _ = write!(
            xml,
            "<a:p>{}<a:r>{}<a:t>{}</a:t></a:r></a:p>",
            p_pr,
            r_pr,
            escape_xml(line)
        );
    }
    xml.push_str("</p:txBody></p:sp>");
    xml
}

fn paragraph_properties(spec: &PlaceholderSpec) -> String {
    if spec.align.is_none() && !spec.no_bullets {
        return String::new();
    }
    let mut xml = String::from("<a:pPr");
    if spec.no_bullets {
        xml.push_str(r#" marL="0" indent="0""#);
    }
    if let Some(align) = spec.align {
        let _ = write!(xml, r#" algn="{}""#, align.as_ooxml());
    }
    if spec.no_bullets {
        xml.push_str("><a:buNone/></a:pPr>");
    } else {
        xml.push_str("/>");
    }
    xml
}

fn run_properties(spec: &PlaceholderSpec) -> String {
    let mut xml = String::from(r#"<a:rPr lang="en-US""#);
    if let Some(points) = spec.font_size {
        let _ = write!(xml, r#" sz="{}""#, points * 100);
    }
    xml.push_str(r#" dirty="0""#);
    match &spec.color {
        Some(color) => {
            let _ = write!(
                xml,
                r#"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:rPr>"#,
                color.to_ascii_uppercase()
            );
        },
        None => xml.push_str("/>"),
    }
    xml
}

/// Resolve the built package heuristically and compare with `manifest`.
fn check_self_consistency(package: &OpcPackage, manifest: &LayoutManifest) -> Result<()> {
    let resolved = LayoutStrategy::Heuristic.resolve(package)?;
    if resolved.len() != manifest.len() {
        return Err(OoxmlError::InconsistentTemplate(format!(
            "{} layouts authored, {} discovered",
            manifest.len(),
            resolved.len()
        )));
    }
    for (authored, found) in manifest.layouts.iter().zip(resolved.iter()) {
        let same = authored.name == found.name
            && authored.source_slide == found.source_slide
            && authored.layout_type == found.layout_type
            && authored.placeholders == found.placeholders;
        if !same {
            return Err(OoxmlError::InconsistentTemplate(format!(
                "layout '{}' resolves as '{}' on slide {}",
                authored.name, found.name, found.source_slide
            )));
        }
    }
    Ok(())
}
