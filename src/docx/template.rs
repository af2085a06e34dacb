//! Word document templating
//!
//! Placeholders of the form `${name}` are replaced with text, images or
//! caller-built content. Tables and section page sizes can be edited too.

use crate::docx::package::DocxPackage;
use crate::docx::scanner::find_placeholders;
use crate::docx::xml::{self, XmlElement, XmlNode};
use crate::error::{OfficeError, OfficeResult};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

const ROOT_RELS_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" ",
    "Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" ",
    "Target=\"word/document.xml\"/>",
    "</Relationships>"
);

/// A4 portrait in twentieths of a point
pub const A4_WIDTH: u32 = 11906;
pub const A4_HEIGHT: u32 = 16838;

const EMU_PER_POINT: u64 = 12700;

/// `w:tblW` in fiftieths of a percent
const FULL_TABLE_WIDTH_PCT: &str = "5000";

/// Children of `w:sectPr` that must come after `w:pgSz`
const AFTER_PAGE_SIZE: &[&str] = &[
    "w:pgMar",
    "w:paperSrc",
    "w:pgBorders",
    "w:lnNumType",
    "w:pgNumType",
    "w:cols",
    "w:formProt",
    "w:vAlign",
    "w:noEndnote",
    "w:titlePg",
    "w:textDirection",
    "w:bidi",
    "w:rtlGutter",
    "w:docGrid",
    "w:printerSettings",
    "w:sectPrChange",
];

/// Inline wrappers whose runs belong to the surrounding paragraph text
const RUN_WRAPPERS: &[&str] = &["w:hyperlink", "w:ins", "w:smartTag", "w:fldSimple"];

/// Block containers whose paragraphs are searched for placeholders
const NESTED_CONTAINERS: &[&str] = &[
    "w:tbl",
    "w:tr",
    "w:tc",
    "w:sdt",
    "w:sdtContent",
    "w:customXml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageType {
    /// Sniff the format from the leading magic bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageType::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageType::Jpeg)
        } else if data.starts_with(b"GIF8") {
            Some(ImageType::Gif)
        } else if data.starts_with(b"BM") {
            Some(ImageType::Bmp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpeg",
            ImageType::Gif => "gif",
            ImageType::Bmp => "bmp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
            ImageType::Gif => "image/gif",
            ImageType::Bmp => "image/bmp",
        }
    }
}

/// Picture inserted in place of a placeholder, sized in points
#[derive(Debug, Clone, PartialEq)]
pub struct DocxImage {
    pub image_type: ImageType,
    pub width_pt: u32,
    pub height_pt: u32,
    pub name: String,
    pub data: Vec<u8>,
}

impl DocxImage {
    /// Image with its type detected from `data`
    pub fn new(data: Vec<u8>, width_pt: u32, height_pt: u32) -> OfficeResult<Self> {
        let image_type = ImageType::detect(&data)
            .ok_or_else(|| OfficeError::Docx("Unrecognized image format".to_string()))?;
        Ok(Self {
            image_type,
            width_pt,
            height_pt,
            name: format!("image.{}", image_type.extension()),
            data,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Callback for custom content at a placeholder
pub type InsertFn = Box<dyn Fn(&mut InsertContext) -> OfficeResult<()>>;

/// What a placeholder is replaced with
pub enum Replacement {
    Text(String),
    Image(DocxImage),
    Insert(InsertFn),
}

impl Replacement {
    pub fn insert<F>(f: F) -> Self
    where
        F: Fn(&mut InsertContext) -> OfficeResult<()> + 'static,
    {
        Replacement::Insert(Box::new(f))
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Replacement::Image(image) => f.debug_tuple("Image").field(&image.name).finish(),
            Replacement::Insert(_) => f.write_str("Insert(..)"),
        }
    }
}

impl From<&str> for Replacement {
    fn from(text: &str) -> Self {
        Replacement::Text(text.to_string())
    }
}

impl From<String> for Replacement {
    fn from(text: String) -> Self {
        Replacement::Text(text)
    }
}

impl From<DocxImage> for Replacement {
    fn from(image: DocxImage) -> Self {
        Replacement::Image(image)
    }
}

/// Placeholder name → replacement
pub type Replacements = IndexMap<String, Replacement>;

/// The paragraph holding an insert placeholder, plus blocks queued after it
pub struct InsertContext<'a> {
    paragraph: &'a mut XmlElement,
    page_width: u32,
    queued: Vec<XmlElement>,
}

impl InsertContext<'_> {
    pub fn paragraph(&mut self) -> &mut XmlElement {
        self.paragraph
    }

    pub fn text(&self) -> String {
        self.paragraph.text()
    }

    /// Width of the enclosing section, used to size inserted tables
    pub fn page_width(&self) -> u32 {
        self.page_width
    }

    /// Append a text run to the placeholder's paragraph
    pub fn add_run(&mut self, text: &str) {
        self.paragraph.push(text_run(text, false));
    }

    /// Queue a paragraph after the placeholder's paragraph
    pub fn insert_paragraph(&mut self, text: &str) -> &mut XmlElement {
        self.queued.push(paragraph_of(&[text]));
        let last = self.queued.len() - 1;
        &mut self.queued[last]
    }

    /// Queue a table, followed by an empty paragraph. Empty rows are ignored.
    pub fn insert_table(&mut self, rows: &[Vec<String>]) {
        if let Some(table) = build_table(rows, self.page_width) {
            self.queued.push(table);
            self.queued.push(XmlElement::new("w:p"));
        }
    }
}

/// Image already stored in the package
struct ImagePlacement {
    rel_id: String,
    name: String,
    cx: u64,
    cy: u64,
}

struct ReplaceState<'a> {
    replacements: &'a Replacements,
    images: HashMap<String, ImagePlacement>,
    next_drawing_id: u32,
}

enum PendingAction<'a> {
    Image(&'a str),
    Insert(&'a str),
}

/// An open .docx: the package plus its parsed main document parts
#[derive(Debug, Clone)]
pub struct DocxDocument {
    package: DocxPackage,
    main_part: String,
    document: XmlElement,
    relationships: XmlElement,
    content_types: XmlElement,
}

impl Default for DocxDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxDocument {
    /// Blank A4 document
    pub fn new() -> Self {
        let mut package = DocxPackage::new();
        package.set_part(ROOT_RELS_PART, ROOT_RELS_XML.as_bytes().to_vec());

        let content_types = XmlElement::new("Types")
            .with_attr("xmlns", NS_CONTENT_TYPES)
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "rels")
                    .with_attr("ContentType", CT_RELATIONSHIPS),
            )
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "xml")
                    .with_attr("ContentType", "application/xml"),
            )
            .with_child(
                XmlElement::new("Override")
                    .with_attr("PartName", format!("/{}", DEFAULT_MAIN_PART))
                    .with_attr("ContentType", CT_MAIN_DOCUMENT),
            );

        let sect_pr = XmlElement::new("w:sectPr")
            .with_child(page_size_element(A4_WIDTH, A4_HEIGHT))
            .with_child(
                XmlElement::new("w:pgMar")
                    .with_attr("w:top", "1440")
                    .with_attr("w:right", "1800")
                    .with_attr("w:bottom", "1440")
                    .with_attr("w:left", "1800")
                    .with_attr("w:header", "851")
                    .with_attr("w:footer", "992")
                    .with_attr("w:gutter", "0"),
            );
        let document = XmlElement::new("w:document")
            .with_attr("xmlns:w", NS_W)
            .with_attr("xmlns:r", NS_R)
            .with_child(XmlElement::new("w:body").with_child(sect_pr));

        Self {
            package,
            main_part: DEFAULT_MAIN_PART.to_string(),
            document,
            relationships: XmlElement::new("Relationships").with_attr("xmlns", NS_RELATIONSHIPS),
            content_types,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> OfficeResult<Self> {
        let package = DocxPackage::from_bytes(bytes)?;
        let main_part = match package.part(ROOT_RELS_PART) {
            Some(rels) => main_part_from_rels(&xml::parse(rels)?),
            None => DEFAULT_MAIN_PART.to_string(),
        };

        let document = xml::parse(package.required_part(&main_part)?)?;
        if document.child("w:body").is_none() {
            return Err(OfficeError::Docx(format!("'{}' has no body", main_part)));
        }
        let relationships = match package.part(&rels_part_of(&main_part)) {
            Some(rels) => xml::parse(rels)?,
            None => XmlElement::new("Relationships").with_attr("xmlns", NS_RELATIONSHIPS),
        };
        let content_types = xml::parse(package.required_part(CONTENT_TYPES_PART)?)?;

        Ok(Self {
            package,
            main_part,
            document,
            relationships,
            content_types,
        })
    }

    pub fn open(path: &Path) -> OfficeResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> OfficeResult<Vec<u8>> {
        let mut package = self.package.clone();
        package.set_part(CONTENT_TYPES_PART, xml::to_bytes(&self.content_types)?);
        package.set_part(self.main_part.clone(), xml::to_bytes(&self.document)?);
        package.set_part(rels_part_of(&self.main_part), xml::to_bytes(&self.relationships)?);
        package.to_bytes()
    }

    pub fn save(&self, path: &Path) -> OfficeResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        tracing::info!(path = %path.display(), "docx saved");
        Ok(())
    }

    /// Main document root (`w:document`)
    pub fn document(&self) -> &XmlElement {
        &self.document
    }

    /// Append a paragraph made of one run per text
    pub fn add_paragraph<S: AsRef<str>>(&mut self, runs: &[S]) {
        let paragraph = paragraph_of(runs);
        insert_before_sect_pr(self.body_mut(), paragraph);
    }

    pub fn append_paragraph(&mut self, text: &str) {
        self.add_paragraph(&[text]);
    }

    /// Append a table sized to the last section, followed by an empty paragraph
    pub fn append_table(&mut self, rows: &[Vec<String>]) {
        let (width, _) = self.page_size();
        match build_table(rows, width) {
            Some(table) => {
                let body = self.body_mut();
                insert_before_sect_pr(body, table);
                insert_before_sect_pr(body, XmlElement::new("w:p"));
            }
            None => tracing::warn!("ignoring empty table"),
        }
    }

    /// Text of every paragraph, table cells included, in document order
    pub fn paragraph_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        if let Some(body) = self.document.child("w:body") {
            visit_paragraphs(body, &mut |p| texts.push(p.text()));
        }
        texts
    }

    /// Names of the placeholders present, in document order
    pub fn placeholders(&self) -> IndexSet<String> {
        let mut names = IndexSet::new();
        if let Some(body) = self.document.child("w:body") {
            visit_paragraphs(body, &mut |p| {
                let texts = run_texts(p, &run_paths(p));
                names.extend(find_placeholders(&texts).into_keys());
            });
        }
        names
    }

    /// Size of the last section as (width, height)
    pub fn page_size(&self) -> (u32, u32) {
        self.document
            .child("w:body")
            .and_then(|body| body.child("w:sectPr"))
            .and_then(page_size_of)
            .unwrap_or((A4_WIDTH, A4_HEIGHT))
    }

    /// Resize the last section.
    ///
    /// Content written so far keeps its size: a section break carrying the
    /// current section properties is appended first.
    pub fn set_page_size(&mut self, width: u32, height: u32) {
        let body = self.body_mut();
        let current = match body.child("w:sectPr") {
            Some(sect_pr) => sect_pr.clone(),
            None => XmlElement::new("w:sectPr").with_child(page_size_element(A4_WIDTH, A4_HEIGHT)),
        };
        let section_break =
            XmlElement::new("w:p").with_child(XmlElement::new("w:pPr").with_child(current));
        insert_before_sect_pr(body, section_break);

        let sect_pr = body.child_or_insert("w:sectPr");
        let pg_sz = match sect_pr.position_of("w:pgSz") {
            Some(pos) => pos,
            None => {
                let pos = sect_pr
                    .children
                    .iter()
                    .position(|node| {
                        matches!(node, XmlNode::Element(e) if AFTER_PAGE_SIZE.contains(&e.name.as_str()))
                    })
                    .unwrap_or(sect_pr.children.len());
                sect_pr
                    .children
                    .insert(pos, XmlNode::Element(XmlElement::new("w:pgSz")));
                pos
            }
        };
        if let XmlNode::Element(e) = &mut sect_pr.children[pg_sz] {
            e.set_attr("w:w", width.to_string());
            e.set_attr("w:h", height.to_string());
        }
    }

    /// Replace every `${name}` in the body.
    ///
    /// Runs a placeholder is split over are merged into the first one.
    /// Placeholders without a replacement keep their text.
    pub fn replace_content(&mut self, replacements: &Replacements) -> OfficeResult<()> {
        let in_use = self.placeholders();
        let mut images = HashMap::new();
        for name in &in_use {
            if let Some(Replacement::Image(image)) = replacements.get(name) {
                let rel_id = self.add_image(image)?;
                images.insert(
                    name.clone(),
                    ImagePlacement {
                        rel_id,
                        name: image.name.clone(),
                        cx: image.width_pt as u64 * EMU_PER_POINT,
                        cy: image.height_pt as u64 * EMU_PER_POINT,
                    },
                );
            }
        }
        if !images.is_empty() {
            self.declare_drawing_namespaces();
        }

        let mut state = ReplaceState {
            replacements,
            images,
            next_drawing_id: count_elements(&self.document, "wp:docPr") as u32 + 1,
        };
        let body = self.body_mut();
        replace_in_container(&mut state, body, None)?;

        tracing::debug!(placeholders = in_use.len(), "docx placeholders replaced");
        Ok(())
    }

    fn body_mut(&mut self) -> &mut XmlElement {
        self.document.child_or_insert("w:body")
    }

    /// Store image bytes as a media part and return the relationship id
    fn add_image(&mut self, image: &DocxImage) -> OfficeResult<String> {
        let ext = image.image_type.extension();
        let dir = part_dir(&self.main_part);

        let mut n = 1;
        let target = loop {
            let target = format!("media/image{}.{}", n, ext);
            if !self.package.contains(&join_part(dir, &target)) {
                break target;
            }
            n += 1;
        };
        self.package
            .set_part(join_part(dir, &target), image.data.clone());

        let has_default = self.content_types.elements().any(|e| {
            e.is("Default")
                && e.attr("Extension")
                    .is_some_and(|x| x.eq_ignore_ascii_case(ext))
        });
        if !has_default {
            self.content_types.children.insert(
                0,
                XmlNode::Element(
                    XmlElement::new("Default")
                        .with_attr("Extension", ext)
                        .with_attr("ContentType", image.image_type.content_type()),
                ),
            );
        }

        let rel_id = next_relationship_id(&self.relationships);
        self.relationships.push(
            XmlElement::new("Relationship")
                .with_attr("Id", rel_id.as_str())
                .with_attr("Type", REL_IMAGE)
                .with_attr("Target", target),
        );
        Ok(rel_id)
    }

    fn declare_drawing_namespaces(&mut self) {
        for (key, ns) in [
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ] {
            if self.document.attr(key).is_none() {
                self.document.set_attr(key, ns);
            }
        }
    }
}

/// Walk the paragraphs of a block container, splicing in what inserts queue.
///
/// `page_width` is fixed once inside nested containers; at body level it is
/// looked up per block from the section that block belongs to. Emptied
/// paragraphs are only dropped from the body: a table cell must keep a `w:p`.
fn replace_in_container(
    state: &mut ReplaceState,
    container: &mut XmlElement,
    page_width: Option<u32>,
) -> OfficeResult<()> {
    let removable = container.is("w:body");
    let mut index = 0;
    while index < container.children.len() {
        let width = page_width.unwrap_or_else(|| section_width_at(container, index));
        let XmlNode::Element(element) = &mut container.children[index] else {
            index += 1;
            continue;
        };

        if element.is("w:p") {
            let (keep, queued) = replace_in_paragraph(state, element, width)?;
            if keep || !removable {
                index += 1;
            } else {
                container.children.remove(index);
            }
            // queued blocks are not searched again
            for block in queued {
                container.children.insert(index, XmlNode::Element(block));
                index += 1;
            }
        } else {
            if NESTED_CONTAINERS.contains(&element.name.as_str()) {
                replace_in_container(state, element, Some(width))?;
            }
            index += 1;
        }
    }
    Ok(())
}

/// Returns whether the paragraph stays, and the blocks to place after it
fn replace_in_paragraph(
    state: &mut ReplaceState,
    paragraph: &mut XmlElement,
    page_width: u32,
) -> OfficeResult<(bool, Vec<XmlElement>)> {
    let paths = run_paths(paragraph);
    let mut texts = run_texts(paragraph, &paths);
    let found = find_placeholders(&texts);
    if found.is_empty() {
        return Ok((true, Vec::new()));
    }

    let mut spans: Vec<_> = found
        .iter()
        .flat_map(|(name, spans)| spans.iter().map(move |span| (name.as_str(), *span)))
        .collect();
    // spans may share a boundary run, so later runs are settled first
    spans.sort_by_key(|(_, span)| std::cmp::Reverse((span.first_run, span.last_run)));

    let replacements = state.replacements;
    let mut pending = Vec::new();
    for (name, span) in spans {
        let merged: String = texts[span.runs()].concat();
        let token = format!("${{{}}}", name);
        let text = match replacements.get(name) {
            Some(Replacement::Text(value)) => merged.replace(&token, value),
            Some(Replacement::Image(_)) => {
                pending.push(PendingAction::Image(name));
                merged.replace(&token, "")
            }
            Some(Replacement::Insert(_)) => {
                pending.push(PendingAction::Insert(name));
                merged.replace(&token, "")
            }
            None => merged,
        };

        if let Some(first) = run_at_mut(paragraph, paths[span.first_run]) {
            set_run_text(first, &text);
        }
        for run in span.runs().skip(1).collect::<Vec<_>>().into_iter().rev() {
            remove_run(paragraph, paths[run]);
        }
        texts[span.first_run] = text;
        tracing::debug!(placeholder = name, "replaced");
    }

    let mut queued = Vec::new();
    let mut inserted = false;
    // spans were merged last to first; apply images and inserts in reading order
    for action in pending.into_iter().rev() {
        match action {
            PendingAction::Image(name) => {
                if let Some(image) = state.images.get(name) {
                    let id = state.next_drawing_id;
                    state.next_drawing_id += 1;
                    paragraph
                        .child_or_insert_first("w:pPr")
                        .child_or_insert("w:jc")
                        .set_attr("w:val", "center");
                    paragraph.push(drawing_run(image, id));
                }
            }
            PendingAction::Insert(name) => {
                if let Some(Replacement::Insert(f)) = replacements.get(name) {
                    let mut ctx = InsertContext {
                        paragraph: &mut *paragraph,
                        page_width,
                        queued: Vec::new(),
                    };
                    f(&mut ctx)?;
                    queued.append(&mut ctx.queued);
                    inserted = true;
                }
            }
        }
    }

    let keep = !(inserted
        && paragraph.text().trim().is_empty()
        && count_elements(paragraph, "w:drawing") == 0);
    Ok((keep, queued))
}

/// Where a run sits: a paragraph child, or a child of the wrapper at `outer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunPath {
    outer: usize,
    inner: Option<usize>,
}

/// Runs of a paragraph in reading order, wrapped runs included
fn run_paths(paragraph: &XmlElement) -> Vec<RunPath> {
    let mut paths = Vec::new();
    for (outer, node) in paragraph.children.iter().enumerate() {
        let XmlNode::Element(element) = node else {
            continue;
        };
        if element.is("w:r") {
            paths.push(RunPath { outer, inner: None });
        } else if RUN_WRAPPERS.contains(&element.name.as_str()) {
            for (inner, child) in element.children.iter().enumerate() {
                if matches!(child, XmlNode::Element(e) if e.is("w:r")) {
                    paths.push(RunPath {
                        outer,
                        inner: Some(inner),
                    });
                }
            }
        }
    }
    paths
}

fn run_at(paragraph: &XmlElement, path: RunPath) -> Option<&XmlElement> {
    let XmlNode::Element(outer) = paragraph.children.get(path.outer)? else {
        return None;
    };
    match path.inner {
        None => Some(outer),
        Some(inner) => match outer.children.get(inner)? {
            XmlNode::Element(run) => Some(run),
            _ => None,
        },
    }
}

fn run_at_mut(paragraph: &mut XmlElement, path: RunPath) -> Option<&mut XmlElement> {
    let XmlNode::Element(outer) = paragraph.children.get_mut(path.outer)? else {
        return None;
    };
    match path.inner {
        None => Some(outer),
        Some(inner) => match outer.children.get_mut(inner)? {
            XmlNode::Element(run) => Some(run),
            _ => None,
        },
    }
}

/// Runs must be removed last to first so earlier paths stay valid
fn remove_run(paragraph: &mut XmlElement, path: RunPath) {
    match path.inner {
        None if path.outer < paragraph.children.len() => {
            paragraph.children.remove(path.outer);
        }
        None => {}
        Some(inner) => {
            if let Some(XmlNode::Element(wrapper)) = paragraph.children.get_mut(path.outer) {
                if inner < wrapper.children.len() {
                    wrapper.children.remove(inner);
                }
            }
        }
    }
}

/// Text of each run, in order
fn run_texts(paragraph: &XmlElement, paths: &[RunPath]) -> Vec<String> {
    paths
        .iter()
        .map(|path| {
            run_at(paragraph, *path)
                .map(|run| {
                    run.elements()
                        .filter(|e| e.is("w:t"))
                        .map(XmlElement::text)
                        .collect::<String>()
                })
                .unwrap_or_default()
        })
        .collect()
}

/// Replace all `w:t` of a run with one preserved-space `w:t`
fn set_run_text(run: &mut XmlElement, text: &str) {
    let first_text = run
        .children
        .iter()
        .position(|node| matches!(node, XmlNode::Element(e) if e.is("w:t")));
    run.children
        .retain(|node| !matches!(node, XmlNode::Element(e) if e.is("w:t")));

    let t = XmlNode::Element(text_element(text));
    match first_text {
        Some(pos) => run.children.insert(pos.min(run.children.len()), t),
        None => run.children.push(t),
    }
}

fn text_element(text: &str) -> XmlElement {
    XmlElement::new("w:t")
        .with_attr("xml:space", "preserve")
        .with_text(text)
}

fn text_run(text: &str, bold: bool) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if bold {
        run.push(XmlElement::new("w:rPr").with_child(XmlElement::new("w:b")));
    }
    run.with_child(text_element(text))
}

fn paragraph_of<S: AsRef<str>>(runs: &[S]) -> XmlElement {
    let mut paragraph = XmlElement::new("w:p");
    for text in runs {
        paragraph.push(text_run(text.as_ref(), false));
    }
    paragraph
}

/// Centred full-width table with a bold first row; `None` when there is nothing to show
fn build_table(rows: &[Vec<String>], page_width: u32) -> Option<XmlElement> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return None;
    }
    let cell_width = (page_width / columns as u32).to_string();

    let mut borders = XmlElement::new("w:tblBorders");
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push(
            XmlElement::new(side)
                .with_attr("w:val", "single")
                .with_attr("w:sz", "4")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto"),
        );
    }
    let tbl_pr = XmlElement::new("w:tblPr")
        .with_child(
            XmlElement::new("w:tblW")
                .with_attr("w:w", FULL_TABLE_WIDTH_PCT)
                .with_attr("w:type", "pct"),
        )
        .with_child(XmlElement::new("w:jc").with_attr("w:val", "center"))
        .with_child(borders);

    let mut grid = XmlElement::new("w:tblGrid");
    for _ in 0..columns {
        grid.push(XmlElement::new("w:gridCol").with_attr("w:w", cell_width.as_str()));
    }

    let mut table = XmlElement::new("w:tbl").with_child(tbl_pr).with_child(grid);
    for (row_index, row) in rows.iter().enumerate() {
        let mut tr = XmlElement::new("w:tr");
        for col in 0..columns {
            let text = row.get(col).map(String::as_str).unwrap_or("");
            let tc = XmlElement::new("w:tc")
                .with_child(
                    XmlElement::new("w:tcPr").with_child(
                        XmlElement::new("w:tcW")
                            .with_attr("w:w", cell_width.as_str())
                            .with_attr("w:type", "dxa"),
                    ),
                )
                .with_child(XmlElement::new("w:p").with_child(text_run(text, row_index == 0)));
            tr.push(tc);
        }
        table.push(tr);
    }
    Some(table)
}

fn drawing_run(image: &ImagePlacement, id: u32) -> XmlElement {
    let cx = image.cx.to_string();
    let cy = image.cy.to_string();
    let id = id.to_string();

    let pic = XmlElement::new("pic:pic")
        .with_child(
            XmlElement::new("pic:nvPicPr")
                .with_child(
                    XmlElement::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", image.name.as_str()),
                )
                .with_child(XmlElement::new("pic:cNvPicPr")),
        )
        .with_child(
            XmlElement::new("pic:blipFill")
                .with_child(XmlElement::new("a:blip").with_attr("r:embed", image.rel_id.as_str()))
                .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect"))),
        )
        .with_child(
            XmlElement::new("pic:spPr")
                .with_child(
                    XmlElement::new("a:xfrm")
                        .with_child(XmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            XmlElement::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    XmlElement::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(XmlElement::new("a:avLst")),
                ),
        );

    let inline = XmlElement::new("wp:inline")
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            XmlElement::new("wp:extent")
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(
            XmlElement::new("wp:effectExtent")
                .with_attr("l", "0")
                .with_attr("t", "0")
                .with_attr("r", "0")
                .with_attr("b", "0"),
        )
        .with_child(
            XmlElement::new("wp:docPr")
                .with_attr("id", id.as_str())
                .with_attr("name", format!("Picture {}", id))
                .with_attr("descr", image.name.as_str()),
        )
        .with_child(
            XmlElement::new("wp:cNvGraphicFramePr").with_child(
                XmlElement::new("a:graphicFrameLocks").with_attr("noChangeAspect", "1"),
            ),
        )
        .with_child(
            XmlElement::new("a:graphic").with_child(
                XmlElement::new("a:graphicData")
                    .with_attr("uri", "http://schemas.openxmlformats.org/drawingml/2006/picture")
                    .with_child(pic),
            ),
        );

    XmlElement::new("w:r").with_child(XmlElement::new("w:drawing").with_child(inline))
}

fn visit_paragraphs<F: FnMut(&XmlElement)>(container: &XmlElement, f: &mut F) {
    for element in container.elements() {
        if element.is("w:p") {
            f(element);
        } else if NESTED_CONTAINERS.contains(&element.name.as_str()) {
            visit_paragraphs(element, f);
        }
    }
}

fn count_elements(element: &XmlElement, name: &str) -> usize {
    element
        .elements()
        .map(|e| usize::from(e.is(name)) + count_elements(e, name))
        .sum()
}

fn insert_before_sect_pr(body: &mut XmlElement, element: XmlElement) {
    let pos = body.position_of("w:sectPr").unwrap_or(body.children.len());
    body.children.insert(pos, XmlNode::Element(element));
}

fn page_size_element(width: u32, height: u32) -> XmlElement {
    XmlElement::new("w:pgSz")
        .with_attr("w:w", width.to_string())
        .with_attr("w:h", height.to_string())
}

fn page_size_of(sect_pr: &XmlElement) -> Option<(u32, u32)> {
    let pg_sz = sect_pr.child("w:pgSz")?;
    let width = pg_sz.attr("w:w")?.parse().ok()?;
    let height = pg_sz.attr("w:h")?.parse().ok()?;
    Some((width, height))
}

/// Page width of the section holding body child `index`: the next section
/// break at or after it, else the body's own section
fn section_width_at(body: &XmlElement, index: usize) -> u32 {
    let section_break = body.children[index..].iter().find_map(|node| match node {
        XmlNode::Element(p) if p.is("w:p") => p.child("w:pPr")?.child("w:sectPr"),
        _ => None,
    });
    section_break
        .or_else(|| body.child("w:sectPr"))
        .and_then(page_size_of)
        .map(|(width, _)| width)
        .unwrap_or(A4_WIDTH)
}

fn next_relationship_id(relationships: &XmlElement) -> String {
    let max = relationships
        .elements()
        .filter_map(|e| e.attr("Id"))
        .filter_map(|id| id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

fn main_part_from_rels(rels: &XmlElement) -> String {
    rels.elements()
        .find(|e| e.attr("Type") == Some(REL_OFFICE_DOCUMENT))
        .and_then(|e| e.attr("Target"))
        .map(|target| target.trim_start_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
}

/// Directory of a part name, `""` at the package root
fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn join_part(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn rels_part_of(part: &str) -> String {
    let file = part.rsplit('/').next().unwrap_or(part);
    join_part(part_dir(part), &format!("_rels/{}.rels", file))
}
