//! Word template tests
//!
//! Documents are built with `DocxDocument::new`, saved, reopened and filled.

use officekit::docx::{
    find_placeholders, DocxDocument, DocxImage, DocxPackage, Replacement, Replacements,
    A4_HEIGHT, A4_WIDTH,
};
use officekit::OfficeError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn values(pairs: Vec<(&str, Replacement)>) -> Replacements {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn reopen(doc: &DocxDocument) -> DocxDocument {
    DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// PLACEHOLDER SCAN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_scan_split_runs_and_lone_dollar() {
    let found = find_placeholders(&["Price $10 for $", "{it", "em}", " on ${day"]);
    let names: Vec<&str> = found.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["item"]);
    let span = found["item"][0];
    assert_eq!((span.first_run, span.last_run), (0, 2));
}

#[test]
fn test_placeholders_in_document_order() {
    let mut doc = DocxDocument::new();
    doc.add_paragraph(&["${title}"]);
    doc.append_table(&[
        vec!["Name".to_string(), "${name}".to_string()],
        vec!["Date".to_string(), "${date}".to_string()],
    ]);
    doc.add_paragraph(&["${title} again, $", "{sign}"]);

    let names: Vec<String> = reopen(&doc).placeholders().into_iter().collect();
    assert_eq!(names, vec!["title", "name", "date", "sign"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// REPLACEMENT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_replace_text_across_runs_after_reload() {
    let mut doc = DocxDocument::new();
    doc.add_paragraph(&["Dear ", "$", "{name", "}", ", total ${total} ${unknown}"]);
    let mut doc = reopen(&doc);

    doc.replace_content(&values(vec![
        ("name", "Ann Lee".into()),
        ("total", "1,200".into()),
    ]))
    .unwrap();

    assert_eq!(
        reopen(&doc).paragraph_texts(),
        vec!["Dear Ann Lee, total 1,200 ${unknown}"]
    );
}

#[test]
fn test_replace_inside_table_cells() {
    let mut doc = DocxDocument::new();
    doc.append_table(&[vec!["Customer".to_string(), "${customer}".to_string()]]);
    doc.replace_content(&values(vec![("customer", "ACME".into())]))
        .unwrap();

    let texts = reopen(&doc).paragraph_texts();
    assert_eq!(texts, vec!["Customer", "ACME", ""]);
}

#[test]
fn test_special_characters_survive_save() {
    let mut doc = DocxDocument::new();
    doc.append_paragraph("${x}");
    doc.replace_content(&values(vec![("x", "<a & b>".into())]))
        .unwrap();
    assert_eq!(reopen(&doc).paragraph_texts(), vec!["<a & b>"]);
}

#[test]
fn test_image_replacement_adds_media_part() {
    let mut doc = DocxDocument::new();
    doc.append_paragraph("Signature: ${sign}");
    let image = DocxImage::new(PNG.to_vec(), 120, 40).unwrap().with_name("sign.png");
    doc.replace_content(&values(vec![("sign", image.into())]))
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let package = DocxPackage::from_bytes(&bytes).unwrap();
    assert_eq!(package.part("word/media/image1.png"), Some(PNG));

    let content_types = String::from_utf8(package.part("[Content_Types].xml").unwrap().to_vec()).unwrap();
    assert!(content_types.contains("Extension=\"png\""));
    let document = String::from_utf8(package.part("word/document.xml").unwrap().to_vec()).unwrap();
    assert!(document.contains("cx=\"1524000\""));
    assert!(document.contains("cy=\"508000\""));
    assert!(document.contains("<w:jc w:val=\"center\"/>"));

    assert_eq!(DocxDocument::from_bytes(&bytes).unwrap().paragraph_texts(), vec!["Signature: "]);
}

#[test]
fn test_insert_callback_queues_content() {
    let mut doc = DocxDocument::new();
    doc.append_paragraph("${items}");
    doc.append_paragraph("end");

    let insert = Replacement::insert(|ctx| {
        assert_eq!(ctx.page_width(), A4_WIDTH);
        ctx.insert_paragraph("Items:");
        ctx.insert_table(&[vec!["Item".to_string(), "Qty".to_string()]]);
        Ok(())
    });
    doc.replace_content(&values(vec![("items", insert)])).unwrap();

    assert_eq!(
        reopen(&doc).paragraph_texts(),
        vec!["Items:", "Item", "Qty", "", "end"]
    );
}

#[test]
fn test_insert_keeps_paragraph_with_text() {
    let mut doc = DocxDocument::new();
    doc.append_paragraph("Note: ${extra}");
    let insert = Replacement::insert(|ctx| {
        ctx.add_run("added");
        Ok(())
    });
    doc.replace_content(&values(vec![("extra", insert)])).unwrap();
    assert_eq!(doc.paragraph_texts(), vec!["Note: added"]);
}

#[test]
fn test_insert_error_propagates() {
    let mut doc = DocxDocument::new();
    doc.append_paragraph("${boom}");
    let insert = Replacement::insert(|_| Err(OfficeError::Docx("boom".to_string())));
    let result = doc.replace_content(&values(vec![("boom", insert)]));
    assert!(matches!(result, Err(OfficeError::Docx(msg)) if msg == "boom"));
}

#[test]
fn test_insert_in_table_cell_keeps_cell_paragraph() {
    let mut doc = DocxDocument::new();
    doc.append_table(&[vec!["a".to_string(), "${x}".to_string()]]);
    let noop = Replacement::insert(|_| Ok(()));
    doc.replace_content(&values(vec![("x", noop)])).unwrap();

    let doc = reopen(&doc);
    assert_eq!(doc.paragraph_texts(), vec!["a", "", ""]);

    let xml = document_xml(&doc);
    let cells: Vec<&str> = xml
        .split("<w:tc>")
        .skip(1)
        .map(|rest| rest.split("</w:tc>").next().unwrap())
        .collect();
    assert_eq!(cells.len(), 2);
    assert!(cells.iter().all(|cell| cell.contains("<w:p")));
}

const WRAPPED_RUNS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId9"><w:r><w:t>${li</w:t></w:r><w:r><w:t>nk}</w:t></w:r></w:hyperlink><w:r><w:t xml:space="preserve"> now</w:t></w:r></w:p><w:p><w:ins w:id="1" w:author="ann" w:date="2024-01-01T00:00:00Z"><w:r><w:t>Signed: ${who}</w:t></w:r></w:ins></w:p><w:sectPr/></w:body></w:document>"#;

fn wrapped_runs_document() -> DocxDocument {
    let mut package = DocxPackage::from_bytes(&DocxDocument::new().to_bytes().unwrap()).unwrap();
    package.set_part("word/document.xml", WRAPPED_RUNS_XML.as_bytes().to_vec());
    DocxDocument::from_bytes(&package.to_bytes().unwrap()).unwrap()
}

fn document_xml(doc: &DocxDocument) -> String {
    let package = DocxPackage::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    String::from_utf8(package.part("word/document.xml").unwrap().to_vec()).unwrap()
}

#[test]
fn test_placeholders_inside_hyperlink_and_insertion() {
    let mut doc = wrapped_runs_document();
    let names: Vec<String> = doc.placeholders().into_iter().collect();
    assert_eq!(names, vec!["link", "who"]);

    doc.replace_content(&values(vec![
        ("link", "the docs".into()),
        ("who", "Ann".into()),
    ]))
    .unwrap();

    let doc = reopen(&doc);
    assert_eq!(doc.paragraph_texts(), vec!["See the docs now", "Signed: Ann"]);
    let xml = document_xml(&doc);
    let link = xml.split("<w:hyperlink").nth(1).unwrap();
    assert!(link.split("</w:hyperlink>").next().unwrap().contains("the docs"));
    assert!(xml.contains("<w:ins"));
}

// ═══════════════════════════════════════════════════════════════════════════
// PAGES AND FILES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_landscape_section_sizes_new_tables() {
    let mut doc = DocxDocument::new();
    doc.append_paragraph("portrait page");
    doc.set_page_size(A4_HEIGHT, A4_WIDTH);
    doc.append_table(&[vec!["a".to_string(), "b".to_string()]]);

    let doc = reopen(&doc);
    assert_eq!(doc.page_size(), (A4_HEIGHT, A4_WIDTH));
    let xml = String::from_utf8(
        DocxPackage::from_bytes(&doc.to_bytes().unwrap())
            .unwrap()
            .part("word/document.xml")
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(xml.contains(&format!("<w:gridCol w:w=\"{}\"/>", A4_HEIGHT / 2)));
    assert_eq!(xml.matches("<w:sectPr>").count(), 2);
}

#[test]
fn test_save_and_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("letter.docx");
    let mut doc = DocxDocument::new();
    doc.append_paragraph("Hello ${who}");
    doc.save(&path).unwrap();

    let mut opened = DocxDocument::open(&path).unwrap();
    opened
        .replace_content(&values(vec![("who", "world".into())]))
        .unwrap();
    assert_eq!(opened.paragraph_texts(), vec!["Hello world"]);
}

#[test]
fn test_open_rejects_non_docx() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fake.docx");
    std::fs::write(&path, b"not a zip").unwrap();
    assert!(matches!(DocxDocument::open(&path), Err(OfficeError::Zip(_))));

    let mut package = DocxPackage::new();
    package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
    let bytes = package.to_bytes().unwrap();
    assert!(matches!(DocxDocument::from_bytes(&bytes), Err(OfficeError::Docx(_))));
}
