use crate::core::dates;
use crate::docx::{DocxDocument, DocxImage, Replacement, Replacements};
use crate::error::{OfficeError, OfficeResult};
use crate::excel::{ExcelExporter, ExcelImporter, RowMap};
use crate::files;
use crate::types::{CellValue, SheetData};
use colored::Colorize;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Image size used when a value file gives none, in points
const DEFAULT_IMAGE_SIZE: u32 = 100;

/// Data file accepted by `export`
#[derive(Debug, Deserialize)]
pub struct ExportFile {
    pub sheets: Vec<SheetSpec>,
}

#[derive(Debug, Deserialize)]
pub struct SheetSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hidden_columns: Vec<u16>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

/// Execute the import command
pub fn import(
    input: PathBuf,
    sheets: Vec<usize>,
    skip_rows: Vec<u32>,
    skip_columns: Vec<u32>,
    output: Option<PathBuf>,
    verbose: bool,
) -> OfficeResult<()> {
    // without an output file stdout carries only the rows
    let status = |line: String| {
        if output.is_some() {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    };
    status("📄 officekit - Excel Import".bold().green().to_string());
    status(format!("   Input:  {}", input.display()));

    let mut importer = ExcelImporter::open(&input)?;
    if verbose {
        status(format!("   Sheets: {}", importer.sheet_names().join(", ").cyan()));
    }

    let walk = if sheets.is_empty() { vec![0] } else { sheets };
    for &sheet in &walk {
        importer = importer
            .skip_rows(sheet, skip_rows.iter().copied())
            .skip_columns(sheet, skip_columns.iter().copied());
    }
    let rows = importer.walk_sheets(walk).convert_to_map()?;
    status(format!("   Rows:   {}\n", rows.len().to_string().bold()));

    match output {
        Some(path) => {
            fs::write(&path, render_rows(&rows, &path)?)?;
            println!("{}", "✅ Import Complete!".bold().green());
            println!("   Output: {}\n", path.display());
        }
        None => print!("{}", serde_yaml::to_string(&rows)?),
    }

    Ok(())
}

/// JSON for `.json` outputs, YAML otherwise
fn render_rows(rows: &[RowMap], path: &Path) -> OfficeResult<String> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::to_string_pretty(rows)?)
    } else {
        Ok(serde_yaml::to_string(rows)?)
    }
}

/// Execute the export command
pub fn export(input: PathBuf, output: PathBuf, autosize: bool, verbose: bool) -> OfficeResult<()> {
    println!("{}", "📄 officekit - Excel Export".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", output.display());

    // JSON is valid YAML, one parser serves both
    let content = fs::read_to_string(&input)?;
    let file: ExportFile = serde_yaml::from_str(&content)?;
    if file.sheets.is_empty() {
        return Err(OfficeError::Export(format!(
            "'{}' declares no sheets",
            input.display()
        )));
    }

    let mut names = Vec::with_capacity(file.sheets.len());
    let mut data_set = Vec::with_capacity(file.sheets.len());
    let mut hidden = Vec::with_capacity(file.sheets.len());
    for (index, sheet) in file.sheets.into_iter().enumerate() {
        let name = sheet.name.unwrap_or_else(|| format!("Sheet{}", index + 1));
        if verbose {
            println!("   📊 Sheet: {} ({} rows)", name.bright_blue(), sheet.rows.len());
        }
        let rows: SheetData = sheet
            .rows
            .iter()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();
        names.push(name);
        data_set.push(rows);
        hidden.push(sheet.hidden_columns);
    }

    let mut exporter = ExcelExporter::new()
        .data_set(data_set)
        .sheet_names(names)
        .auto_resize_column_width(autosize);
    for (index, columns) in hidden.into_iter().enumerate() {
        if !columns.is_empty() {
            exporter = exporter.hidden_columns(index, columns);
        }
    }
    exporter.export_to(&output)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   Excel file: {}\n", output.display());
    Ok(())
}

/// Execute the fill command
pub fn fill(template: PathBuf, values: PathBuf, output: PathBuf, verbose: bool) -> OfficeResult<()> {
    println!("{}", "📄 officekit - Fill Template".bold().green());
    println!("   Template: {}", template.display());
    println!("   Values:   {}", values.display());
    println!("   Output:   {}\n", output.display());

    let content = fs::read_to_string(&values)?;
    let raw: IndexMap<String, Value> = serde_yaml::from_str(&content)?;
    let base_dir = values.parent().unwrap_or_else(|| Path::new("."));

    let mut replacements = Replacements::new();
    for (name, value) in raw {
        let replacement = to_replacement(&name, value, base_dir)?;
        replacements.insert(name, replacement);
    }

    let mut document = DocxDocument::open(&template)?;
    let found = document.placeholders();
    for name in &found {
        match replacements.get(name) {
            Some(replacement) if verbose => println!("   {} {} → {:?}", "✓".green(), name.cyan(), replacement),
            Some(_) => {}
            None => println!("   {} {} has no value", "⚠️".yellow(), name.yellow()),
        }
    }
    for name in replacements.keys().filter(|name| !found.contains(*name)) {
        tracing::warn!(placeholder = %name, "value has no placeholder in template");
    }

    document.replace_content(&replacements)?;
    document.save(&output)?;

    println!("{}", "✅ Template filled!".bold().green());
    println!("   Document: {}\n", output.display());
    Ok(())
}

/// Map one value-file entry to its replacement.
///
/// - scalars become text
/// - `{image, width, height}` loads an image relative to the value file
/// - `{table: [[..]]}` or a list of lists inserts a table
fn to_replacement(name: &str, value: Value, base_dir: &Path) -> OfficeResult<Replacement> {
    match value {
        Value::Mapping(map) => {
            if let Some(image) = map.get("image") {
                let path = image.as_str().ok_or_else(|| {
                    OfficeError::Conversion(format!("'{}': image must be a path", name))
                })?;
                let path = base_dir.join(path);
                let size = |key: &str| -> OfficeResult<u32> {
                    match map.get(key) {
                        None => Ok(DEFAULT_IMAGE_SIZE),
                        Some(value) => value
                            .as_u64()
                            .and_then(|v| u32::try_from(v).ok())
                            .ok_or_else(|| {
                                OfficeError::Conversion(format!(
                                    "'{}': image {} must be a whole number of points, got {:?}",
                                    name, key, value
                                ))
                            }),
                    }
                };
                let image = DocxImage::new(files::read_bytes(&path)?, size("width")?, size("height")?)?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.to_string());
                Ok(Replacement::Image(image.with_name(file_name)))
            } else if let Some(table) = map.get("table") {
                let rows = table.as_sequence().ok_or_else(|| {
                    OfficeError::Conversion(format!("'{}': table must be a list of rows", name))
                })?;
                table_replacement(name, rows)
            } else {
                Err(OfficeError::Conversion(format!(
                    "'{}': mapping needs an 'image' or 'table' key",
                    name
                )))
            }
        }
        Value::Sequence(items) if items.iter().all(Value::is_sequence) => {
            table_replacement(name, &items)
        }
        Value::Sequence(items) => {
            let texts: Vec<String> = items
                .iter()
                .filter_map(|item| CellValue::from(item).to_text())
                .collect();
            Ok(Replacement::Text(texts.join(", ")))
        }
        other => Ok(Replacement::Text(
            CellValue::from(&other).to_text().unwrap_or_default(),
        )),
    }
}

fn table_replacement(name: &str, table: &[Value]) -> OfficeResult<Replacement> {
    let rows = table
        .iter()
        .map(|row| {
            row.as_sequence()
                .map(|cells| {
                    cells
                        .iter()
                        .map(|cell| CellValue::from(cell).to_text().unwrap_or_default())
                        .collect::<Vec<String>>()
                })
                .ok_or_else(|| {
                    OfficeError::Conversion(format!("'{}': every table row must be a list", name))
                })
        })
        .collect::<OfficeResult<Vec<_>>>()?;

    Ok(Replacement::insert(move |ctx| {
        ctx.insert_table(&rows);
        Ok(())
    }))
}

/// Execute the placeholders command
pub fn placeholders(template: PathBuf) -> OfficeResult<()> {
    println!("{}", "📄 officekit - Placeholders".bold().green());
    println!("   Template: {}\n", template.display());

    let document = DocxDocument::open(&template)?;
    let names = document.placeholders();
    if names.is_empty() {
        println!("{}", "⚠️  No placeholders found".yellow());
        return Ok(());
    }
    for name in &names {
        println!("   ${{{}}}", name.bright_blue());
    }
    println!("\n   {} placeholder(s)", names.len().to_string().bold());
    Ok(())
}

/// Execute the dates command
pub fn dates(start: String, end: String, monthly: bool) -> OfficeResult<()> {
    let range = if monthly {
        dates::gen_month_range_str(&start, &end)?
    } else {
        dates::gen_date_range_str(&start, &end)?
    };
    if range.is_empty() {
        println!("{}", "⚠️  Start is after end, range is empty".yellow());
    }
    for day in range {
        println!("{}", day);
    }
    Ok(())
}
