use thiserror::Error;

pub type OfficeResult<T> = Result<T, OfficeError>;

#[derive(Error, Debug)]
pub enum OfficeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("No value mapping for '{value}' in column '{header}'")]
    UnmappedValue { header: String, value: String },

    #[error("Header schema error: {0}")]
    Schema(String),

    #[error("Excel export error: {0}")]
    Export(String),

    #[error("Excel import error: {0}")]
    Import(String),

    #[error("Docx error: {0}")]
    Docx(String),

    #[error("XML error: {0}")]
    Xml(String),
}

/// Wrap any displayable XML-layer failure
pub(crate) fn xml_err(e: impl std::fmt::Display) -> OfficeError {
    OfficeError::Xml(e.to_string())
}
