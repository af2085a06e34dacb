//! Record ↔ column mapping
//!
//! A record type declares one [`ExcelHeader`] per mapped field. The resolved,
//! ordered [`HeaderSchema`] is built once per type and cached process-wide.

use crate::error::{OfficeError, OfficeResult};
use dashmap::DashMap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Display value (as shown in the sheet) → stored value
pub type ValueMap = IndexMap<String, String>;

static SCHEMA_CACHE: Lazy<DashMap<TypeId, Arc<HeaderSchema>>> = Lazy::new(DashMap::new);

//==============================================================================
// ExcelHeader
//==============================================================================

/// How one record field maps to one spreadsheet column
#[derive(Debug, Clone)]
pub struct ExcelHeader {
    /// Field identifier handed to [`ExcelRecord::set_field`]
    pub field: String,
    /// Column title
    pub name: String,
    pub order: i32,
    pub hidden: bool,
    pub value_map: ValueMap,
    pub value_map_provider: Option<fn() -> ValueMap>,
    pub default_values: Vec<String>,
    pub default_values_provider: Option<fn() -> Vec<String>>,
}

impl ExcelHeader {
    pub fn new(field: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            name: name.into(),
            order: i32::MAX,
            hidden: false,
            value_map: ValueMap::new(),
            value_map_provider: None,
            default_values: Vec::new(),
            default_values_provider: None,
        }
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Import translates display → stored; template export offers the display values as a dropdown
    pub fn value_map<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.value_map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn value_map_provider(mut self, provider: fn() -> ValueMap) -> Self {
        self.value_map_provider = Some(provider);
        self
    }

    /// Values laid out below the header in an exported template
    pub fn default_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_values_provider(mut self, provider: fn() -> Vec<String>) -> Self {
        self.default_values_provider = Some(provider);
        self
    }

    /// Explicit pairs win over the provider; `None` when neither yields anything
    pub fn resolved_value_map(&self) -> Option<ValueMap> {
        if !self.value_map.is_empty() {
            return Some(self.value_map.clone());
        }
        self.value_map_provider
            .map(|provider| provider())
            .filter(|map| !map.is_empty())
    }

    /// Explicit values win over the provider
    pub fn resolved_default_values(&self) -> Vec<String> {
        if !self.default_values.is_empty() {
            return self.default_values.clone();
        }
        self.default_values_provider
            .map(|provider| provider())
            .unwrap_or_default()
    }
}

//==============================================================================
// ExcelRecord
//==============================================================================

/// A type that can be imported from, or exported as a template to, a sheet
pub trait ExcelRecord: Default + 'static {
    /// Declared column mapping
    fn headers() -> Vec<ExcelHeader>;

    /// Assign the cell text (already value-mapped) to `field`
    fn set_field(&mut self, field: &str, value: &str) -> OfficeResult<()>;
}

//==============================================================================
// HeaderSchema
//==============================================================================

/// Resolved header list of one record type, in column order
#[derive(Debug)]
pub struct HeaderSchema {
    headers: Vec<ExcelHeader>,
    by_name: HashMap<String, usize>,
}

impl HeaderSchema {
    /// Validate and order `headers`.
    ///
    /// Blank names are ignored, duplicate names are an error, equal orders keep declaration order.
    pub fn build(headers: Vec<ExcelHeader>) -> OfficeResult<Self> {
        let mut headers: Vec<ExcelHeader> = headers
            .into_iter()
            .filter(|h| !h.name.trim().is_empty())
            .collect();
        headers.sort_by_key(|h| h.order);

        let mut by_name = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            if by_name.insert(header.name.clone(), idx).is_some() {
                return Err(OfficeError::Schema(format!(
                    "Duplicate header name '{}'",
                    header.name
                )));
            }
        }

        Ok(Self { headers, by_name })
    }

    /// Cached schema of `T`
    pub fn of<T: ExcelRecord>() -> OfficeResult<Arc<HeaderSchema>> {
        let id = TypeId::of::<T>();
        if let Some(cached) = SCHEMA_CACHE.get(&id) {
            return Ok(Arc::clone(cached.value()));
        }

        let schema = Arc::new(Self::build(T::headers())?);
        tracing::debug!(
            record = std::any::type_name::<T>(),
            headers = schema.headers.len(),
            "header schema cached"
        );
        Ok(Arc::clone(
            SCHEMA_CACHE.entry(id).or_insert(schema).value(),
        ))
    }

    pub fn headers(&self) -> &[ExcelHeader] {
        &self.headers
    }

    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.name.as_str()).collect()
    }

    pub fn header(&self, name: &str) -> Option<&ExcelHeader> {
        self.by_name.get(name).map(|&idx| &self.headers[idx])
    }

    pub fn field_for(&self, name: &str) -> Option<&str> {
        self.header(name).map(|h| h.field.as_str())
    }

    /// Header name → value map, for headers that declare one
    pub fn header_options(&self) -> IndexMap<String, ValueMap> {
        self.headers
            .iter()
            .filter_map(|h| h.resolved_value_map().map(|map| (h.name.clone(), map)))
            .collect()
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.header(name).is_some_and(|h| h.hidden)
    }

    pub fn column_default_values(&self, name: &str) -> Vec<String> {
        self.header(name)
            .map(ExcelHeader::resolved_default_values)
            .unwrap_or_default()
    }
}

/// Set the field mapped to `header_name`; unknown headers are ignored
pub fn set_value<T: ExcelRecord>(record: &mut T, header_name: &str, text: &str) -> OfficeResult<()> {
    let schema = HeaderSchema::of::<T>()?;
    match schema.field_for(header_name) {
        Some(field) => record.set_field(field, text),
        None => Ok(()),
    }
}
