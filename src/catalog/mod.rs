//! Column metadata and the filter definitions derived from it.

use crate::errors::FetchError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
}

/// Value types the rule builder knows how to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    String,
    Integer,
    Double,
    Date,
    Time,
    Datetime,
    Boolean,
}

impl FilterType {
    pub const ALL: [FilterType; 7] = [
        FilterType::String,
        FilterType::Integer,
        FilterType::Double,
        FilterType::Date,
        FilterType::Time,
        FilterType::Datetime,
        FilterType::Boolean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::String => "string",
            FilterType::Integer => "integer",
            FilterType::Double => "double",
            FilterType::Date => "date",
            FilterType::Time => "time",
            FilterType::Datetime => "datetime",
            FilterType::Boolean => "boolean",
        }
    }
}

/// Source type names that are renamed before the pass-through check.
const TYPE_OVERRIDES: &[(&str, FilterType)] = &[("double precision", FilterType::Double)];

/// Map a backend column type onto a rule-builder type: exact override
/// first, then pass-through of names the builder already knows, else
/// `string`.
pub fn map_data_type(data_type: &str) -> FilterType {
    if let Some((_, mapped)) = TYPE_OVERRIDES.iter().find(|(name, _)| *name == data_type) {
        return *mapped;
    }
    FilterType::ALL
        .iter()
        .copied()
        .find(|t| t.as_str() == data_type)
        .unwrap_or(FilterType::String)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
}

impl From<&ColumnDescriptor> for FilterDefinition {
    fn from(column: &ColumnDescriptor) -> Self {
        FilterDefinition {
            id: column.name.clone(),
            filter_type: map_data_type(&column.data_type),
        }
    }
}

/// Parse the columns endpoint body: an object keyed by column name whose
/// values carry at least `data_type`. Key order is kept.
pub fn parse_columns(body: &str) -> Result<Vec<ColumnDescriptor>, FetchError> {
    let object: Map<String, Value> = serde_json::from_str(body)?;
    object
        .into_iter()
        .map(|(name, meta)| {
            let data_type = meta
                .get("data_type")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    FetchError::ParseError(format!("column '{}' has no data_type", name))
                })?
                .to_string();
            Ok(ColumnDescriptor { name, data_type })
        })
        .collect()
}
