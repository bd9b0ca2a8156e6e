//! Indicator dataset models

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::collections::HashMap;

/// Sector lookup table: request name to physical table
const SECTOR_TABLES: &[(&str, &str)] = &[
    ("Education", "education_data"),
    ("Agriculture", "agriculture_data"),
    ("Economic", "economic_data"),
];

/// The three indicator dataset sectors, each backed by its own
/// structurally identical table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    Education,
    Agriculture,
    Economic,
}

impl Sector {
    pub fn all() -> [Sector; 3] {
        [Sector::Education, Sector::Agriculture, Sector::Economic]
    }

    pub fn from_name(name: &str) -> Option<Sector> {
        match name {
            "Education" => Some(Sector::Education),
            "Agriculture" => Some(Sector::Agriculture),
            "Economic" => Some(Sector::Economic),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Sector::Education => SECTOR_TABLES[0].1,
            Sector::Agriculture => SECTOR_TABLES[1].1,
            Sector::Economic => SECTOR_TABLES[2].1,
        }
    }
}

/// Columns accepted as equality filters in query-data requests.
/// The opaque `filters` blob column is deliberately absent.
pub const FILTERABLE_COLUMNS: &[&str] = &[
    "province",
    "series_name",
    "indicator_value",
    "indicator",
    "year",
    "series_code",
    "subsector_1",
    "subsector_2",
    "source",
    "latitude",
    "longitude",
    "indicator_unit",
    "tag",
];

/// One long-format indicator row, identical across the three sector tables
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct IndicatorRecord {
    pub id: i64,
    pub province: Option<String>,
    pub series_name: Option<String>,
    pub indicator_value: Option<f64>,
    pub indicator: Option<String>,
    pub year: Option<String>,
    pub series_code: Option<String>,
    pub sector: Option<String>,
    pub subsector_1: Option<String>,
    pub subsector_2: Option<String>,
    pub source: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub indicator_unit: Option<String>,
    pub tag: Option<String>,
    pub filters: Option<String>,
}

impl IndicatorRecord {
    /// Flatten the row into an output map, merging the JSON-encoded
    /// extra-filters blob over the fixed columns
    pub fn expand(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("id".to_string(), Value::from(self.id));
        out.insert("province".to_string(), opt_str(&self.province));
        out.insert("series_name".to_string(), opt_str(&self.series_name));
        out.insert(
            "indicator_value".to_string(),
            self.indicator_value.map(Value::from).unwrap_or(Value::Null),
        );
        out.insert("indicator".to_string(), opt_str(&self.indicator));
        out.insert("year".to_string(), opt_str(&self.year));
        out.insert("series_code".to_string(), opt_str(&self.series_code));
        out.insert("sector".to_string(), opt_str(&self.sector));
        out.insert("subsector_1".to_string(), opt_str(&self.subsector_1));
        out.insert("subsector_2".to_string(), opt_str(&self.subsector_2));
        out.insert("source".to_string(), opt_str(&self.source));
        out.insert("latitude".to_string(), opt_str(&self.latitude));
        out.insert("longitude".to_string(), opt_str(&self.longitude));
        out.insert("indicator_unit".to_string(), opt_str(&self.indicator_unit));
        out.insert("tag".to_string(), opt_str(&self.tag));

        // Malformed blobs are ignored rather than failing the whole query
        if let Some(blob) = &self.filters {
            if let Ok(Value::Object(extra)) = serde_json::from_str::<Value>(blob) {
                for (key, value) in extra {
                    out.insert(key, value);
                }
            }
        }

        out
    }
}

fn opt_str(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

/// sector -> subsector_1 -> series names
pub type Menu = HashMap<String, HashMap<String, Vec<String>>>;

/// Flat data-explorer entry
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesEntry {
    pub series_name: String,
    pub sector: String,
}
