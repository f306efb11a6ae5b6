use std::{collections::HashSet, fmt::Display};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::draft::DraftUnitWithQuantity;

use super::{Unit, UnitFilters};

pub const EXPORT_VERSION: &str = "2.0";

fn one() -> u32 {
    1
}

/// A unit in a have or want list.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OwnedUnit {
    #[serde(flatten)]
    pub unit: Unit,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Collection {
    pub have: Vec<OwnedUnit>,
    pub want: Vec<OwnedUnit>,
}

#[derive(Debug, PartialEq)]
pub enum ImportError {
    /// Not JSON at all.
    Syntax(String),
    /// JSON, but none of the known collection layouts.
    UnknownFormat,
    /// A known layout with entries that could not be read.
    BadEntry(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Syntax(e) => write!(f, "File is not valid JSON: {e}"),
            ImportError::UnknownFormat => write!(
                f,
                "Unrecognised collection file. Expected a version 2.0 export, a version 1.0 {{\"collection\": [...]}} export or a list of units."
            ),
            ImportError::BadEntry(e) => write!(f, "Invalid unit in collection: {e}"),
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub have_units: usize,
    pub want_units: usize,
    pub have_points: u64,
    pub want_points: u64,
    pub unique_have_types: usize,
    pub unique_want_types: usize,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionExport {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub have_collection: Vec<OwnedUnit>,
    pub want_collection: Vec<OwnedUnit>,
    pub summary: CollectionSummary,
}

fn owned_list(value: Value) -> Result<Vec<OwnedUnit>, ImportError> {
    serde_json::from_value(value).map_err(|e| ImportError::BadEntry(e.to_string()))
}

/// Oldest layout: `{<id>: {"unit": {...}, "have": n, "want": n}}`.
fn keyed_lists(map: Map<String, Value>) -> Result<Collection, ImportError> {
    #[derive(serde::Deserialize)]
    struct Entry {
        unit: Unit,
        #[serde(default)]
        have: u32,
        #[serde(default)]
        want: u32,
    }

    let mut collection = Collection::default();
    for (_, value) in map {
        let entry: Entry =
            serde_json::from_value(value).map_err(|e| ImportError::BadEntry(e.to_string()))?;
        if entry.have > 0 {
            collection.have.push(OwnedUnit {
                unit: entry.unit.clone(),
                quantity: entry.have,
            });
        }
        if entry.want > 0 {
            collection.want.push(OwnedUnit {
                unit: entry.unit,
                quantity: entry.want,
            });
        }
    }
    Ok(collection)
}

fn points(units: &[OwnedUnit]) -> u64 {
    units
        .iter()
        .map(|u| u64::from(u.unit.points) * u64::from(u.quantity))
        .fold(0, u64::saturating_add)
}

fn distinct_types(units: &[OwnedUnit]) -> usize {
    units
        .iter()
        .map(|u| u.unit.unit_type.as_str())
        .collect::<HashSet<_>>()
        .len()
}

impl Collection {
    /// Read any collection file written by current or earlier releases.
    /// Layouts holding a single list import it as the have list.
    pub fn import(data: &[u8]) -> Result<Self, ImportError> {
        let value: Value =
            serde_json::from_slice(data).map_err(|e| ImportError::Syntax(e.to_string()))?;

        match value {
            Value::Object(mut map) => {
                let current = map.get("version").and_then(Value::as_str) == Some(EXPORT_VERSION);
                let have = map.get("haveCollection").map_or(false, Value::is_array);
                let want = map.get("wantCollection").map_or(false, Value::is_array);
                if current && have && want {
                    return Ok(Self {
                        have: owned_list(map.remove("haveCollection").unwrap_or_default())?,
                        want: owned_list(map.remove("wantCollection").unwrap_or_default())?,
                    });
                }

                if let Some(list @ Value::Array(_)) = map.remove("collection") {
                    return Ok(Self {
                        have: owned_list(list)?,
                        want: Vec::new(),
                    });
                }

                if !map.is_empty() && map.values().all(|v| v.get("unit").is_some()) {
                    return keyed_lists(map);
                }

                Err(ImportError::UnknownFormat)
            }
            list @ Value::Array(_) => Ok(Self {
                have: owned_list(list)?,
                want: Vec::new(),
            }),
            _ => Err(ImportError::UnknownFormat),
        }
    }

    pub fn export(&self) -> CollectionExport {
        CollectionExport {
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
            have_collection: self.have.clone(),
            want_collection: self.want.clone(),
            summary: CollectionSummary {
                have_units: self.have.len(),
                want_units: self.want.len(),
                have_points: points(&self.have),
                want_points: points(&self.want),
                unique_have_types: distinct_types(&self.have),
                unique_want_types: distinct_types(&self.want),
            },
        }
    }

    /// The owned units as a draft pool, one line per unit id with the copies
    /// summed. Units failing the filters and lines without copies are left
    /// out.
    pub fn draft_pool(&self, filters: &UnitFilters) -> Vec<DraftUnitWithQuantity> {
        let mut pool: Vec<DraftUnitWithQuantity> = Vec::new();
        for owned in &self.have {
            if owned.quantity == 0 || !filters.matches(&owned.unit) {
                continue;
            }
            match pool.iter_mut().find(|e| e.unit.id == owned.unit.id) {
                Some(entry) => entry.quantity = entry.quantity.saturating_add(owned.quantity),
                None => pool.push(DraftUnitWithQuantity {
                    unit: owned.unit.clone(),
                    quantity: owned.quantity,
                }),
            }
        }
        pool
    }
}
