use chrono::{DateTime, Utc};

use crate::units::UnitFilters;

use super::{Draft, DraftSettings, DraftUnitWithQuantity};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMetadata {
    pub total_selected_units: usize,
    pub total_unit_instances: u64,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_name: Option<String>,
}

/// The draft configuration file users exchange: settings plus the unit pool
/// they were applied to.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftConfigDocument {
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    pub version: String,
    pub draft_settings: DraftSettings,
    #[serde(default)]
    pub selected_units: Vec<DraftUnitWithQuantity>,
    #[serde(default)]
    pub use_collection_as_source: bool,
    #[serde(default)]
    pub unit_filters: UnitFilters,
    #[serde(default)]
    pub metadata: Option<ConfigMetadata>,
}

impl DraftConfigDocument {
    fn metadata(
        units: &[DraftUnitWithQuantity],
        source_type: &str,
        draft_name: Option<String>,
    ) -> ConfigMetadata {
        ConfigMetadata {
            total_selected_units: units.len(),
            total_unit_instances: units.iter().map(|u| u64::from(u.quantity)).sum(),
            source_type: source_type.to_string(),
            draft_name,
        }
    }

    /// Export the configuration a stored draft was generated from.
    pub fn from_draft(draft: &Draft) -> Self {
        Self {
            export_date: Some(Utc::now()),
            version: CONFIG_VERSION.to_string(),
            draft_settings: draft.settings.clone(),
            selected_units: draft.available_units.clone(),
            use_collection_as_source: false,
            unit_filters: UnitFilters::default(),
            metadata: Some(Self::metadata(
                &draft.available_units,
                "existing_draft",
                Some(draft.name.clone()),
            )),
        }
    }

    /// Export a configuration still being edited.
    pub fn new(
        settings: DraftSettings,
        selected_units: Vec<DraftUnitWithQuantity>,
        use_collection_as_source: bool,
        unit_filters: UnitFilters,
    ) -> Self {
        let source = if use_collection_as_source {
            "collection"
        } else {
            "api"
        };
        Self {
            export_date: Some(Utc::now()),
            version: CONFIG_VERSION.to_string(),
            metadata: Some(Self::metadata(&selected_units, source, None)),
            draft_settings: settings,
            selected_units,
            use_collection_as_source,
            unit_filters,
        }
    }

    /// Decode a configuration file. Only version 1.0 documents with draft
    /// settings are accepted.
    pub fn decode(data: &[u8]) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        if value.get("version").and_then(|v| v.as_str()) != Some(CONFIG_VERSION)
            || value.get("draftSettings").map_or(true, |s| s.is_null())
        {
            return Err("Not a draft configuration file.".to_string());
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}
