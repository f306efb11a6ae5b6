use axum::response::Response;

use crate::{draft::DraftUnitWithQuantity, Resp};

use super::{collection::Collection, UnitDatabase, UnitFilters};

/// Query string of a unit search. Faction and expansion lists are comma
/// separated.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitQuery {
    search: String,
    faction: String,
    expansion: String,
    #[serde(rename = "type")]
    unit_type: String,
    min_points: String,
    max_points: String,
}

fn list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<UnitQuery> for UnitFilters {
    fn from(query: UnitQuery) -> Self {
        UnitFilters {
            factions: list(&query.faction),
            expansions: list(&query.expansion),
            unit_type: query.unit_type,
            min_points: query.min_points,
            max_points: query.max_points,
            search: query.search,
        }
    }
}

pub fn handle_search(units: &UnitDatabase, query: UnitQuery) -> Response<String> {
    let filters = UnitFilters::from(query);
    Resp::json(&units.search(&filters))
}

pub fn handle_get(units: &UnitDatabase, id: &str) -> Response<String> {
    match units.get(id) {
        Some(unit) => Resp::json(unit),
        None => Resp::e404(format!("No unit with id {id}.")),
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionImport {
    collection: Collection,
    draft_pool: Vec<DraftUnitWithQuantity>,
}

/// Parse an uploaded collection file, returning it along with the pool it
/// would give a draft. An optional `filters` field narrows the pool.
pub async fn handle_collection_import(mut data: axum::extract::Multipart) -> Response<String> {
    let mut collection = None;
    let mut filters = UnitFilters::default();
    while let Ok(Some(field)) = data.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Resp::e500(e),
        };

        match field_name.as_str() {
            "collection" => match Collection::import(&bytes) {
                Ok(c) => collection = Some(c),
                Err(e) => return Resp::e422(e),
            },
            "filters" => match serde_json::from_slice(&bytes) {
                Ok(f) => filters = f,
                Err(e) => return Resp::e422(format!("Invalid unit filters: {e}")),
            },
            _ => {}
        }
    }

    let Some(collection) = collection else {
        return Resp::e422("No collection file provided.");
    };
    tracing::debug!(
        "Imported collection with {} owned and {} wanted units.",
        collection.have.len(),
        collection.want.len()
    );

    Resp::json(&CollectionImport {
        draft_pool: collection.draft_pool(&filters),
        collection,
    })
}

/// Write a collection out in the current file format.
pub fn handle_collection_export(collection: Collection) -> Response<String> {
    Resp::json(&collection.export())
}
