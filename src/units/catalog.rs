use std::path::Path;

use bytes::Buf;
use serde::de::DeserializeOwned;

use crate::{units::Unit, Res};

const PAGE_SIZE: u32 = 100;
const CACHE_FILE: &str = "units.json";

async fn get_bytes(uri: &str) -> Res<bytes::Bytes> {
    reqwest::get(uri)
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?
        .bytes()
        .await
        .map_err(|e| e.to_string())
}

pub fn decode_json<T: DeserializeOwned>(bytes: bytes::Bytes) -> Res<T> {
    serde_json::de::from_reader(bytes.reader()).map_err(|e| e.to_string())
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    total_pages: u32,
}

#[derive(serde::Deserialize, Debug)]
struct UnitPage {
    units: Vec<Unit>,
    pagination: Pagination,
}

fn page_uri(base: &str, page: u32) -> String {
    format!(
        "{}/units?page={page}&limit={PAGE_SIZE}",
        base.trim_end_matches('/')
    )
}

/// Fetch every page of the catalog. The first page reports how many more
/// there are.
async fn download_units(base: &str) -> Res<Vec<Unit>> {
    let first: UnitPage = decode_json(get_bytes(&page_uri(base, 1)).await?)?;
    let mut units = first.units;

    if first.pagination.total_pages > 1 {
        tracing::debug!(
            "Fetching {} additional catalog pages.",
            first.pagination.total_pages - 1
        );
        let pages = (2..=first.pagination.total_pages).map(|page| {
            let uri = page_uri(base, page);
            async move { decode_json::<UnitPage>(get_bytes(&uri).await?) }
        });
        for page in futures_util::future::join_all(pages).await {
            units.extend(page?.units);
        }
    }

    Ok(units)
}

/// Load the unit catalog from the data directory, downloading it first if it
/// has not been cached yet. In offline mode a missing cache yields no units.
pub async fn load_units(data: &Path, api_base_url: &str, offline: bool) -> Res<Vec<Unit>> {
    tracing::debug!("Loading unit catalog.");

    tokio::fs::create_dir_all(data)
        .await
        .map_err(|e| e.to_string())?;
    let file = data.join(CACHE_FILE);

    if !file.exists() {
        if offline {
            tracing::warn!("No cached catalog at {} and offline.", file.display());
            return Ok(Vec::new());
        }

        tracing::debug!("Catalog not cached, downloading to {}", file.display());
        let units = download_units(api_base_url).await?;
        let raw = serde_json::to_vec(&units).map_err(|e| e.to_string())?;
        tokio::fs::write(&file, raw)
            .await
            .map_err(|e| e.to_string())?;
        tracing::debug!("Successfully downloaded {} units.", units.len());
        return Ok(units);
    }

    let raw = tokio::fs::read(&file).await.map_err(|e| e.to_string())?;
    tracing::debug!("Read catalog from disk. Parsing JSON.");
    decode_json(bytes::Bytes::from(raw))
}
