use axum::response::Response;
use rand::rngs::OsRng;

use crate::{units::UnitFilters, Resp};

use super::{
    boosters::generate_draft, config::DraftConfigDocument, store::DraftStore, Draft,
    DraftRequest, DraftSettings, DraftUnitWithQuantity,
};

pub async fn handle_list(store: &DraftStore) -> Response<String> {
    Resp::json(&store.list().await)
}

/// Generate a draft in one go, without pacing, and save it.
pub async fn handle_create(store: &DraftStore, request: DraftRequest) -> Response<String> {
    let results = match generate_draft(&request.available_units, &request.settings, OsRng) {
        Ok(results) => results,
        Err(e) => return Resp::e422(e),
    };

    let draft = request.finish(results);
    if let Err(e) = store.insert(draft.clone()).await {
        return Resp::e500(format!("Failed to save draft: {e}"));
    }
    tracing::info!("Created draft \"{}\" ({}).", draft.name, draft.id);
    Resp::json(&draft)
}

pub async fn handle_delete(store: &DraftStore, id: &str) -> Response<String> {
    match store.delete(id).await {
        Ok(true) => {
            tracing::info!("Deleted draft {id}.");
            Resp::ok("Deleted draft.")
        }
        Ok(false) => Resp::e404(format!("No draft with id {id}.")),
        Err(e) => Resp::e500(e),
    }
}

/// Run a stored draft again with the same settings and pool. The old draft
/// is only replaced once the new one has been generated.
pub async fn handle_regenerate(store: &DraftStore, id: &str) -> Response<String> {
    let Some(old) = store.get(id).await else {
        return Resp::e404(format!("No draft with id {id}."));
    };

    let results = match generate_draft(&old.available_units, &old.settings, OsRng) {
        Ok(results) => results,
        Err(e) => return Resp::e422(e),
    };

    let draft = Draft::create(
        old.name,
        old.description,
        old.settings,
        old.available_units,
        results,
    );
    match store.replace(id, draft.clone()).await {
        Ok(true) => {
            tracing::info!("Regenerated draft {id} as {}.", draft.id);
            Resp::json(&draft)
        }
        Ok(false) => Resp::e404(format!("No draft with id {id}.")),
        Err(e) => Resp::e500(e),
    }
}

pub async fn handle_config_export(store: &DraftStore, id: &str) -> Response<String> {
    match store.get(id).await {
        Some(draft) => Resp::json(&DraftConfigDocument::from_draft(&draft)),
        None => Resp::e404(format!("No draft with id {id}.")),
    }
}

/// A draft configuration still being edited, to be written out as a file.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigExportRequest {
    #[serde(default)]
    draft_settings: DraftSettings,
    #[serde(default)]
    selected_units: Vec<DraftUnitWithQuantity>,
    #[serde(default)]
    use_collection_as_source: bool,
    #[serde(default)]
    unit_filters: UnitFilters,
}

pub fn handle_working_config_export(request: ConfigExportRequest) -> Response<String> {
    Resp::json(&DraftConfigDocument::new(
        request.draft_settings,
        request.selected_units,
        request.use_collection_as_source,
        request.unit_filters,
    ))
}

pub async fn handle_config_import(mut data: axum::extract::Multipart) -> Response<String> {
    while let Ok(Some(field)) = data.next_field().await {
        if field.name() != Some("config") {
            continue;
        }

        return match field.bytes().await {
            Ok(bytes) => match DraftConfigDocument::decode(&bytes) {
                Ok(doc) => Resp::json(&doc),
                Err(e) => Resp::e422(format!("Failed to load draft configuration: {e}")),
            },
            Err(e) => Resp::e500(e),
        };
    }

    Resp::e422("No draft configuration file provided.")
}

#[cfg(test)]
mod test {
    use crate::{
        draft::{store::DraftStore, DraftRequest, DraftSettings, DraftUnitWithQuantity},
        units::Unit,
    };

    use super::*;

    async fn store() -> (DraftStore, std::path::PathBuf) {
        let dir = std::env::temp_dir()
            .join(format!("dialdraft-handlers-{}", uuid::Uuid::new_v4()));
        (DraftStore::load(&dir).await.unwrap(), dir)
    }

    fn request(quantity: u32) -> DraftRequest {
        DraftRequest {
            name: "Friday".to_string(),
            description: Some("  ".to_string()),
            settings: DraftSettings::default(),
            available_units: vec![
                DraftUnitWithQuantity {
                    unit: Unit::sample("Infantry", 20),
                    quantity,
                },
                DraftUnitWithQuantity {
                    unit: Unit::sample("Mech", 100),
                    quantity,
                },
            ],
        }
    }

    fn body(resp: &Response<String>) -> serde_json::Value {
        serde_json::from_str(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let (store, dir) = store().await;

        let resp = handle_create(&store, request(6)).await;
        assert_eq!(resp.status(), 200);
        let draft = body(&resp);
        assert_eq!(draft["name"], "Friday");
        assert!(draft.get("description").is_none());
        assert_eq!(draft["results"].as_array().unwrap().len(), 2);
        assert_eq!(store.list().await.len(), 1);

        let id = draft["id"].as_str().unwrap().to_string();
        let config = body(&handle_config_export(&store, &id).await);
        assert_eq!(config["version"], "1.0");
        assert_eq!(config["metadata"]["draftName"], "Friday");
        assert_eq!(config["metadata"]["totalUnitInstances"], 12);

        assert_eq!(handle_delete(&store, &id).await.status(), 200);
        assert_eq!(handle_delete(&store, &id).await.status(), 404);
        assert!(store.list().await.is_empty());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_create_rejects_empty_pool() {
        let (store, dir) = store().await;
        let resp = handle_create(&store, request(0)).await;
        assert_eq!(resp.status(), 422);
        assert_eq!(body(&resp)["success"], false);
        assert!(store.list().await.is_empty());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_draft() {
        let (store, dir) = store().await;

        let mut players = request(6);
        players.settings.number_of_players = 4_000_000_000;
        assert_eq!(handle_create(&store, players).await.status(), 422);

        let resp = handle_create(&store, request(u32::MAX)).await;
        assert_eq!(resp.status(), 422);
        assert_eq!(
            body(&resp)["message"],
            "A draft pool can hold at most 100000 units."
        );
        assert!(store.list().await.is_empty());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_regenerate() {
        let (store, dir) = store().await;
        let first = body(&handle_create(&store, request(6)).await);
        let old_id = first["id"].as_str().unwrap().to_string();

        let resp = handle_regenerate(&store, &old_id).await;
        assert_eq!(resp.status(), 200);
        let second = body(&resp);
        assert_ne!(second["id"], first["id"]);
        assert_eq!(second["settings"], first["settings"]);
        assert_eq!(second["availableUnits"], first["availableUnits"]);

        let drafts = store.list().await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, second["id"].as_str().unwrap());
        assert_eq!(handle_regenerate(&store, &old_id).await.status(), 404);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_failed_regenerate_keeps_draft() {
        let (store, dir) = store().await;
        // Saved before pools were stored, so there is nothing to redraft from.
        let legacy = Draft::create(
            "Old".to_string(),
            None,
            DraftSettings::default(),
            Vec::new(),
            Vec::new(),
        );
        store.insert(legacy.clone()).await.unwrap();

        assert_eq!(handle_regenerate(&store, &legacy.id).await.status(), 422);
        assert_eq!(store.list().await, vec![legacy]);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_regenerate_save_failure() {
        let (store, dir) = store().await;
        let first = body(&handle_create(&store, request(6)).await);
        let id = first["id"].as_str().unwrap().to_string();
        let before = store.list().await;

        tokio::fs::remove_file(dir.join("drafts.json")).await.unwrap();
        tokio::fs::create_dir(dir.join("drafts.json")).await.unwrap();

        assert_eq!(handle_regenerate(&store, &id).await.status(), 500);
        assert_eq!(store.list().await, before);
        assert_eq!(handle_delete(&store, &id).await.status(), 500);
        assert_eq!(store.list().await, before);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[test]
    fn test_working_config_export() {
        let request: ConfigExportRequest = serde_json::from_str(
            r#"{"draftSettings": {"numberOfPlayers": 3, "boostersPerPlayer": 2, "boosterConfigs": []}, "useCollectionAsSource": true}"#,
        )
        .unwrap();
        let doc = body(&handle_working_config_export(request));
        assert_eq!(doc["draftSettings"]["numberOfPlayers"], 3);
        assert_eq!(doc["metadata"]["sourceType"], "collection");
        assert!(doc["exportDate"].is_string());
    }
}
