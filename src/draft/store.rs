use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::{err, Res};

use super::Draft;

const DRAFTS_FILE: &str = "drafts.json";

/// Saved drafts, kept as a single JSON document in the data directory.
pub struct DraftStore {
    path: PathBuf,
    drafts: Mutex<Vec<Draft>>,
}

impl DraftStore {
    pub async fn load(data: &Path) -> Res<Self> {
        tokio::fs::create_dir_all(data)
            .await
            .map_err(|e| e.to_string())?;
        let path = data.join(DRAFTS_FILE);

        let drafts: Vec<Draft> = if path.exists() {
            let raw = tokio::fs::read(&path).await.map_err(|e| e.to_string())?;
            serde_json::from_slice(&raw).map_err(|e| format!("Failed to read saved drafts: {e}"))?
        } else {
            Vec::new()
        };
        tracing::debug!("Loaded {} saved drafts.", drafts.len());

        Ok(Self {
            path,
            drafts: Mutex::new(drafts),
        })
    }

    async fn persist(&self, drafts: &[Draft]) -> Res<()> {
        let raw = serde_json::to_vec_pretty(drafts).map_err(|e| e.to_string())?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| e.to_string())?;
        tracing::debug!("Saved {} drafts to {}.", drafts.len(), self.path.display());
        Ok(())
    }

    pub async fn list(&self) -> Vec<Draft> {
        self.drafts.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Draft> {
        self.drafts.lock().await.iter().find(|d| d.id == id).cloned()
    }

    /// Write `next` out and only then make it the stored list, so a failed
    /// write leaves memory matching the file.
    async fn commit(&self, drafts: &mut Vec<Draft>, next: Vec<Draft>) -> Res<()> {
        self.persist(&next).await?;
        *drafts = next;
        Ok(())
    }

    pub async fn insert(&self, draft: Draft) -> Res<()> {
        let mut drafts = self.drafts.lock().await;
        if drafts.iter().any(|d| d.id == draft.id) {
            return err(format!("Draft {} already exists.", draft.id));
        }
        let mut next = drafts.clone();
        next.push(draft);
        self.commit(&mut drafts, next).await
    }

    /// Remove a draft. Returns false if there was no such draft.
    pub async fn delete(&self, id: &str) -> Res<bool> {
        let mut drafts = self.drafts.lock().await;
        if !drafts.iter().any(|d| d.id == id) {
            return Ok(false);
        }
        let next = drafts.iter().filter(|d| d.id != id).cloned().collect();
        self.commit(&mut drafts, next).await?;
        Ok(true)
    }

    /// Discard a draft and store its replacement in one step. Returns false,
    /// leaving the store untouched, if the old draft does not exist.
    pub async fn replace(&self, id: &str, draft: Draft) -> Res<bool> {
        let mut drafts = self.drafts.lock().await;
        let Some(pos) = drafts.iter().position(|d| d.id == id) else {
            return Ok(false);
        };
        let mut next = drafts.clone();
        next.remove(pos);
        next.push(draft);
        self.commit(&mut drafts, next).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use crate::draft::{Draft, DraftSettings};

    use super::DraftStore;

    fn draft(name: &str) -> Draft {
        Draft::create(
            name.to_string(),
            None,
            DraftSettings::default(),
            Vec::new(),
            Vec::new(),
        )
    }

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dialdraft-store-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_store() {
        let dir = temp_dir();
        let store = DraftStore::load(&dir).await.unwrap();
        assert!(store.list().await.is_empty());

        let a = draft("a");
        let b = draft("b");
        store.insert(a.clone()).await.unwrap();
        store.insert(b.clone()).await.unwrap();
        assert!(store.insert(a.clone()).await.is_err());
        assert_eq!(store.get(&b.id).await.unwrap().name, "b");

        // Survives a reload.
        let reloaded = DraftStore::load(&dir).await.unwrap();
        assert_eq!(reloaded.list().await, vec![a.clone(), b.clone()]);

        assert!(store.delete(&a.id).await.unwrap());
        assert!(!store.delete(&a.id).await.unwrap());

        let c = draft("c");
        assert!(!store.replace(&a.id, c.clone()).await.unwrap());
        assert!(store.replace(&b.id, c.clone()).await.unwrap());
        assert_eq!(store.list().await, vec![c]);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("drafts.json"), "{").await.unwrap();
        assert!(DraftStore::load(&dir).await.is_err());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory() {
        let dir = temp_dir();
        let store = DraftStore::load(&dir).await.unwrap();
        let a = draft("a");
        store.insert(a.clone()).await.unwrap();

        // Nothing can be written once the file's path is a directory.
        tokio::fs::remove_file(dir.join("drafts.json")).await.unwrap();
        tokio::fs::create_dir(dir.join("drafts.json")).await.unwrap();

        assert!(store.insert(draft("b")).await.is_err());
        assert_eq!(store.list().await, vec![a.clone()]);

        assert!(store.delete(&a.id).await.is_err());
        assert_eq!(store.list().await, vec![a.clone()]);

        assert!(store.replace(&a.id, draft("c")).await.is_err());
        assert_eq!(store.list().await, vec![a]);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
