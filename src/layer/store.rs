//! Layer Store
//!
//! File-backed layer persistence: one `<id>.json` per layer under the
//! configured directory, mirrored in memory for reads.

use crate::error::{validation_error, AppError};
use crate::layer::diff::{DiffEngine, SchemaDiff};
use crate::layer::model::{generate_layer_id, is_valid_layer_id, Layer, LayerDraft, LayerSummary};
use crate::models::{validate_tables, SchemaMetadata};
use chrono::Utc;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

pub struct LayerStore {
    dir: PathBuf,
    /// Layer ID -> Layer
    layers: RwLock<HashMap<String, Layer>>,
    /// Serializes file writes so a save and a delete of one id can't interleave
    write_lock: Mutex<()>,
}

impl LayerStore {
    /// Open (creating if needed) the layer directory and load every layer in it.
    /// Unreadable or malformed files, and files whose id is not their file
    /// stem, are logged and skipped.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let mut layers = HashMap::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match Self::read_layer(&path).await {
                Ok(layer) => {
                    layers.insert(layer.id.clone(), layer);
                }
                Err(e) => {
                    warn!("Skipping unreadable layer file {}: {}", path.display(), e);
                }
            }
        }

        info!("Loaded {} layers from {}", layers.len(), dir.display());

        Ok(Self {
            dir,
            layers: RwLock::new(layers),
            write_lock: Mutex::new(()),
        })
    }

    async fn read_layer(path: &Path) -> Result<Layer, AppError> {
        let bytes = fs::read(path).await?;
        let mut layer: Layer = serde_json::from_slice(&bytes)?;

        // The file name is the layer's only on-disk key
        let stem = path.file_stem().and_then(|s| s.to_str());
        if !is_valid_layer_id(&layer.id) || stem != Some(layer.id.as_str()) {
            return Err(validation_error(format!(
                "layer id '{}' does not match its file name",
                layer.id
            )));
        }

        validate_tables(&layer.tables)?;
        let tables = std::mem::take(&mut layer.tables);
        layer.tables = SchemaMetadata::new(tables, Vec::new()).into_tables();
        Ok(layer)
    }

    fn layer_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Create or overwrite a layer.
    ///
    /// A draft without an id gets a fresh one. `createdAt` is kept from the
    /// stored layer when overwriting, otherwise taken from the draft or now.
    /// `updatedAt` is always now.
    pub async fn save(&self, draft: LayerDraft) -> Result<Layer, AppError> {
        let draft = draft.validated()?;
        let _guard = self.write_lock.lock().await;

        let now = Utc::now();
        let (id, created_at) = {
            let layers = self.layers.read().await;
            match draft.id {
                Some(id) => {
                    let created_at = layers
                        .get(&id)
                        .map(|existing| existing.created_at)
                        .or(draft.created_at)
                        .unwrap_or(now);
                    (id, created_at)
                }
                None => {
                    let mut id = generate_layer_id();
                    while layers.contains_key(&id) {
                        id = generate_layer_id();
                    }
                    (id, draft.created_at.unwrap_or(now))
                }
            }
        };

        let layer = Layer {
            id,
            name: draft.name,
            description: draft.description,
            base_schema: draft.base_schema,
            tables: draft.tables,
            created_at,
            updated_at: now,
        };

        // Write to a sibling temp file, then rename over the target
        let path = self.layer_path(&layer.id);
        let tmp = self.dir.join(format!(".{}.json.tmp", layer.id));
        fs::write(&tmp, serde_json::to_vec_pretty(&layer)?).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        self.layers
            .write()
            .await
            .insert(layer.id.clone(), layer.clone());

        info!(
            "Saved layer {} ('{}'): {} tables",
            layer.id,
            layer.name,
            layer.tables.len()
        );

        Ok(layer)
    }

    pub async fn get(&self, id: &str) -> Option<Layer> {
        self.layers.read().await.get(id).cloned()
    }

    /// All layers, oldest first
    pub async fn list(&self) -> Vec<Layer> {
        let layers = self.layers.read().await;
        let mut list: Vec<Layer> = layers.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        list
    }

    pub async fn summaries(&self) -> Vec<LayerSummary> {
        self.list().await.iter().map(LayerSummary::from).collect()
    }

    /// Returns false when no such layer exists
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;

        if !self.layers.read().await.contains_key(id) {
            return Ok(false);
        }

        match fs::remove_file(self.layer_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.layers.write().await.remove(id);
        info!("Deleted layer {}", id);
        Ok(true)
    }

    /// Diff two stored layers
    pub async fn compare(&self, base_id: &str, draft_id: &str) -> Result<SchemaDiff, AppError> {
        let layers = self.layers.read().await;

        let base = layers
            .get(base_id)
            .ok_or_else(|| AppError::NotFound(format!("Layer '{}' not found", base_id)))?;
        let draft = layers
            .get(draft_id)
            .ok_or_else(|| AppError::NotFound(format!("Layer '{}' not found", draft_id)))?;

        Ok(DiffEngine::compare(base, draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Table};
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", "integer").not_null())
            .primary_key(&["id"])
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayerStore::open(dir.path()).await.unwrap();

        let layer = store.save(LayerDraft::new("v1", vec![users()])).await.unwrap();

        assert!(layer.id.starts_with("layer_"));
        assert_eq!(layer.created_at, layer.updated_at);
        assert!(dir.path().join(format!("{}.json", layer.id)).exists());
        assert_eq!(store.get(&layer.id).await, Some(layer));
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayerStore::open(dir.path()).await.unwrap();

        let first = store.save(LayerDraft::new("v1", vec![users()])).await.unwrap();

        let mut draft = LayerDraft::new("v1 renamed", vec![]);
        draft.id = Some(first.id.clone());
        draft.created_at = Some(Utc::now() + chrono::Duration::days(1));
        let second = store.save(draft).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.name, "v1 renamed");
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_client_supplied_id_and_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayerStore::open(dir.path()).await.unwrap();

        let created = Utc::now() - chrono::Duration::hours(3);
        let mut draft = LayerDraft::new("imported", vec![users()]);
        draft.id = Some("baseline".to_string());
        draft.created_at = Some(created);

        let layer = store.save(draft).await.unwrap();
        assert_eq!(layer.id, "baseline");
        assert_eq!(layer.created_at, created);
    }

    #[tokio::test]
    async fn test_reopen_reloads_layers() {
        let dir = tempfile::tempdir().unwrap();
        let saved = {
            let store = LayerStore::open(dir.path()).await.unwrap();
            store.save(LayerDraft::new("v1", vec![users()])).await.unwrap()
        };

        let store = LayerStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&saved.id).await, Some(saved));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let store = LayerStore::open(dir.path()).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_copied_layer_file_does_not_outlive_delete() {
        let dir = tempfile::tempdir().unwrap();
        let saved = {
            let store = LayerStore::open(dir.path()).await.unwrap();
            store.save(LayerDraft::new("v1", vec![users()])).await.unwrap()
        };
        std::fs::copy(
            dir.path().join(format!("{}.json", saved.id)),
            dir.path().join("backup.json"),
        )
        .unwrap();

        let store = LayerStore::open(dir.path()).await.unwrap();
        assert!(store.delete(&saved.id).await.unwrap());

        let store = LayerStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&saved.id).await, None);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_path_like_id_on_disk_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let layer = Layer {
            id: "../escape".to_string(),
            name: "escape".to_string(),
            description: None,
            base_schema: None,
            tables: vec![users()],
            created_at: now,
            updated_at: now,
        };
        std::fs::write(dir.path().join("a.json"), serde_json::to_vec(&layer).unwrap()).unwrap();

        let store = LayerStore::open(dir.path()).await.unwrap();
        assert!(store.list().await.is_empty());
        assert!(!store.delete("../escape").await.unwrap());
    }

    #[tokio::test]
    async fn test_loaded_tables_are_validated_and_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let layer = |id: &str, tables| Layer {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            base_schema: None,
            tables,
            created_at: now,
            updated_at: now,
        };

        let mut unnormalized = users();
        unnormalized.schema = String::new();
        let good = layer("good", vec![unnormalized]);
        let dup = layer("dup", vec![users(), users()]);
        for l in [&good, &dup] {
            std::fs::write(
                dir.path().join(format!("{}.json", l.id)),
                serde_json::to_vec(l).unwrap(),
            )
            .unwrap();
        }

        let store = LayerStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("dup").await, None);

        let loaded = store.get("good").await.unwrap();
        assert_eq!(loaded.tables[0].schema, "public");
        assert!(loaded.tables[0].columns[0].is_primary_key);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_and_delete_of_one_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(LayerStore::open(dir.path()).await.unwrap());

        let mut seed = LayerDraft::new("seed", vec![users()]);
        seed.id = Some("shared".to_string());
        store.save(seed).await.unwrap();

        let save = |name: &'static str| {
            let store = store.clone();
            tokio::spawn(async move {
                let mut draft = LayerDraft::new(name, vec![users()]);
                draft.id = Some("shared".to_string());
                store.save(draft).await.unwrap();
            })
        };
        let remove = {
            let store = store.clone();
            tokio::spawn(async move { store.delete("shared").await.unwrap() })
        };

        let (a, b, c, d) = tokio::join!(save("one"), save("two"), save("three"), remove);
        a.unwrap();
        b.unwrap();
        c.unwrap();
        d.unwrap();

        let listed = store.list().await;
        assert!(listed.len() <= 1);

        let path = dir.path().join("shared.json");
        match store.get("shared").await {
            Some(in_memory) => {
                let on_disk: Layer =
                    serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
                assert_eq!(in_memory, on_disk);
                assert_eq!(listed, vec![in_memory]);
            }
            None => {
                assert!(!path.exists());
                assert!(listed.is_empty());
            }
        }

        // A fresh load agrees with what was left in memory
        let reopened = LayerStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list().await, listed);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_creation() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayerStore::open(dir.path()).await.unwrap();
        let base = Utc::now();

        for (id, offset) in [("c", 2), ("a", 0), ("b", 1)] {
            let mut draft = LayerDraft::new(id, vec![]);
            draft.id = Some(id.to_string());
            draft.created_at = Some(base + chrono::Duration::seconds(offset));
            store.save(draft).await.unwrap();
        }

        let ids: Vec<String> = store.list().await.into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let summaries = store.summaries().await;
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].id, "a");
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayerStore::open(dir.path()).await.unwrap();
        let layer = store.save(LayerDraft::new("v1", vec![users()])).await.unwrap();

        assert!(store.delete(&layer.id).await.unwrap());
        assert!(!dir.path().join(format!("{}.json", layer.id)).exists());
        assert_eq!(store.get(&layer.id).await, None);
        assert!(!store.delete(&layer.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_compare_missing_layer() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayerStore::open(dir.path()).await.unwrap();
        let layer = store.save(LayerDraft::new("v1", vec![users()])).await.unwrap();

        let result = store.compare(&layer.id, "nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let diff = store.compare(&layer.id, &layer.id).await.unwrap();
        assert!(diff.is_empty());
    }
}
