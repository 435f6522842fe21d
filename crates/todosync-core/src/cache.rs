// ── Warm-start cache ──
//
// Two files per credential under the cache directory:
//   <key>.json  full state in sync-payload shape
//   <key>.sync  cursors and the temp-id mapping table
// The key is derived from the token so different accounts never share
// a cache and the token itself never appears on disk.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::EntityId;
use crate::store::{DataStore, SyncCursors};

/// Contents of the `.sync` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SyncFile {
    #[serde(default)]
    cursors: SyncCursors,
    #[serde(default)]
    temp_id_mapping: IndexMap<String, EntityId>,
}

/// State recovered from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedState {
    pub payload: Map<String, Value>,
    pub cursors: SyncCursors,
    pub temp_ids: IndexMap<String, EntityId>,
}

/// On-disk cache for one credential.
#[derive(Debug, Clone)]
pub struct StateCache {
    dir: PathBuf,
    key: String,
}

impl StateCache {
    pub fn new(dir: impl Into<PathBuf>, token: &SecretString) -> Self {
        let key = Uuid::new_v5(&Uuid::NAMESPACE_OID, token.expose_secret().as_bytes())
            .simple()
            .to_string();
        Self {
            dir: dir.into(),
            key,
        }
    }

    /// Platform cache directory (`~/.cache/todosync` on Linux).
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "todosync", "todosync").map(|d| d.cache_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    pub fn sync_path(&self) -> PathBuf {
        self.dir.join(format!("{}.sync", self.key))
    }

    /// Load the cached state. `Ok(None)` when nothing was cached yet.
    pub fn read(&self) -> Result<Option<CachedState>, CoreError> {
        let state_path = self.state_path();
        if !state_path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&state_path).map_err(|e| cache_err(&state_path, &e))?;
        let payload: Map<String, Value> =
            serde_json::from_str(&raw).map_err(|e| cache_err(&state_path, &e))?;

        let sync_path = self.sync_path();
        let sync = if sync_path.exists() {
            let raw = std::fs::read_to_string(&sync_path).map_err(|e| cache_err(&sync_path, &e))?;
            serde_json::from_str::<SyncFile>(&raw).map_err(|e| cache_err(&sync_path, &e))?
        } else {
            SyncFile::default()
        };

        debug!(path = %state_path.display(), "loaded cached state");
        Ok(Some(CachedState {
            payload,
            cursors: sync.cursors,
            temp_ids: sync.temp_id_mapping,
        }))
    }

    /// Persist the store and the temp-id table.
    pub fn write(
        &self,
        store: &DataStore,
        temp_ids: &IndexMap<String, EntityId>,
    ) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| cache_err(&self.dir, &e))?;

        let state_path = self.state_path();
        let state = serde_json::to_string(&store.to_payload())?;
        std::fs::write(&state_path, state).map_err(|e| cache_err(&state_path, &e))?;

        let sync_path = self.sync_path();
        let sync = serde_json::to_string(&SyncFile {
            cursors: store.cursors().clone(),
            temp_id_mapping: temp_ids.clone(),
        })?;
        std::fs::write(&sync_path, sync).map_err(|e| cache_err(&sync_path, &e))?;

        debug!(path = %state_path.display(), "wrote state cache");
        Ok(())
    }

    /// Delete both cache files. Missing files are not an error.
    pub fn clear(&self) -> Result<(), CoreError> {
        for path in [self.state_path(), self.sync_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(cache_err(&path, &e)),
            }
        }
        Ok(())
    }
}

fn cache_err(path: &Path, err: &dyn std::fmt::Display) -> CoreError {
    CoreError::Cache {
        message: format!("{}: {err}", path.display()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ResourceType;
    use crate::store::SyncScope;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn token(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn key_depends_on_token_and_hides_it() {
        let a = StateCache::new("/tmp/x", &token("secret-a"));
        let b = StateCache::new("/tmp/x", &token("secret-b"));
        assert_ne!(a.state_path(), b.state_path());
        assert!(!a.state_path().to_string_lossy().contains("secret-a"));
        assert_eq!(
            StateCache::new("/tmp/x", &token("secret-a")).state_path(),
            a.state_path()
        );
    }

    #[test]
    fn missing_cache_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::new(dir.path(), &token("t"));
        assert!(cache.read().unwrap().is_none());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::new(dir.path().join("nested"), &token("t"));

        let mut store = DataStore::new();
        store
            .reconcile(
                json!({"sync_token": "abc", "projects": [{"id": 1, "name": "A"}]})
                    .as_object()
                    .unwrap(),
                &SyncScope::All,
            )
            .unwrap();
        let mut temp_ids = IndexMap::new();
        temp_ids.insert("tmp".to_owned(), EntityId::from(1));

        cache.write(&store, &temp_ids).unwrap();
        let cached = cache.read().unwrap().unwrap();

        assert_eq!(cached.cursors.get(ResourceType::Items), "abc");
        assert_eq!(cached.temp_ids, temp_ids);
        assert_eq!(cached.payload["projects"], json!([{"id": 1, "name": "A"}]));
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::new(dir.path(), &token("t"));
        std::fs::write(cache.state_path(), "{not json").unwrap();
        assert!(matches!(cache.read(), Err(CoreError::Cache { .. })));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::new(dir.path(), &token("t"));
        cache.write(&DataStore::new(), &IndexMap::new()).unwrap();
        cache.clear().unwrap();
        cache.clear().unwrap();
        assert!(cache.read().unwrap().is_none());
    }
}
