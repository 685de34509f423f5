use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

use crate::dao::{
    models::SavedGameEntity,
    storage::{StorageError, StorageResult},
};

/// Metadata of a stored save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveMeta {
    /// Monotonic id; higher ids are more recent.
    pub id: u64,
    /// Command that produced the save.
    pub action: String,
    pub saved_at: SystemTime,
}

/// Abstraction over the persistence layer for game snapshots.
pub trait SaveStore: Send + Sync {
    /// Store a snapshot under the next id.
    fn save(
        &self,
        action: String,
        game: SavedGameEntity,
    ) -> BoxFuture<'static, StorageResult<SaveMeta>>;
    /// Every save, oldest first.
    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<SaveMeta>>>;
    /// Read a save without touching the others.
    fn read(&self, id: u64) -> BoxFuture<'static, StorageResult<SavedGameEntity>>;
    /// Discard every save made after `id`, returning how many were removed.
    fn rewind(&self, id: u64) -> BoxFuture<'static, StorageResult<usize>>;
}

/// Saves written as `{id}.{action}.json` files in one directory.
#[derive(Clone)]
pub struct FileSaveStore {
    dir: Arc<PathBuf>,
    next_id: Arc<Mutex<Option<u64>>>,
}

impl FileSaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
            next_id: Arc::new(Mutex::new(None)),
        }
    }

    fn file_name(id: u64, action: &str) -> String {
        format!("{id}.{action}.json")
    }

    fn parse_file_name(name: &str) -> Option<(u64, String)> {
        let stem = name.strip_suffix(".json")?;
        let (id, action) = stem.split_once('.')?;
        Some((id.parse().ok()?, action.to_string()))
    }

    async fn scan(dir: &Path) -> StorageResult<Vec<(SaveMeta, PathBuf)>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("failed to read {}", dir.display()),
                    err,
                ));
            }
        };

        let mut saves = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|err| {
            StorageError::unavailable(format!("failed to read {}", dir.display()), err)
        })? {
            let Some((id, action)) = entry
                .file_name()
                .to_str()
                .and_then(Self::parse_file_name)
            else {
                continue;
            };
            let saved_at = entry
                .metadata()
                .await
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            saves.push((
                SaveMeta {
                    id,
                    action,
                    saved_at,
                },
                entry.path(),
            ));
        }
        saves.sort_by_key(|(meta, _)| meta.id);
        Ok(saves)
    }
}

impl SaveStore for FileSaveStore {
    fn save(
        &self,
        action: String,
        game: SavedGameEntity,
    ) -> BoxFuture<'static, StorageResult<SaveMeta>> {
        let store = self.clone();
        Box::pin(async move {
            let mut next_id = store.next_id.lock().await;
            let id = match *next_id {
                Some(id) => id,
                None => Self::scan(&store.dir)
                    .await?
                    .last()
                    .map_or(1, |(meta, _)| meta.id + 1),
            };

            let payload = serde_json::to_vec_pretty(&game)
                .map_err(|err| StorageError::unavailable("failed to encode save".into(), err))?;
            fs::create_dir_all(store.dir.as_ref()).await.map_err(|err| {
                StorageError::unavailable(format!("failed to create {}", store.dir.display()), err)
            })?;
            let path = store.dir.join(Self::file_name(id, &action));
            fs::write(&path, payload).await.map_err(|err| {
                StorageError::unavailable(format!("failed to write {}", path.display()), err)
            })?;

            *next_id = Some(id + 1);
            debug!(id, action = %action, "game saved");
            Ok(SaveMeta {
                id,
                action,
                saved_at: SystemTime::now(),
            })
        })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<SaveMeta>>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            Ok(Self::scan(&dir)
                .await?
                .into_iter()
                .map(|(meta, _)| meta)
                .collect())
        })
    }

    fn read(&self, id: u64) -> BoxFuture<'static, StorageResult<SavedGameEntity>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            let saves = Self::scan(&dir).await?;
            let (_, path) = saves
                .iter()
                .find(|(meta, _)| meta.id == id)
                .ok_or(StorageError::NotFound(id))?;

            let contents = fs::read(path).await.map_err(|err| {
                StorageError::unavailable(format!("failed to read {}", path.display()), err)
            })?;
            serde_json::from_slice(&contents).map_err(|err| StorageError::Corrupt {
                id,
                message: err.to_string(),
            })
        })
    }

    fn rewind(&self, id: u64) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move {
            let mut next_id = store.next_id.lock().await;
            let saves = Self::scan(&store.dir).await?;
            if !saves.iter().any(|(meta, _)| meta.id == id) {
                return Err(StorageError::NotFound(id));
            }

            let mut discarded = 0;
            for (meta, path) in saves.iter().filter(|(meta, _)| meta.id > id) {
                fs::remove_file(path).await.map_err(|err| {
                    StorageError::unavailable(format!("failed to delete save {}", meta.id), err)
                })?;
                discarded += 1;
            }
            *next_id = Some(id + 1);
            info!(id, discarded, "saves rewound");
            Ok(discarded)
        })
    }
}
