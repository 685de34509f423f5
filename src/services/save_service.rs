use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dao::{models::SavedGameEntity, save_store::SaveStore},
    dto::{admin::SaveListItem, game::GameSnapshot},
    error::ServiceError,
    state::{SharedState, engine::GameProgress},
};

/// Snapshot queued for persistence after a command.
#[derive(Debug)]
pub struct SaveRequest {
    /// Command that produced the snapshot; becomes part of the file name.
    pub action: &'static str,
    pub game: SavedGameEntity,
}

/// Persist queued snapshots in order until every sender is dropped.
///
/// Failures are logged and the game carries on.
pub async fn run(store: Arc<dyn SaveStore>, mut requests: mpsc::UnboundedReceiver<SaveRequest>) {
    while let Some(SaveRequest { action, game }) = requests.recv().await {
        match store.save(action.to_string(), game).await {
            Ok(meta) => debug!(id = meta.id, action, "snapshot persisted"),
            Err(err) => warn!(action, error = %err, "failed to persist snapshot"),
        }
    }
    debug!("save worker stopped");
}

fn require_store(state: &SharedState) -> Result<Arc<dyn SaveStore>, ServiceError> {
    state.save_store().ok_or(ServiceError::SavesDisabled)
}

/// Every save, oldest first.
pub async fn list_saves(state: &SharedState) -> Result<Vec<SaveListItem>, ServiceError> {
    let store = require_store(state)?;
    let saves = store.list().await?;
    Ok(saves.into_iter().map(SaveListItem::from).collect())
}

/// Rewind the game to a save, discarding every later save.
///
/// The save is validated first; a save that cannot be restored leaves the
/// history untouched.
pub async fn load_save(
    state: &SharedState,
    id: u64,
) -> Result<GameSnapshot, ServiceError> {
    let store = require_store(state)?;
    let entity = store.read(id).await?;
    let progress = GameProgress::try_from(entity)?;
    store.rewind(id).await?;
    Ok(state.replace_engine(progress).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{
            models::tests::midgame_entity,
            save_store::{FileSaveStore, SaveMeta},
            storage::{StorageError, StorageResult},
        },
        state::{
            AppState, clock::ManualClock, engine::tests::engine_with,
            questions::tests::sample_bank,
        },
    };

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<String>>,
    }

    impl SaveStore for RecordingStore {
        fn save(
            &self,
            action: String,
            _game: SavedGameEntity,
        ) -> BoxFuture<'static, StorageResult<SaveMeta>> {
            let mut saved = self.saved.lock().unwrap();
            saved.push(action.clone());
            let result = if action == "broken" {
                Err(StorageError::NotFound(0))
            } else {
                Ok(SaveMeta {
                    id: saved.len() as u64,
                    action,
                    saved_at: std::time::SystemTime::now(),
                })
            };
            Box::pin(async move { result })
        }

        fn list(&self) -> BoxFuture<'static, StorageResult<Vec<SaveMeta>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn read(&self, id: u64) -> BoxFuture<'static, StorageResult<SavedGameEntity>> {
            Box::pin(async move { Err(StorageError::NotFound(id)) })
        }

        fn rewind(&self, id: u64) -> BoxFuture<'static, StorageResult<usize>> {
            Box::pin(async move { Err(StorageError::NotFound(id)) })
        }
    }

    fn app_with_saves(dir: &std::path::Path) -> (SharedState, FileSaveStore) {
        let clock = ManualClock::new();
        let store = FileSaveStore::new(dir);
        let (state, _workers) = AppState::new(
            engine_with(sample_bank(), &clock),
            Arc::new(clock),
            Some(Arc::new(store.clone()) as Arc<dyn SaveStore>),
        );
        (state, store)
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "buzz-quiz-load-{name}-{}",
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn ids(store: &FileSaveStore) -> Vec<u64> {
        store.list().await.unwrap().iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn invalid_save_keeps_the_later_history() {
        let dir = temp_dir("invalid");
        let (state, store) = app_with_saves(&dir);
        let mut broken = midgame_entity();
        broken.tiebreak_questions.pop();
        store.save("set_teams".into(), broken).await.unwrap();
        store.save("buzz".into(), midgame_entity()).await.unwrap();
        store.save("answer".into(), midgame_entity()).await.unwrap();

        assert!(load_save(&state, 1).await.is_err());
        assert_eq!(ids(&store).await, vec![1, 2, 3]);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn loading_a_save_rewinds_and_restores_it() {
        let dir = temp_dir("valid");
        let (state, store) = app_with_saves(&dir);
        for action in ["set_teams", "buzz", "answer"] {
            store.save(action.into(), midgame_entity()).await.unwrap();
        }

        let snapshot = load_save(&state, 2).await.unwrap();
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(ids(&store).await, vec![1, 2]);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn worker_persists_in_order_and_survives_failures() {
        let store = Arc::new(RecordingStore::default());
        let (tx, rx) = mpsc::unbounded_channel();
        for action in ["set_teams", "broken", "buzz"] {
            tx.send(SaveRequest {
                action,
                game: midgame_entity(),
            })
            .unwrap();
        }
        drop(tx);

        run(store.clone(), rx).await;
        assert_eq!(
            *store.saved.lock().unwrap(),
            vec!["set_teams", "broken", "buzz"]
        );
    }
}
