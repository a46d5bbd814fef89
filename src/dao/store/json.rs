//! Durable [`EntityStore`] backend keeping every record in a single JSON file,
//! rewritten after each mutation. Mutations are already serialized by the
//! domain gates, so the coarse rewrite is not a throughput concern.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::dao::models::{GameEntity, GameId, UserEntity, UserPatch};
use crate::dao::storage::{StorageError, StorageResult};
use crate::dao::store::EntityStore;

/// On-disk table layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    users: HashMap<String, UserEntity>,
    games: HashMap<GameId, GameEntity>,
}

/// File-backed entity store.
pub struct JsonFileStore {
    path: PathBuf,
    tables: Arc<Mutex<Tables>>,
}

impl JsonFileStore {
    /// Open the store file, starting with empty tables when it does not exist
    /// yet. A present-but-unreadable file is an error rather than a silent
    /// fresh start.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let tables = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                StorageError::unavailable(format!("corrupt store file {}", path.display()), err)
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "store file not found; starting with empty tables");
                Tables::default()
            }
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("cannot read store file {}", path.display()),
                    err,
                ));
            }
        };

        Ok(Self {
            path,
            tables: Arc::new(Mutex::new(tables)),
        })
    }
}

/// Rewrite the whole store file from the in-memory tables.
async fn flush(path: &Path, tables: &Tables) -> StorageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            StorageError::unavailable(format!("cannot create {}", parent.display()), err)
        })?;
    }

    let bytes = serde_json::to_vec_pretty(tables)
        .map_err(|err| StorageError::unavailable("cannot serialize store tables".into(), err))?;
    tokio::fs::write(path, bytes).await.map_err(|err| {
        StorageError::unavailable(format!("cannot write store file {}", path.display()), err)
    })
}

impl EntityStore for JsonFileStore {
    fn find_user(&self, email: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move { Ok(tables.lock().await.users.get(&email).cloned()) })
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            guard.users.insert(user.email.clone(), user);
            flush(&path, &guard).await
        })
    }

    fn update_user(
        &self,
        email: String,
        patch: UserPatch,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = Arc::clone(&self.tables);
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            let Some(user) = guard.users.get_mut(&email) else {
                return Ok(false);
            };
            if let Some(session_active) = patch.session_active {
                user.session_active = session_active;
            }
            flush(&path, &guard).await?;
            Ok(true)
        })
    }

    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move { Ok(tables.lock().await.games.get(&id).cloned()) })
    }

    fn create_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            guard.games.insert(game.id, game);
            flush(&path, &guard).await
        })
    }

    fn update_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = Arc::clone(&self.tables);
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            match guard.games.get_mut(&game.id) {
                Some(stored) if stored.owner == game.owner => *stored = game,
                _ => return Ok(false),
            }
            flush(&path, &guard).await?;
            Ok(true)
        })
    }

    fn delete_games(
        &self,
        ids: Vec<GameId>,
        owner: String,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = Arc::clone(&self.tables);
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            let mut deleted = 0;
            for id in ids {
                if guard.games.get(&id).is_some_and(|game| game.owner == owner) {
                    guard.games.remove(&id);
                    deleted += 1;
                }
            }
            if deleted > 0 {
                flush(&path, &guard).await?;
            }
            Ok(deleted)
        })
    }

    fn games_by_owner(&self, owner: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let guard = tables.lock().await;
            let mut games: Vec<GameEntity> = guard
                .games
                .values()
                .filter(|game| game.owner == owner)
                .cloned()
                .collect();
            games.sort_by_key(|game| game.id);
            Ok(games)
        })
    }

    fn wipe(&self) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        let path = self.path.clone();
        Box::pin(async move {
            let mut guard = tables.lock().await;
            guard.users.clear();
            guard.games.clear();
            flush(&path, &guard).await
        })
    }
}
