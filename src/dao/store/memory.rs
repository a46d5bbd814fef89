//! Volatile [`EntityStore`] backend used by the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::dao::models::{GameEntity, GameId, UserEntity, UserPatch};
use crate::dao::storage::StorageResult;
use crate::dao::store::EntityStore;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, UserEntity>,
    games: HashMap<GameId, GameEntity>,
}

/// In-memory entity store with the same observable behavior as the file
/// backend, minus durability.
#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryStore {
    fn find_user(&self, email: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move { Ok(tables.lock().await.users.get(&email).cloned()) })
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            tables.lock().await.users.insert(user.email.clone(), user);
            Ok(())
        })
    }

    fn update_user(
        &self,
        email: String,
        patch: UserPatch,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.lock().await;
            let Some(user) = guard.users.get_mut(&email) else {
                return Ok(false);
            };
            if let Some(session_active) = patch.session_active {
                user.session_active = session_active;
            }
            Ok(true)
        })
    }

    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move { Ok(tables.lock().await.games.get(&id).cloned()) })
    }

    fn create_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            tables.lock().await.games.insert(game.id, game);
            Ok(())
        })
    }

    fn update_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.lock().await;
            match guard.games.get_mut(&game.id) {
                Some(stored) if stored.owner == game.owner => {
                    *stored = game;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn delete_games(
        &self,
        ids: Vec<GameId>,
        owner: String,
    ) -> BoxFuture<'static, StorageResult<usize>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.lock().await;
            let mut deleted = 0;
            for id in ids {
                if guard.games.get(&id).is_some_and(|game| game.owner == owner) {
                    guard.games.remove(&id);
                    deleted += 1;
                }
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
        Box::pin(async move {
            let mut guard = tables.lock().await;
            guard.users.clear();
            guard.games.clear();
            Ok(())
        })
    }
}
