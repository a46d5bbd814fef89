pub mod json;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::{GameEntity, GameId, UserEntity, UserPatch};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for administrator accounts and game
/// definitions. Live sessions are deliberately not persisted.
pub trait EntityStore: Send + Sync {
    fn find_user(&self, email: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Apply a patch to the user with the given email; reports whether a
    /// record matched.
    fn update_user(
        &self,
        email: String,
        patch: UserPatch,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn find_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn create_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the stored game matching the entity's id and owner; reports
    /// whether a record matched.
    fn update_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete the listed games belonging to the owner, returning how many
    /// records were removed.
    fn delete_games(
        &self,
        ids: Vec<GameId>,
        owner: String,
    ) -> BoxFuture<'static, StorageResult<usize>>;
    fn games_by_owner(&self, owner: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Drop every stored user and game. Test isolation only.
    fn wipe(&self) -> BoxFuture<'static, StorageResult<()>>;
}
