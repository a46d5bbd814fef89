//! Game definition management: owner-scoped listing and the dashboard's
//! whole-list reconcile, plus the ownership assertion every admin session
//! mutation goes through.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use crate::{
    dao::{
        models::{GameEntity, GameId},
        store::EntityStore,
    },
    dto::admin::{GameInput, GameSummary, GamesResponse, PutGamesRequest},
    error::ServiceError,
    state::{Gate, SharedState},
};

/// Game ids share the numeric range of session ids.
const GAME_ID_RANGE: std::ops::Range<u64> = 100_000..100_000_000;

/// Fetch the game and check it belongs to the administrator.
pub async fn assert_owns_game(
    store: &Arc<dyn EntityStore>,
    owner: &str,
    game_id: GameId,
) -> Result<GameEntity, ServiceError> {
    let game = store.find_game(game_id).await?.ok_or_else(|| {
        ServiceError::InvalidInput(format!("game `{game_id}` does not exist"))
    })?;

    if game.owner != owner {
        return Err(ServiceError::InvalidInput(format!(
            "administrator does not own game `{game_id}`"
        )));
    }

    Ok(game)
}

/// Stored games of the owner, with live/ended session ids attached.
pub async fn list_games(state: &SharedState, owner: &str) -> Result<GamesResponse, ServiceError> {
    let games = state.store().games_by_owner(owner.to_string()).await?;
    Ok(summarize(state, games))
}

/// Reconcile the owner's stored games against the dashboard's full list:
/// stored games absent from the request are deleted, id-less entries are
/// created, id-bearing entries are updated when owned.
///
/// An id-bearing entry matching no owned row is created with the
/// client-supplied id. That lets a client mint ids it never owned; kept
/// because the dashboard relies on it when re-submitting a list containing a
/// game deleted in another tab.
pub async fn put_games(
    state: &SharedState,
    owner: &str,
    request: PutGamesRequest,
) -> Result<GamesResponse, ServiceError> {
    state
        .serialized(Gate::Game, || async move {
            let store = state.store();
            let stored = store.games_by_owner(owner.to_string()).await?;

            let submitted_ids: HashSet<GameId> =
                request.games.iter().filter_map(|game| game.id).collect();
            let stale: Vec<GameId> = stored
                .iter()
                .map(|game| game.id)
                .filter(|id| !submitted_ids.contains(id))
                .collect();
            if !stale.is_empty() {
                let deleted = store.delete_games(stale, owner.to_string()).await?;
                debug!(owner, deleted, "removed games absent from submitted list");
            }

            for input in request.games {
                upsert_game(&store, owner, input).await?;
            }

            let games = store.games_by_owner(owner.to_string()).await?;
            Ok(summarize(state, games))
        })
        .await
}

async fn upsert_game(
    store: &Arc<dyn EntityStore>,
    owner: &str,
    input: GameInput,
) -> Result<(), ServiceError> {
    match input.id {
        None => {
            let id = generate_game_id(store).await?;
            let entity = entity_from_input(id, owner, input);
            info!(owner, game_id = id, "created game");
            store.create_game(entity).await?;
        }
        Some(id) => {
            let entity = entity_from_input(id, owner, input);
            let updated = store.update_game(entity.clone()).await?;
            if !updated {
                info!(owner, game_id = id, "created game with client-supplied id");
                store.create_game(entity).await?;
            }
        }
    }
    Ok(())
}

fn entity_from_input(id: GameId, owner: &str, input: GameInput) -> GameEntity {
    GameEntity {
        id,
        owner: owner.to_string(),
        name: input.name,
        questions: input.questions,
        extra: input.extra,
    }
}

/// Draw a game id not present in storage.
async fn generate_game_id(store: &Arc<dyn EntityStore>) -> Result<GameId, ServiceError> {
    loop {
        let id = rand::rng().random_range(GAME_ID_RANGE);
        if store.find_game(id).await?.is_none() {
            return Ok(id);
        }
    }
}

fn summarize(state: &SharedState, games: Vec<GameEntity>) -> GamesResponse {
    let registry = state.registry();
    GamesResponse {
        games: games
            .into_iter()
            .map(|game| {
                let active = registry.active_session_for_game(game.id);
                let old_sessions = registry.inactive_sessions_for_game(game.id);
                GameSummary::new(game, active, old_sessions)
            })
            .collect(),
    }
}
