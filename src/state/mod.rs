//! Shared application state: the session registry, the serialization gates,
//! and handles to the entity store and token service.

pub mod registry;
pub mod session;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    config::AppConfig, dao::store::EntityStore, error::ServiceError,
    services::token_service::TokenService, state::registry::SessionRegistry,
};

pub type SharedState = Arc<AppState>;

/// Named mutual-exclusion domains. Every state-changing operation runs to
/// completion under exactly one of these, turning concurrent request handlers
/// into a single-threaded critical section per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Register/login/logout and the stored user records they touch.
    Auth,
    /// Game definitions and admin-driven session lifecycle mutations.
    Game,
    /// Player joins and answer-ledger mutations.
    Session,
}

/// Central application state shared by every request handler.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn EntityStore>,
    tokens: TokenService,
    registry: SessionRegistry,
    auth_gate: Mutex<()>,
    game_gate: Mutex<()>,
    session_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply into timer tasks and handlers.
    pub fn new(config: AppConfig, store: Arc<dyn EntityStore>) -> SharedState {
        let tokens = TokenService::new(config.token_secret());
        Arc::new(Self {
            config,
            store,
            tokens,
            registry: SessionRegistry::new(),
            auth_gate: Mutex::new(()),
            game_gate: Mutex::new(()),
            session_gate: Mutex::new(()),
        })
    }

    /// Handle to the durable entity store.
    pub fn store(&self) -> Arc<dyn EntityStore> {
        Arc::clone(&self.store)
    }

    /// Token issue/verify capability.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Registry of live and finished sessions.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn gate(&self, gate: Gate) -> &Mutex<()> {
        match gate {
            Gate::Auth => &self.auth_gate,
            Gate::Game => &self.game_gate,
            Gate::Session => &self.session_gate,
        }
    }

    /// Run `work` with exclusive access to the named domain. Queued callers
    /// acquire in FIFO order; the gate is released when the body resolves or
    /// rejects, so a failing body can never wedge the domain.
    pub async fn serialized<F, Fut, T>(&self, gate: Gate, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let _guard = self.gate(gate).lock().await;
        work().await
    }

    /// Wipe all in-memory session state and every stored user/game record.
    /// Test isolation only.
    pub async fn reset(&self) -> Result<(), ServiceError> {
        self.registry.reset();
        self.store.wipe().await?;
        Ok(())
    }
}
