//! Registration, login, and logout for administrators. Everything that
//! touches a stored user record runs under the `auth` gate so concurrent
//! registrations of the same email cannot both slip past the existence check.

use tracing::info;

use crate::{
    dao::models::{UserEntity, UserPatch},
    dto::{
        auth::{LoginRequest, RegisterRequest, TokenResponse},
        common::ActionResponse,
    },
    error::ServiceError,
    state::{Gate, SharedState},
};

/// Create an administrator account and log it in.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<TokenResponse, ServiceError> {
    state
        .serialized(Gate::Auth, || async move {
            let store = state.store();
            if store.find_user(request.email.clone()).await?.is_some() {
                return Err(ServiceError::InvalidInput(format!(
                    "email `{}` is already registered",
                    request.email
                )));
            }

            store
                .create_user(UserEntity {
                    email: request.email.clone(),
                    password: request.password,
                    name: request.name,
                    session_active: true,
                })
                .await?;

            info!(email = %request.email, "registered administrator");
            let token = state.tokens().issue(&request.email)?;
            Ok(TokenResponse { token })
        })
        .await
}

/// Log an administrator in, reactivating its stored login flag.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<TokenResponse, ServiceError> {
    state
        .serialized(Gate::Auth, || async move {
            let store = state.store();
            let user = store.find_user(request.email.clone()).await?;
            // Unknown email and wrong password are indistinguishable on
            // purpose.
            let valid = user.is_some_and(|user| user.password == request.password);
            if !valid {
                return Err(ServiceError::InvalidInput(
                    "invalid email or password".into(),
                ));
            }

            store
                .update_user(
                    request.email.clone(),
                    UserPatch {
                        session_active: Some(true),
                    },
                )
                .await?;

            let token = state.tokens().issue(&request.email)?;
            Ok(TokenResponse { token })
        })
        .await
}

/// Revoke the administrator's live login.
pub async fn logout(state: &SharedState, email: &str) -> Result<ActionResponse, ServiceError> {
    state
        .serialized(Gate::Auth, || async move {
            let matched = state
                .store()
                .update_user(
                    email.to_string(),
                    UserPatch {
                        session_active: Some(false),
                    },
                )
                .await?;
            if !matched {
                return Err(ServiceError::Unauthorized(format!(
                    "unknown administrator `{email}`"
                )));
            }
            Ok(ActionResponse::new("logged out"))
        })
        .await
}

/// Check that a verified token subject still maps to a logged-in
/// administrator. Ungated: a read-only lookup on the hot path of every admin
/// request.
pub async fn ensure_active_admin(state: &SharedState, email: &str) -> Result<(), ServiceError> {
    let user = state
        .store()
        .find_user(email.to_string())
        .await?
        .ok_or_else(|| ServiceError::Unauthorized(format!("unknown administrator `{email}`")))?;

    if !user.session_active {
        return Err(ServiceError::Unauthorized(
            "login session has been revoked".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::store::memory::MemoryStore, state::AppState};
    use std::sync::Arc;

    fn test_state() -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(MemoryStore::new()))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "hunter2".into(),
            name: "Hayden".into(),
        }
    }

    #[tokio::test]
    async fn register_login_logout_round_trip() {
        let state = test_state();

        let issued = register(&state, register_request("a@b.c")).await.unwrap();
        assert_eq!(state.tokens().verify(&issued.token).unwrap(), "a@b.c");
        ensure_active_admin(&state, "a@b.c").await.unwrap();

        logout(&state, "a@b.c").await.unwrap();
        assert!(matches!(
            ensure_active_admin(&state, "a@b.c").await,
            Err(ServiceError::Unauthorized(_))
        ));

        login(
            &state,
            LoginRequest {
                email: "a@b.c".into(),
                password: "hunter2".into(),
            },
        )
        .await
        .unwrap();
        ensure_active_admin(&state, "a@b.c").await.unwrap();
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let state = test_state();
        register(&state, register_request("a@b.c")).await.unwrap();

        let wrong_password = login(
            &state,
            LoginRequest {
                email: "a@b.c".into(),
                password: "wrong".into(),
            },
        )
        .await;
        assert!(matches!(wrong_password, Err(ServiceError::InvalidInput(_))));

        let unknown_email = login(
            &state,
            LoginRequest {
                email: "nobody@b.c".into(),
                password: "hunter2".into(),
            },
        )
        .await;
        assert!(matches!(unknown_email, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn concurrent_duplicate_registration_loses_exactly_once() {
        let state = test_state();

        let (first, second) = tokio::join!(
            register(&state, register_request("dup@b.c")),
            register(&state, register_request("dup@b.c")),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(matches!(
            [first, second].into_iter().find(|r| r.is_err()).unwrap(),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
