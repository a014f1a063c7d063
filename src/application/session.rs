//! Client-side session.
//!
//! The session starts *not ready*. It becomes ready exactly once: right away
//! when no token is stored, or after one identity fetch with the stored token.
//! Navigation decisions wait on that transition (see [`SessionManager::await_ready`]).
//!
//! Every state change bumps a generation counter. Identity fetches remember
//! the generation they started under and are dropped if it moved on, so a
//! reply that lands after a logout (or a newer login) cannot resurrect the
//! session or erase a newer token.

use crate::domain::{ApiError, Identity, SessionError};
use crate::infra::http::HttpClient;
use crate::infra::http::classify;
use crate::infra::storage::SessionStore;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub ready: bool,
    pub authenticated: bool,
    pub identity: Option<Identity>,
}

#[derive(Debug, Default)]
struct SessionState {
    ready: bool,
    /// Authenticated exactly when an identity is held.
    identity: Option<Identity>,
    generation: u64,
}

pub struct SessionManager {
    http: Arc<dyn HttpClient>,
    store: SessionStore,
    state: RwLock<SessionState>,
    ready_tx: watch::Sender<bool>,
}

impl SessionManager {
    /// Creates the session and starts resolving it.
    ///
    /// With a stored token the identity fetch runs on a spawned task, so this
    /// must be called from within a Tokio runtime.
    pub fn start(http: Arc<dyn HttpClient>, store: SessionStore) -> Arc<Self> {
        let (ready_tx, _) = watch::channel(false);
        let manager = Arc::new(Self {
            http,
            store,
            state: RwLock::new(SessionState::default()),
            ready_tx,
        });

        match manager.store.load() {
            None => {
                log::debug!("No stored token, session starts anonymous");
                manager.mark_ready();
            }
            Some(token) => {
                manager.http.set_authorization(Some(&token));
                let generation = manager.state.read().generation;
                let booting = Arc::clone(&manager);
                tokio::spawn(async move {
                    log::debug!("Restoring session from stored token");
                    let result = booting.fetch_identity().await;
                    if let Err(err) = booting.apply_identity(generation, result) {
                        log::info!("Stored session could not be restored: {}", err);
                    }
                    booting.mark_ready();
                });
            }
        }

        manager
    }

    fn mark_ready(&self) {
        {
            let mut state = self.state.write();
            if state.ready {
                return;
            }
            state.ready = true;
        }
        self.ready_tx.send_replace(true);
        log::debug!("Session is ready");
    }

    pub fn is_ready(&self) -> bool {
        self.state.read().ready
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().identity.is_some()
    }

    pub fn current_identity(&self) -> Result<Identity, SessionError> {
        self.state
            .read()
            .identity
            .clone()
            .ok_or(SessionError::NotAuthenticated)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            ready: state.ready,
            authenticated: state.identity.is_some(),
            identity: state.identity.clone(),
        }
    }

    /// Resolves once the session is ready; immediately after that.
    pub async fn await_ready(&self) {
        if self.is_ready() {
            return;
        }
        let mut ready_rx = self.ready_tx.subscribe();
        // The sender lives in `self`, so this only returns once ready is sent.
        let _ = ready_rx.wait_for(|ready| *ready).await;
    }

    /// Signs in and loads the user's identity.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        self.await_ready().await;
        let started = self.state.read().generation;

        let response = classify::post_json(
            self.http.as_ref(),
            "/auth/login",
            json!({ "username": username, "password": password }),
        )
        .await?;
        let token = response
            .header("authorization")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                log::warn!("Login response carried no authorization header");
                ApiError::Server
            })?
            .to_string();

        let generation = {
            let mut state = self.state.write();
            if state.generation != started {
                log::debug!("Login overtaken by a newer session change, dropping token");
                return Err(SessionError::Superseded);
            }
            state.generation += 1;
            // Unauthenticated until the new identity arrives.
            state.identity = None;
            self.store.save(&token);
            self.http.set_authorization(Some(&token));
            state.generation
        };

        let result = self.fetch_identity().await;
        let identity = self.apply_identity(generation, result)?;
        log::info!("Signed in as {}", identity.username);
        Ok(())
    }

    pub async fn sign_up(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        classify::post_json(
            self.http.as_ref(),
            "/auth/signup",
            json!({
                "first_name": first_name,
                "last_name": last_name,
                "username": username,
                "password": password,
            }),
        )
        .await?;
        log::info!("Registered account {}", username);
        Ok(())
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        self.await_ready().await;
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        classify::post_json(
            self.http.as_ref(),
            "/auth/change/password",
            json!({ "old_password": old_password, "new_password": new_password }),
        )
        .await?;
        Ok(())
    }

    /// Re-fetches the identity for the current token.
    pub async fn refresh_identity(&self) -> Result<Identity, SessionError> {
        self.await_ready().await;
        let generation = self.state.read().generation;
        let result = self.fetch_identity().await;
        self.apply_identity(generation, result)
    }

    /// Drops the session. Idempotent and never touches the network.
    pub fn logout(&self) {
        let mut state = self.state.write();
        state.generation += 1;
        state.identity = None;
        self.store.erase();
        self.http.set_authorization(None);
        log::debug!("Session cleared");
    }

    async fn fetch_identity(&self) -> Result<Identity, ApiError> {
        classify::get_data::<Identity>(self.http.as_ref(), "/auth/user").await
    }

    /// Applies an identity fetch started under `generation`.
    fn apply_identity(
        &self,
        generation: u64,
        result: Result<Identity, ApiError>,
    ) -> Result<Identity, SessionError> {
        let mut state = self.state.write();
        if state.generation != generation {
            log::debug!(
                "Dropping identity result from generation {} (now {})",
                generation,
                state.generation
            );
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(identity) => {
                state.identity = Some(identity.clone());
                Ok(identity)
            }
            Err(err) => {
                log::warn!("Identity fetch failed, clearing session: {}", err);
                state.identity = None;
                self.store.erase();
                self.http.set_authorization(None);
                Err(err.into())
            }
        }
    }
}
