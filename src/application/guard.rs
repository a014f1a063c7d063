//! Navigation guard.
//!
//! Every navigation waits for the session to become ready and is then
//! authorized against the target's route tags. Navigations are ticketed: when
//! a newer one starts while an older evaluation is still waiting, the older
//! one resolves as [`NavigationDecision::Aborted`] instead of redirecting.

use super::routes::{HOME_ROUTE, LOGIN_ROUTE, RouteMatch};
use super::session::{SessionManager, SessionSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(String),
    /// A newer navigation took over.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    pub login_route: String,
    pub home_route: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_route: LOGIN_ROUTE.to_string(),
            home_route: HOME_ROUTE.to_string(),
        }
    }
}

/// Identifies one navigation attempt, redirect hops included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTicket(u64);

pub struct NavigationGuard {
    session: Arc<SessionManager>,
    config: GuardConfig,
    latest: AtomicU64,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionManager>, config: GuardConfig) -> Self {
        Self {
            session,
            config,
            latest: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Starts a navigation, superseding any still in flight.
    pub fn begin(&self) -> NavigationTicket {
        NavigationTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: NavigationTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Evaluates a fresh navigation to `target`.
    pub async fn evaluate(&self, target: &RouteMatch) -> NavigationDecision {
        let ticket = self.begin();
        self.evaluate_with(ticket, target).await
    }

    /// Evaluates `target` as part of the navigation identified by `ticket`.
    pub async fn evaluate_with(
        &self,
        ticket: NavigationTicket,
        target: &RouteMatch,
    ) -> NavigationDecision {
        self.session.await_ready().await;
        if !self.is_current(ticket) {
            log::debug!("Navigation to {} superseded", target.name);
            return NavigationDecision::Aborted;
        }
        let decision = authorize(&self.session.snapshot(), target, &self.config);
        log::debug!("Navigation to {}: {:?}", target.name, decision);
        decision
    }
}

/// The authorization table, independent of readiness.
pub fn authorize(
    session: &SessionSnapshot,
    target: &RouteMatch,
    config: &GuardConfig,
) -> NavigationDecision {
    if target.requires_auth() && !session.authenticated {
        NavigationDecision::Redirect(config.login_route.clone())
    } else if target.requires_no_auth() && session.authenticated {
        NavigationDecision::Redirect(config.home_route.clone())
    } else {
        NavigationDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::routes::{RouteMeta, RouteRecord};
    use crate::infra::http::StubHttpClient;
    use crate::infra::storage::{MemoryStorage, SessionStore};

    fn target(meta: RouteMeta) -> RouteMatch {
        RouteMatch {
            name: "Target".into(),
            matched: vec![RouteRecord::new("Target", "/target", meta)],
        }
    }

    fn snapshot(authenticated: bool) -> SessionSnapshot {
        SessionSnapshot {
            ready: true,
            authenticated,
            identity: None,
        }
    }

    #[test]
    fn decision_table() {
        let config = GuardConfig::default();
        let cases = [
            (RouteMeta::AUTH, false, NavigationDecision::Redirect("Login".into())),
            (RouteMeta::AUTH, true, NavigationDecision::Allow),
            (RouteMeta::NO_AUTH, true, NavigationDecision::Redirect("Home".into())),
            (RouteMeta::NO_AUTH, false, NavigationDecision::Allow),
            (RouteMeta::PUBLIC, true, NavigationDecision::Allow),
            (RouteMeta::PUBLIC, false, NavigationDecision::Allow),
        ];
        for (meta, authenticated, expected) in cases {
            assert_eq!(
                authorize(&snapshot(authenticated), &target(meta), &config),
                expected,
                "meta={meta:?} authenticated={authenticated}"
            );
        }
    }

    #[test]
    fn route_with_both_tags_follows_table_order() {
        let meta = RouteMeta {
            requires_auth: true,
            requires_no_auth: true,
        };
        let config = GuardConfig::default();
        assert_eq!(
            authorize(&snapshot(false), &target(meta), &config),
            NavigationDecision::Redirect("Login".into())
        );
        assert_eq!(
            authorize(&snapshot(true), &target(meta), &config),
            NavigationDecision::Redirect("Home".into())
        );
    }

    #[tokio::test]
    async fn tickets_supersede_each_other() {
        let stub = Arc::new(StubHttpClient::new());
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let guard = NavigationGuard::new(SessionManager::start(stub, store), GuardConfig::default());

        let first = guard.begin();
        assert!(guard.is_current(first));
        let second = guard.begin();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert_eq!(
            guard.evaluate_with(first, &target(RouteMeta::PUBLIC)).await,
            NavigationDecision::Aborted
        );
        assert_eq!(
            guard.evaluate_with(second, &target(RouteMeta::AUTH)).await,
            NavigationDecision::Redirect("Login".into())
        );
    }
}
