//! Resolves named navigations through the guard and tracks the current route.

use super::guard::{NavigationDecision, NavigationGuard};
use super::routes::{RouteMatch, RouteTable};
use parking_lot::RwLock;
use thiserror::Error;

/// Redirect hops allowed within a single navigation.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Navigation to {from} redirected more than {limit} times")]
    TooManyRedirects { from: String, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The navigation landed on this route, possibly after redirects.
    Arrived(RouteMatch),
    Aborted,
}

pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    current: RwLock<Option<RouteMatch>>,
}

impl Router {
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        Self {
            table,
            guard,
            current: RwLock::new(None),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn current(&self) -> Option<RouteMatch> {
        self.current.read().clone()
    }

    pub async fn push(&self, name: &str) -> Result<NavigationOutcome, NavigationError> {
        let ticket = self.guard.begin();
        let mut target_name = name.to_string();
        let mut hops = 0;

        loop {
            let target = self
                .table
                .resolve(&target_name)
                .ok_or_else(|| NavigationError::UnknownRoute(target_name.clone()))?;

            let decision = match target.leaf().and_then(|leaf| leaf.redirect.clone()) {
                Some(redirect) => NavigationDecision::Redirect(redirect),
                None => self.guard.evaluate_with(ticket, &target).await,
            };

            match decision {
                NavigationDecision::Allow => {
                    let mut current = self.current.write();
                    if !self.guard.is_current(ticket) {
                        return Ok(NavigationOutcome::Aborted);
                    }
                    log::info!("Navigated to {}", target.name);
                    *current = Some(target.clone());
                    return Ok(NavigationOutcome::Arrived(target));
                }
                NavigationDecision::Redirect(next) => {
                    hops += 1;
                    if hops > MAX_REDIRECTS {
                        return Err(NavigationError::TooManyRedirects {
                            from: name.to_string(),
                            limit: MAX_REDIRECTS,
                        });
                    }
                    log::debug!("Redirecting {} -> {}", target_name, next);
                    target_name = next;
                }
                NavigationDecision::Aborted => return Ok(NavigationOutcome::Aborted),
            }
        }
    }
}
