//! Route records and the default route table.

use serde::{Deserialize, Serialize};

pub const HOME_ROUTE: &str = "Home";
pub const LOGIN_ROUTE: &str = "Login";

/// Authorization tags a route may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub requires_no_auth: bool,
}

impl RouteMeta {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        requires_no_auth: false,
    };
    pub const AUTH: Self = Self {
        requires_auth: true,
        requires_no_auth: false,
    };
    pub const NO_AUTH: Self = Self {
        requires_auth: false,
        requires_no_auth: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub meta: RouteMeta,
    /// Static redirect applied before any guard runs.
    #[serde(default)]
    pub redirect: Option<String>,
    /// Enclosing route, for nested layouts.
    #[serde(default)]
    pub parent: Option<String>,
}

impl RouteRecord {
    pub fn new(name: &str, path: &str, meta: RouteMeta) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            meta,
            redirect: None,
            parent: None,
        }
    }

    pub fn redirecting(name: &str, path: &str, target: &str) -> Self {
        Self {
            redirect: Some(target.to_string()),
            ..Self::new(name, path, RouteMeta::PUBLIC)
        }
    }

    pub fn under(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }
}

/// A resolved navigation target: the route plus every enclosing route,
/// outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub name: String,
    pub matched: Vec<RouteRecord>,
}

impl RouteMatch {
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|record| record.meta.requires_auth)
    }

    pub fn requires_no_auth(&self) -> bool {
        self.matched.iter().any(|record| record.meta.requires_no_auth)
    }

    pub fn leaf(&self) -> Option<&RouteRecord> {
        self.matched.last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            RouteRecord::redirecting(HOME_ROUTE, "/", "OutReviews"),
            RouteRecord::new("OutReviews", "/outgoing", RouteMeta::AUTH),
            RouteRecord::new("InReviews", "/incoming", RouteMeta::AUTH),
            RouteRecord::new("NewReview", "/review/new", RouteMeta::AUTH),
            RouteRecord::new("Review", "/review/:id", RouteMeta::AUTH),
            RouteRecord::new(LOGIN_ROUTE, "/login", RouteMeta::NO_AUTH),
            RouteRecord::new("SignUp", "/signup", RouteMeta::NO_AUTH),
            RouteRecord::new("Profile", "/profile", RouteMeta::AUTH),
        ])
    }
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    fn record(&self, name: &str) -> Option<&RouteRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// Resolves a route by name together with its enclosing routes.
    pub fn resolve(&self, name: &str) -> Option<RouteMatch> {
        let mut chain = vec![self.record(name)?.clone()];
        while let Some(parent) = chain.last().and_then(|record| record.parent.clone()) {
            if chain.iter().any(|record| record.name == parent) || chain.len() > self.records.len()
            {
                log::warn!("Route {} has a cyclic parent chain", name);
                break;
            }
            match self.record(&parent) {
                Some(record) => chain.push(record.clone()),
                None => {
                    log::warn!("Route {} names unknown parent {}", name, parent);
                    break;
                }
            }
        }
        chain.reverse();
        Some(RouteMatch {
            name: name.to_string(),
            matched: chain,
        })
    }
}
