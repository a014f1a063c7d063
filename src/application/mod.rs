//! Application services: session, navigation and review workflows.
//!
//! Services receive their collaborators explicitly; [`crate::state::AppState`]
//! wires one instance of each at startup.

pub mod guard;
pub mod reviews;
pub mod router;
pub mod routes;
pub mod session;

pub use guard::{GuardConfig, NavigationDecision, NavigationGuard};
pub use reviews::{ReviewInbox, ReviewsService};
pub use router::{NavigationError, NavigationOutcome, Router};
pub use routes::{RouteMatch, RouteMeta, RouteRecord, RouteTable};
pub use session::{SessionManager, SessionSnapshot};
