//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered table scan, enabled routes only)
//!     → matcher.rs (anchored pattern match, converter checks)
//!     → Return: ResolverMatch { handler, name, params } or no match
//!
//! Table construction (at startup and on config reload):
//!     urls::urlpatterns()
//!     → parse every route expression
//!     → reject duplicate names
//!     → apply the configured disabled list
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes declared in code, toggled from config
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use matcher::{Converter, Params, PathPattern, PatternError, ReverseError};
pub use router::{ResolverMatch, Route, RouteError, RouteTable};
