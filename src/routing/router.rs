//! Route table lookup and reverse resolution.
//!
//! # Responsibilities
//! - Store routes in declaration order
//! - Resolve a request path to the first enabled matching route
//! - Build URLs from route names (reverse lookup)
//! - Keep disabled routes in the table without ever resolving them
//!
//! # Design Decisions
//! - Immutable after construction (shared via `ArcSwap`, swapped on reload)
//! - O(n) scan in declaration order: first match wins
//! - Names are unique across the whole table, disabled routes included
//! - Explicit `None` for no match rather than a silent default

use std::collections::HashSet;

use thiserror::Error;

use super::matcher::{Params, PathPattern, PatternError, ReverseError};

/// Error raised while building or querying a route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("route name '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("no route named '{0}'")]
    UnknownName(String),
    #[error("route '{0}' is disabled")]
    Disabled(String),
    #[error("cannot reverse '{name}': {source}")]
    NoReverseMatch {
        name: String,
        #[source]
        source: ReverseError,
    },
}

/// A single (pattern, handler, name) entry.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pattern: PathPattern,
    handler: H,
    name: String,
    enabled: bool,
}

impl<H> Route<H> {
    /// Declare an enabled route.
    pub fn new(route: &str, handler: H, name: impl Into<String>) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: PathPattern::parse(route)?,
            handler,
            name: name.into(),
            enabled: true,
        })
    }

    /// Mark the route as present but inactive.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Result of a successful resolution.
#[derive(Debug)]
pub struct ResolverMatch<'a, H> {
    pub handler: &'a H,
    pub name: &'a str,
    pub route: &'a str,
    pub params: Params,
}

/// Ordered, immutable routing table.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> RouteTable<H> {
    /// Build a table, rejecting duplicate names.
    pub fn new(routes: Vec<Route<H>>) -> Result<Self, RouteError> {
        let mut names = HashSet::new();
        for route in &routes {
            if !names.insert(route.name.as_str()) {
                return Err(RouteError::DuplicateName(route.name.clone()));
            }
        }
        Ok(Self { routes })
    }

    /// Find the first enabled route matching `path`.
    ///
    /// `path` may be given with or without its leading `/`.
    pub fn resolve(&self, path: &str) -> Option<ResolverMatch<'_, H>> {
        let path = path.strip_prefix('/').unwrap_or(path);
        self.routes
            .iter()
            .filter(|r| r.enabled)
            .find_map(|r| {
                r.pattern.matches(path).map(|params| ResolverMatch {
                    handler: &r.handler,
                    name: &r.name,
                    route: r.pattern.as_str(),
                    params,
                })
            })
    }

    /// Build the URL for an enabled named route.
    pub fn reverse(&self, name: &str, params: &Params) -> Result<String, RouteError> {
        let route = self
            .get(name)
            .ok_or_else(|| RouteError::UnknownName(name.to_string()))?;
        if !route.enabled {
            return Err(RouteError::Disabled(name.to_string()));
        }
        route
            .pattern
            .reverse(params)
            .map_err(|source| RouteError::NoReverseMatch {
                name: name.to_string(),
                source,
            })
    }

    /// Slash-suffixed path to redirect to, if `path` only misses its trailing `/`.
    pub fn append_slash_candidate(&self, path: &str) -> Option<String> {
        if path.ends_with('/') {
            return None;
        }
        let candidate = format!("{}/", path);
        self.resolve(&candidate).map(|_| candidate)
    }

    pub fn get(&self, name: &str) -> Option<&Route<H>> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<H: Clone> RouteTable<H> {
    /// Copy of this table with exactly `names` disabled.
    pub fn with_disabled<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, RouteError> {
        if let Some(unknown) = names.iter().find(|n| self.get(n.as_ref()).is_none()) {
            return Err(RouteError::UnknownName(unknown.as_ref().to_string()));
        }
        let routes = self
            .routes
            .iter()
            .map(|r| {
                let disabled = names.iter().any(|n| n.as_ref() == r.name);
                r.clone().with_enabled(!disabled)
            })
            .collect();
        Ok(Self { routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        RouteTable::new(vec![
            Route::new("", "home", "home").unwrap(),
            Route::new("items/<int:id>/", "item", "item").unwrap(),
            Route::new("items/<slug:tag>/", "tag", "tag").unwrap(),
            Route::new("old/", "old", "old").unwrap().disabled(),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let table = table();
        let m = table.resolve("/items/12/").unwrap();
        assert_eq!(*m.handler, "item");
        assert_eq!(m.params.get("id").map(String::as_str), Some("12"));

        let m = table.resolve("items/hazy/").unwrap();
        assert_eq!(*m.handler, "tag");
        assert_eq!(m.route, "items/<slug:tag>/");
    }

    #[test]
    fn test_disabled_route_never_resolves() {
        let table = table();
        assert!(table.resolve("/old/").is_none());
        assert_eq!(
            table.reverse("old", &Params::new()),
            Err(RouteError::Disabled("old".into()))
        );
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = RouteTable::new(vec![
            Route::new("a/", 1, "same").unwrap(),
            Route::new("b/", 2, "same").unwrap().disabled(),
        ]);
        assert_eq!(result.unwrap_err(), RouteError::DuplicateName("same".into()));
    }

    #[test]
    fn test_reverse_lookup() {
        let table = table();
        assert_eq!(table.reverse("home", &Params::new()).unwrap(), "/");
        let mut params = Params::new();
        params.insert("id".into(), "5".into());
        assert_eq!(table.reverse("item", &params).unwrap(), "/items/5/");
        assert_eq!(
            table.reverse("nope", &Params::new()),
            Err(RouteError::UnknownName("nope".into()))
        );
    }

    #[test]
    fn test_append_slash_candidate() {
        let table = table();
        assert_eq!(table.append_slash_candidate("/items/3"), Some("/items/3/".into()));
        assert_eq!(table.append_slash_candidate("/items/3/"), None);
        assert_eq!(table.append_slash_candidate("/old"), None);
        assert_eq!(table.append_slash_candidate("/missing"), None);
    }

    #[test]
    fn test_with_disabled() {
        let table = table().with_disabled(&["home"]).unwrap();
        assert!(table.resolve("/").is_none());
        assert!(table.resolve("/old/").is_some());
        assert_eq!(
            table.with_disabled(&["ghost"]).unwrap_err(),
            RouteError::UnknownName("ghost".into())
        );
    }
}
