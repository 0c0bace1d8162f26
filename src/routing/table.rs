//! Route table
//!
//! Per-verb ordered route lists. Populated once during setup and read-only
//! afterwards. Lookup order is registration order; nothing is deduplicated.

use super::handler::Handler;
use super::pattern::Pattern;
use crate::error::RouteError;
use hyper::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// Methods a route can be registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub const ALL: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A (verb, pattern, handler) binding
pub struct Route {
    pub verb: Verb,
    pub pattern: Pattern,
    pub handler: Arc<dyn Handler>,
    /// Whether the dispatcher runs its gate before this handler
    pub gated: bool,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("verb", &self.verb)
            .field("pattern", &self.pattern.template())
            .field("gated", &self.gated)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<Verb, Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an open route
    pub fn register(
        &mut self,
        verb: Verb,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.add(verb, template, Arc::new(handler), false)
    }

    /// Append a route the gate must approve first
    pub fn register_gated(
        &mut self,
        verb: Verb,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.add(verb, template, Arc::new(handler), true)
    }

    pub fn get(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.register(Verb::Get, template, handler)
    }

    pub fn post(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.register(Verb::Post, template, handler)
    }

    pub fn put(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.register(Verb::Put, template, handler)
    }

    pub fn delete(
        &mut self,
        template: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        self.register(Verb::Delete, template, handler)
    }

    fn add(
        &mut self,
        verb: Verb,
        template: &str,
        handler: Arc<dyn Handler>,
        gated: bool,
    ) -> Result<&mut Self, RouteError> {
        let pattern = Pattern::parse(template)?;
        let found = pattern.signature();
        if found.as_slice() != handler.signature() {
            return Err(RouteError::SignatureMismatch {
                template: template.to_string(),
                expected: handler.signature().to_vec(),
                found,
            });
        }

        self.routes.entry(verb).or_default().push(Route {
            verb,
            pattern,
            handler,
            gated,
        });
        Ok(self)
    }

    /// Routes for `method` in registration order; empty for unknown methods
    pub fn routes_for(&self, method: &Method) -> &[Route] {
        Verb::from_method(method)
            .and_then(|verb| self.routes.get(&verb))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Verbs that have at least one route, in canonical order
    pub fn allowed_methods(&self) -> Vec<&'static str> {
        Verb::ALL
            .into_iter()
            .filter(|verb| self.routes.get(verb).is_some_and(|r| !r.is_empty()))
            .map(Verb::as_str)
            .collect()
    }

    /// Total number of registered routes
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All routes grouped by verb, for startup logging
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        Verb::ALL
            .into_iter()
            .filter_map(move |verb| self.routes.get(&verb))
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_text_response;
    use crate::routing::handler::{handler, with_id};
    use crate::routing::ParamKind;
    use hyper::StatusCode;

    fn ok() -> impl Handler {
        handler(|_| Ok(build_text_response(StatusCode::OK, "ok")))
    }

    #[test]
    fn test_register_appends_in_order() {
        let mut table = RouteTable::new();
        table.get("/a", ok()).unwrap().get("/b", ok()).unwrap();
        let templates: Vec<&str> = table
            .routes_for(&Method::GET)
            .iter()
            .map(|r| r.pattern.template())
            .collect();
        assert_eq!(templates, vec!["/a", "/b"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut table = RouteTable::new();
        table.get("/a", ok()).unwrap();
        table.get("/a", ok()).unwrap();
        assert_eq!(table.routes_for(&Method::GET).len(), 2);
    }

    #[test]
    fn test_routes_for_unknown_method_is_empty() {
        let mut table = RouteTable::new();
        table.get("/a", ok()).unwrap();
        assert!(table.routes_for(&Method::PATCH).is_empty());
        assert!(table.routes_for(&Method::PUT).is_empty());
        let custom = Method::from_bytes(b"PURGE").unwrap();
        assert!(table.routes_for(&custom).is_empty());
    }

    #[test]
    fn test_signature_mismatch_rejected() {
        let mut table = RouteTable::new();
        let err = table.get("/items/{id:int}", ok()).unwrap_err();
        assert_eq!(
            err,
            RouteError::SignatureMismatch {
                template: "/items/{id:int}".to_string(),
                expected: vec![],
                found: vec![ParamKind::Int],
            }
        );

        let with_param = with_id(|_, _| Ok(build_text_response(StatusCode::OK, "ok")));
        assert!(table.get("/items/{name:str}", with_param).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_allowed_methods() {
        let mut table = RouteTable::new();
        table.delete("/a", ok()).unwrap().get("/a", ok()).unwrap();
        assert_eq!(table.allowed_methods(), vec!["GET", "DELETE"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_gated_flag() {
        let mut table = RouteTable::new();
        table.register_gated(Verb::Post, "/a", ok()).unwrap();
        table.register(Verb::Post, "/b", ok()).unwrap();
        let routes = table.routes_for(&Method::POST);
        assert!(routes[0].gated);
        assert!(!routes[1].gated);
    }
}
