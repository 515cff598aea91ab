//! In-memory route registry.
//!
//! Routes are kept in registration order, which is the order a listing shows
//! them in. Next to that list sits one radix tree per `(domain, method)` pair,
//! used to reject patterns the tree cannot hold (bad `{param}` syntax, a
//! second route at the same method + URI).

use std::collections::HashMap;

use matchit::Router as MatchitRouter;

use crate::error::{Error, Result};
use crate::method::Method;
use crate::middleware::{MiddlewareRegistry, PatternFilterRule, PatternFilters};
use crate::route::{Action, Route};

/// Read access to a set of registered routes.
///
/// This is all a listing needs from the application: the routes, the
/// middleware alias table, and the pattern-filter table. Implementations must
/// not change while a listing pass borrows them.
pub trait RouteRegistry {
    /// Every route, in registration order.
    fn routes(&self) -> &[Route];

    fn middleware(&self) -> &MiddlewareRegistry;

    fn pattern_filters(&self) -> &PatternFilters;
}

type TreeKey = (Option<String>, Method);

/// The application's route registry.
///
/// Build it once at startup. Each registration method returns `self` so calls
/// chain naturally; the `try_*` variants report errors instead of panicking.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    trees: HashMap<TreeKey, MatchitRouter<usize>>,
    middleware: MiddlewareRegistry,
    filters: PatternFilters,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. Returns `self` for chaining.
    ///
    /// ```rust
    /// use tsu_routes::{Action, Route, Router};
    ///
    /// let router = Router::new()
    ///     .route(Route::get("/users", Action::controller("UserController", "index")).named("users.index"))
    ///     .route(Route::post("/users", Action::controller("UserController", "store")));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the route tree rejects the URI. Use [`try_route`](Self::try_route)
    /// to handle that as an error.
    pub fn route(mut self, route: Route) -> Self {
        self.try_route(route).unwrap_or_else(|e| panic!("{e}"));
        self
    }

    /// Shorthand for a single-method route.
    pub fn on(self, method: Method, uri: &str, action: Action) -> Self {
        self.route(Route::new([method], uri, action))
    }

    pub fn try_route(&mut self, route: Route) -> Result<()> {
        let index = self.routes.len();
        let mut touched = Vec::with_capacity(route.methods().len());

        for &method in route.methods() {
            let key = (route.domain().map(str::to_owned), method);
            let inserted = self.trees.entry(key.clone()).or_default().insert(route.uri(), index);
            touched.push(key);

            if let Err(source) = inserted {
                // leave the registry as it was before this call
                for key in &touched {
                    self.rebuild(key);
                }
                return Err(Error::InvalidRoute { uri: route.uri().to_owned(), source });
            }
        }

        self.routes.push(route);
        Ok(())
    }

    fn rebuild(&mut self, key: &TreeKey) {
        let mut tree = MatchitRouter::new();
        for (i, route) in self.routes.iter().enumerate() {
            if route.domain() == key.0.as_deref() && route.methods().contains(&key.1) {
                // accepted once already
                let _ = tree.insert(route.uri(), i);
            }
        }
        self.trees.insert(key.clone(), tree);
    }

    /// Registers `name` as an alias for the middleware implementation `target`.
    pub fn alias_middleware(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.middleware.insert(name, target);
        self
    }

    /// Registers a pattern filter. Returns `self` for chaining.
    pub fn filter(mut self, rule: PatternFilterRule) -> Self {
        self.filters.push(rule);
        self
    }

    pub fn middleware_mut(&mut self) -> &mut MiddlewareRegistry {
        &mut self.middleware
    }

    pub fn filters_mut(&mut self) -> &mut PatternFilters {
        &mut self.filters
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The route with the given name, if any.
    pub fn named(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name() == Some(name))
    }
}

impl RouteRegistry for Router {
    fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn middleware(&self) -> &MiddlewareRegistry {
        &self.middleware
    }

    fn pattern_filters(&self) -> &PatternFilters {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Action {
        Action::controller("UserController", "index")
    }

    #[test]
    fn keeps_registration_order() {
        let router = Router::new()
            .route(Route::get("/users", users()))
            .route(Route::post("/users", users()))
            .route(Route::get("/", Action::Closure));

        let uris: Vec<_> = router.routes().iter().map(Route::uri).collect();
        assert_eq!(uris, ["/users", "/users", "/"]);
    }

    #[test]
    fn same_uri_under_other_methods_is_allowed() {
        let mut router =
            Router::new().route(Route::get("/users/{id}", users()).named("users.show"));
        router.try_route(Route::delete("/users/{id}", users()).named("users.destroy")).unwrap();

        assert_eq!(router.len(), 2);
        assert_eq!(router.named("users.destroy").map(Route::methods), Some(&[Method::Delete][..]));
    }

    #[test]
    fn same_uri_on_another_domain_is_allowed() {
        let mut router = Router::new().route(Route::get("/", Action::Closure));
        router.try_route(Route::get("/", Action::Closure).on_domain("api.example.com")).unwrap();
        assert_eq!(router.len(), 2);

        let err = router
            .try_route(Route::get("/", Action::Closure).on_domain("api.example.com"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
        assert_eq!(router.routes()[1].domain(), Some("api.example.com"));
    }

    #[test]
    fn duplicate_route_is_rejected_without_side_effects() {
        let mut router = Router::new().route(Route::get("/users", users()));

        // POST is free, GET is taken
        let err = router
            .try_route(Route::new([Method::Post, Method::Get], "/users", users()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { ref uri, .. } if uri == "/users"));
        assert_eq!(router.len(), 1);

        // the failed attempt left nothing behind in the POST tree
        router.try_route(Route::post("/users", users())).unwrap();
        assert_eq!(router.len(), 2);
    }

    #[test]
    #[should_panic(expected = "invalid route `/users/{`")]
    fn route_panics_on_bad_pattern() {
        let _ = Router::new().route(Route::get("/users/{", users()));
    }

    #[test]
    fn named_finds_route() {
        let router = Router::new().route(Route::get("/users", users()).named("users.index"));
        assert_eq!(router.named("users.index").map(Route::uri), Some("/users"));
        assert!(router.named("posts.index").is_none());
    }
}
