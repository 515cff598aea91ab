//! Route descriptors: the listing of every route with its resolved middleware.
//!
//! One pass walks the registry in order. For each route it
//!
//! 1. replays the URI once per method against the pattern filters,
//! 2. instantiates the controller (unless the action is a closure) and keeps
//!    the middleware it declares for the action method,
//! 3. folds route, pattern and controller middleware into one chain,
//!
//! then drops the routes the [`ListOptions`] filter out. A pass either yields
//! the full listing or fails: there is no partial result.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::method::Method;
use crate::middleware::{ControllerFactory, MiddlewareRegistry, PatternFilters, chain, controller};
use crate::route::Route;
use crate::router::RouteRegistry;

// ── Descriptor ────────────────────────────────────────────────────────────────

/// The display-ready summary of one route.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RouteDescriptor {
    pub domain: Option<String>,
    /// Methods joined with `|`, e.g. `GET|HEAD`.
    pub method: String,
    pub uri: String,
    pub name: Option<String>,
    /// `Closure` or `Class@method`.
    pub action: String,
    /// Resolved middleware joined with `, `.
    pub middleware: String,
}

impl RouteDescriptor {
    /// The six cells in display order, absent values as empty strings.
    pub fn columns(&self) -> [&str; 6] {
        [
            self.domain.as_deref().unwrap_or(""),
            &self.method,
            &self.uri,
            self.name.as_deref().unwrap_or(""),
            &self.action,
            &self.middleware,
        ]
    }

    fn column(&self, key: SortKey) -> &str {
        self.columns()[key as usize]
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Descriptor column to sort a listing by.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Domain = 0,
    Method = 1,
    Uri = 2,
    Name = 3,
    Action = 4,
    Middleware = 5,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(Self::Domain),
            "method" => Ok(Self::Method),
            "uri" => Ok(Self::Uri),
            "name" => Ok(Self::Name),
            "action" => Ok(Self::Action),
            "middleware" => Ok(Self::Middleware),
            other => Err(format!("unknown sort column `{other}`")),
        }
    }
}

/// Which routes a listing shows, and in what order.
///
/// An empty string filter means the same as no filter.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ListOptions {
    /// Keep routes whose name contains this. Unnamed routes never match.
    pub name: Option<String>,
    /// Keep routes whose URI contains this.
    pub path: Option<String>,
    /// Keep routes answering this verb, compared case-insensitively.
    pub method: Option<String>,
    pub sort: Option<SortKey>,
    pub reverse: bool,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Whether `descriptor` survives the name, path and method filters.
    pub fn keeps(&self, descriptor: &RouteDescriptor) -> bool {
        if let Some(name) = set(&self.name) {
            match &descriptor.name {
                Some(route_name) if route_name.contains(name) => {}
                _ => return false,
            }
        }
        if let Some(path) = set(&self.path) {
            if !descriptor.uri.contains(path) {
                return false;
            }
        }
        if let Some(method) = set(&self.method) {
            if !descriptor.method.contains(&method.to_ascii_uppercase()) {
                return false;
            }
        }
        true
    }
}

fn set(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|f| !f.is_empty())
}

// ── Listing ───────────────────────────────────────────────────────────────────

/// The result of a listing pass.
///
/// Empty when routes exist but the filters excluded all of them; a registry
/// with no routes at all is [`Error::EmptyRegistry`] instead.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RouteList {
    routes: Vec<RouteDescriptor>,
}

impl RouteList {
    /// Column titles, in the order of [`RouteDescriptor::columns`].
    pub const HEADERS: [&'static str; 6] =
        ["Domain", "Method", "URI", "Name", "Action", "Middleware"];

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteDescriptor> {
        self.routes.iter()
    }

    pub fn as_slice(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn into_vec(self) -> Vec<RouteDescriptor> {
        self.routes
    }

    /// Turns an empty listing into [`Error::NoMatchingRoutes`].
    pub fn require_matches(self) -> Result<Self> {
        if self.is_empty() {
            Err(Error::NoMatchingRoutes)
        } else {
            Ok(self)
        }
    }

    /// The listing as a JSON array of descriptors.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl IntoIterator for RouteList {
    type Item = RouteDescriptor;
    type IntoIter = std::vec::IntoIter<RouteDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

impl<'a> IntoIterator for &'a RouteList {
    type Item = &'a RouteDescriptor;
    type IntoIter = std::slice::Iter<'a, RouteDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Resolves the middleware of every route in a [`RouteRegistry`].
pub struct RouteLister<'a, R: ?Sized, F: ?Sized> {
    registry: &'a R,
    controllers: &'a F,
}

impl<'a, R, F> RouteLister<'a, R, F>
where
    R: RouteRegistry + ?Sized,
    F: ControllerFactory + ?Sized,
{
    pub fn new(registry: &'a R, controllers: &'a F) -> Self {
        Self { registry, controllers }
    }

    /// Lists the registry's routes.
    ///
    /// Every route is resolved before filtering, so a controller that cannot
    /// be instantiated fails the pass even when its route would be filtered
    /// out.
    pub fn list(&self, options: &ListOptions) -> Result<RouteList> {
        build(
            self.registry.routes(),
            self.registry.middleware(),
            self.registry.pattern_filters(),
            self.controllers,
            options,
        )
    }

    /// Descriptor for a single route.
    pub fn describe(&self, route: &Route) -> Result<RouteDescriptor> {
        describe(
            route,
            self.registry.middleware(),
            self.registry.pattern_filters(),
            self.controllers,
        )
    }

    /// The resolved, deduplicated middleware of a single route.
    pub fn middleware_for(&self, route: &Route) -> Result<Vec<String>> {
        resolve_middleware(
            route,
            self.registry.middleware(),
            self.registry.pattern_filters(),
            self.controllers,
        )
    }
}

/// Lists `registry`, instantiating controllers through `controllers`.
pub fn list<R, F>(registry: &R, controllers: &F, options: &ListOptions) -> Result<RouteList>
where
    R: RouteRegistry + ?Sized,
    F: ControllerFactory + ?Sized,
{
    RouteLister::new(registry, controllers).list(options)
}

/// Builds the listing for `routes`.
pub fn build<F>(
    routes: &[Route],
    aliases: &MiddlewareRegistry,
    filters: &PatternFilters,
    controllers: &F,
    options: &ListOptions,
) -> Result<RouteList>
where
    F: ControllerFactory + ?Sized,
{
    if routes.is_empty() {
        return Err(Error::EmptyRegistry);
    }

    debug!(
        routes = routes.len(),
        name = ?options.name,
        path = ?options.path,
        method = ?options.method,
        "listing routes"
    );

    let mut descriptors = routes
        .iter()
        .map(|route| describe(route, aliases, filters, controllers))
        .collect::<Result<Vec<_>>>()?;

    descriptors.retain(|d| options.keeps(d));

    if let Some(key) = options.sort {
        // stable: ties keep registration order
        descriptors.sort_by(|a, b| compare(a, b, key));
    }
    if options.reverse {
        descriptors.reverse();
    }

    debug!(kept = descriptors.len(), "routes listed");
    Ok(RouteList { routes: descriptors })
}

fn compare(a: &RouteDescriptor, b: &RouteDescriptor, key: SortKey) -> Ordering {
    a.column(key).cmp(b.column(key))
}

/// Descriptor for one route.
pub fn describe<F>(
    route: &Route,
    aliases: &MiddlewareRegistry,
    filters: &PatternFilters,
    controllers: &F,
) -> Result<RouteDescriptor>
where
    F: ControllerFactory + ?Sized,
{
    let middleware = resolve_middleware(route, aliases, filters, controllers)?;
    trace!(uri = route.uri(), middleware = middleware.len(), "route resolved");

    Ok(RouteDescriptor {
        domain: route.domain().map(str::to_owned),
        method: Method::join(route.methods()),
        uri: route.uri().to_owned(),
        name: route.name().map(str::to_owned),
        action: route.action().name(),
        middleware: middleware.join(", "),
    })
}

/// Route, pattern-filter and controller middleware of `route`, folded.
pub fn resolve_middleware<F>(
    route: &Route,
    aliases: &MiddlewareRegistry,
    filters: &PatternFilters,
    controllers: &F,
) -> Result<Vec<String>>
where
    F: ControllerFactory + ?Sized,
{
    let patterns = filters.match_route(route.uri(), route.methods().iter().map(|m| m.as_str()));

    let from_controller = match route.action().controller_parts()? {
        Some((class, method)) => {
            let instance = controllers.instantiate(class)?;
            controller::resolve(&*instance, method, aliases)
        }
        None => Vec::new(),
    };

    Ok(chain::compose(route.route_middleware(), patterns, from_controller))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::middleware::{Controller, ControllerMiddleware, Controllers, PatternFilterRule};
    use crate::route::Action;
    use crate::router::Router;

    fn aliases() -> MiddlewareRegistry {
        [("auth", "App\\Middleware\\Authenticate")].into_iter().collect()
    }

    fn controllers() -> Controllers {
        Controllers::new().declare(
            "UserController",
            [
                ControllerMiddleware::new("auth").except(["index"]),
                ControllerMiddleware::new("web"),
            ],
        )
    }

    fn filters() -> PatternFilters {
        let mut filters = PatternFilters::new();
        filters.add(["POST"], "^/users", "csrf").unwrap();
        filters
    }

    #[test]
    fn route_then_pattern_then_controller() {
        let action = Action::controller("UserController", "update");
        let route = Route::new([Method::Get, Method::Post], "/users/{id}", action)
            .middleware(["web", "web"]);

        let middleware =
            resolve_middleware(&route, &aliases(), &filters(), &controllers()).unwrap();
        assert_eq!(middleware, ["web", "csrf", "App\\Middleware\\Authenticate"]);
    }

    #[test]
    fn closure_routes_never_instantiate() {
        let refuse = |class: &str| -> Result<Box<dyn Controller>> {
            Err(Error::instantiation(class, "should not be called"))
        };
        let route = Route::get("/", Action::Closure).middleware(["web"]);

        let descriptor = describe(&route, &aliases(), &filters(), &refuse).unwrap();
        assert_eq!(descriptor.action, "Closure");
        assert_eq!(descriptor.middleware, "web");
    }

    #[test]
    fn descriptor_fields() {
        let route = Route::get("/users", Action::controller("UserController", "index"))
            .named("users.index")
            .on_domain("api.example.com");

        let descriptor = describe(&route, &aliases(), &filters(), &controllers()).unwrap();
        assert_eq!(
            descriptor.columns(),
            ["api.example.com", "GET|HEAD", "/users", "users.index", "UserController@index", "web"],
        );
    }

    #[test]
    fn malformed_controller_action_propagates() {
        let route = Route::get("/", Action::controller("UserController", ""));
        let err = describe(&route, &aliases(), &filters(), &controllers()).unwrap_err();
        assert!(matches!(err, Error::MalformedAction(ref a) if a == "UserController@"));
    }

    #[test]
    fn lister_resolves_single_routes_against_its_registry() {
        let router = Router::new()
            .alias_middleware("auth", "App\\Middleware\\Authenticate")
            .filter(PatternFilterRule::new("POST", "^/users", "csrf").unwrap())
            .route(
                Route::post("/users", Action::controller("UserController", "store"))
                    .named("users.store"),
            );
        let controllers = controllers();
        let lister = RouteLister::new(&router, &controllers);

        let route = router.named("users.store").unwrap();
        assert_eq!(
            lister.middleware_for(route).unwrap(),
            ["csrf", "App\\Middleware\\Authenticate", "web"],
        );

        let descriptor = lister.describe(route).unwrap();
        assert_eq!(descriptor.name.as_deref(), Some("users.store"));
        assert_eq!(descriptor.middleware, "csrf, App\\Middleware\\Authenticate, web");
        assert_eq!(lister.list(&ListOptions::new()).unwrap().as_slice(), [descriptor]);
    }

    #[test]
    fn empty_filters_are_ignored() {
        let descriptor = RouteDescriptor {
            domain: None,
            method: "GET|HEAD".into(),
            uri: "/posts".into(),
            name: None,
            action: "Closure".into(),
            middleware: String::new(),
        };
        assert!(ListOptions::new().name("").path("").keeps(&descriptor));
        assert!(!ListOptions::new().name("posts").keeps(&descriptor));
        assert!(ListOptions::new().method("head").keeps(&descriptor));
        assert!(!ListOptions::new().method("post").keeps(&descriptor));
    }

    #[test]
    fn sort_key_parses_column_names() {
        assert_eq!("uri".parse::<SortKey>(), Ok(SortKey::Uri));
        assert!("size".parse::<SortKey>().is_err());
    }
}
