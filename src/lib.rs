//! # tsu-routes
//!
//! Route introspection for tsu applications: every registered route, and the
//! exact middleware a request to it passes through.
//!
//! ## Where middleware comes from
//!
//! A route's middleware is not just what was attached to it. Three sources
//! are folded together, in this order:
//!
//! - **Route middleware** attached at registration
//! - **Pattern filters** whose expression matches the route URI, checked once
//!   per HTTP method the route answers to
//! - **Controller middleware** the action's controller declares, narrowed by
//!   `only` / `except`
//!
//! The first occurrence of an identifier keeps its place; later duplicates
//! are dropped. Getting this wrong silently changes which authentication or
//! validation code runs, so the listing either resolves every route or fails:
//! a controller that cannot be instantiated aborts the whole pass.
//!
//! ## Quick start
//!
//! ```rust
//! use tsu_routes::{Action, ControllerMiddleware, Controllers, ListOptions, Route, Router};
//!
//! let router = Router::new()
//!     .alias_middleware("auth", "App\\Http\\Middleware\\Authenticate")
//!     .route(Route::get("/users", Action::controller("UserController", "index")).named("users.index"))
//!     .route(Route::get("/users/{id}", Action::controller("UserController", "show")).named("users.show"))
//!     .route(Route::get("/", Action::Closure).middleware(["web"]));
//!
//! let controllers = Controllers::new().declare(
//!     "UserController",
//!     [ControllerMiddleware::new("auth").except(["index"])],
//! );
//!
//! let routes = tsu_routes::list(&router, &controllers, &ListOptions::new().name("users")).unwrap();
//!
//! assert_eq!(routes.len(), 2);
//! assert_eq!(routes.as_slice()[0].middleware, "");
//! assert_eq!(routes.as_slice()[1].middleware, "App\\Http\\Middleware\\Authenticate");
//! ```

mod describe;
mod error;
mod manifest;
mod method;
mod route;
mod router;

pub mod middleware;

pub use describe::{
    ListOptions, RouteDescriptor, RouteList, RouteLister, SortKey, build, describe, list,
    resolve_middleware,
};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use method::{Method, UnknownMethod};
pub use middleware::{
    Controller, ControllerFactory, ControllerMiddleware, Controllers, MiddlewareOptions,
    MiddlewareRegistry, PatternFilterRule, PatternFilters,
};
pub use route::{Action, Route};
pub use router::{RouteRegistry, Router};
