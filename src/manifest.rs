//! Declarative route manifests.
//!
//! A manifest describes a whole registry in TOML: the middleware alias table,
//! the pattern filters, the controllers with their declared middleware, and
//! the routes.
//!
//! ```toml
//! [middleware]
//! auth = "App\\Http\\Middleware\\Authenticate"
//!
//! [[filters]]
//! methods = ["POST", "PUT"]
//! regex = "^/admin"
//! name = "csrf"
//!
//! [[controllers]]
//! class = "UserController"
//! middleware = [{ name = "auth", except = ["index"] }]
//!
//! [[routes]]
//! methods = ["GET", "HEAD"]
//! uri = "/users"
//! name = "users.index"
//! action = "UserController@index"
//! middleware = ["web"]
//! ```
//!
//! A filter takes exactly one of `regex` (searched in the URI) or `pattern`
//! (a glob such as `admin/*`). A route without `action` is a closure.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{Error, Result};
use crate::method::Method;
use crate::middleware::{ControllerMiddleware, Controllers};
use crate::route::{Action, Route};
use crate::router::Router;

/// Parsed manifest. Turn it into a registry with [`Manifest::into_parts`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    middleware: BTreeMap<String, String>,
    filters: Vec<FilterConfig>,
    controllers: Vec<ControllerConfig>,
    routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(try_from = "FilterEntry")]
struct FilterConfig {
    methods: Vec<String>,
    expr: FilterExpr,
    name: String,
}

#[derive(Debug)]
enum FilterExpr {
    Regex(String),
    Glob(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterEntry {
    methods: Vec<String>,
    regex: Option<String>,
    pattern: Option<String>,
    name: String,
}

impl TryFrom<FilterEntry> for FilterConfig {
    type Error = String;

    fn try_from(entry: FilterEntry) -> Result<Self, Self::Error> {
        let expr = match (entry.regex, entry.pattern) {
            (Some(regex), None) => FilterExpr::Regex(regex),
            (None, Some(pattern)) => FilterExpr::Glob(pattern),
            (Some(_), Some(_)) => {
                return Err(format!("filter `{}` sets both `regex` and `pattern`", entry.name));
            }
            (None, None) => {
                return Err(format!("filter `{}` needs `regex` or `pattern`", entry.name));
            }
        };
        Ok(Self { methods: entry.methods, expr, name: entry.name })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ControllerConfig {
    class: String,
    #[serde(default)]
    middleware: Vec<ControllerMiddleware>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteConfig {
    #[serde(deserialize_with = "non_empty")]
    methods: Vec<Method>,
    uri: String,
    name: Option<String>,
    #[serde(default = "closure")]
    action: String,
    domain: Option<String>,
    #[serde(default)]
    middleware: Vec<String>,
}

fn closure() -> String {
    "Closure".to_owned()
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Method>, D::Error> {
    let methods = Vec::<Method>::deserialize(deserializer)?;
    if methods.is_empty() {
        return Err(serde::de::Error::custom("a route needs at least one method"));
    }
    Ok(methods)
}

impl Manifest {
    /// Reads and parses the manifest at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let manifest: Self = content.parse()?;
        debug!(path = %path.display(), routes = manifest.route_count(), "manifest loaded");
        Ok(manifest)
    }

    /// Number of `[[routes]]` entries.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Builds the registry and the controller table the manifest describes.
    ///
    /// Fails on the first malformed action, invalid filter expression, or
    /// route the tree rejects.
    pub fn into_parts(self) -> Result<(Router, Controllers)> {
        let mut router = Router::new();

        for (name, target) in self.middleware {
            router.middleware_mut().insert(name, target);
        }

        for filter in &self.filters {
            let methods = filter.methods.iter().map(String::as_str);
            match &filter.expr {
                FilterExpr::Regex(regex) => router.filters_mut().add(methods, regex, &filter.name)?,
                FilterExpr::Glob(pattern) => {
                    router.filters_mut().add_wildcard(methods, pattern, &filter.name)?
                }
            }
        }

        let mut controllers = Controllers::new();
        for controller in self.controllers {
            controllers.insert(controller.class, controller.middleware);
        }

        for config in self.routes {
            let action: Action = config.action.parse()?;
            let mut route =
                Route::new(config.methods, &config.uri, action).middleware(config.middleware);
            if let Some(name) = config.name {
                route = route.named(name);
            }
            if let Some(domain) = config.domain {
                route = route.on_domain(domain);
            }
            router.try_route(route)?;
        }

        Ok((router, controllers))
    }
}

impl FromStr for Manifest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::middleware::ControllerFactory;
    use crate::router::RouteRegistry;

    const MANIFEST: &str = r#"
        [middleware]
        auth = "App\\Authenticate"

        [[filters]]
        methods = ["POST"]
        regex = "^/users"
        name = "csrf"

        [[filters]]
        methods = ["GET"]
        pattern = "admin/*"
        name = "admin"

        [[controllers]]
        class = "UserController"
        middleware = [{ name = "auth", except = ["index"] }, { name = "log" }]

        [[routes]]
        methods = ["GET", "HEAD"]
        uri = "/users"
        name = "users.index"
        action = "UserController@index"
        middleware = ["web"]

        [[routes]]
        methods = ["GET"]
        uri = "/admin/stats"
        domain = "admin.example.com"
    "#;

    #[test]
    fn builds_registry() {
        let manifest: Manifest = MANIFEST.parse().unwrap();
        assert_eq!(manifest.route_count(), 2);

        let (router, controllers) = manifest.into_parts().unwrap();

        assert_eq!(router.len(), 2);
        assert_eq!(router.middleware().get("auth"), Some("App\\Authenticate"));
        assert_eq!(router.pattern_filters().len(), 2);
        assert!(controllers.instantiate("UserController").is_ok());

        let stats = &router.routes()[1];
        assert_eq!(stats.action(), &Action::Closure);
        assert_eq!(stats.domain(), Some("admin.example.com"));
        assert_eq!(router.named("users.index").unwrap().route_middleware(), ["web"]);
    }

    #[test]
    fn malformed_action_fails() {
        let manifest: Manifest = r#"
            [[routes]]
            methods = ["GET"]
            uri = "/"
            action = "UserController"
        "#
        .parse()
        .unwrap();
        assert!(matches!(manifest.into_parts(), Err(Error::MalformedAction(_))));
    }

    #[test]
    fn empty_methods_are_rejected() {
        let err = r#"
            [[routes]]
            methods = []
            uri = "/"
        "#
        .parse::<Manifest>()
        .unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = r#"
            [[routes]]
            methods = ["FETCH"]
            uri = "/"
        "#
        .parse::<Manifest>()
        .unwrap_err();
        assert!(err.to_string().contains("unknown HTTP method `FETCH`"));
    }

    #[test]
    fn invalid_filter_fails() {
        let manifest: Manifest = r#"
            [[filters]]
            methods = ["GET"]
            regex = "("
            name = "broken"
        "#
        .parse()
        .unwrap();
        assert!(matches!(manifest.into_parts(), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn filter_with_regex_and_pattern_is_rejected() {
        let err = r#"
            [[filters]]
            methods = ["GET"]
            regex = "^/api"
            pattern = "admin/*"
            name = "audit"
        "#
        .parse::<Manifest>()
        .unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
        assert!(err.to_string().contains("sets both `regex` and `pattern`"), "{err}");
    }

    #[test]
    fn filter_without_expression_is_rejected() {
        let err = r#"
            [[filters]]
            methods = ["GET"]
            name = "audit"
        "#
        .parse::<Manifest>()
        .unwrap_err();
        assert!(err.to_string().contains("needs `regex` or `pattern`"), "{err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Manifest::load("/nonexistent/routes.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
