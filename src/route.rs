//! Registered routes and their actions.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::method::Method;

/// What a route invokes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// An inline handler. Carries no controller middleware.
    Closure,
    /// A method on a controller class, written `Class@method`.
    Controller { class: String, method: String },
}

impl Action {
    pub fn controller(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Controller { class: class.into(), method: method.into() }
    }

    /// `"Closure"` or `"Class@method"`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Class and method of a controller action, checked for shape.
    ///
    /// `None` for a closure. [`Error::MalformedAction`] when either half is
    /// empty or holds an `@`, the same shapes parsing rejects.
    pub fn controller_parts(&self) -> Result<Option<(&str, &str)>, Error> {
        match self {
            Self::Closure => Ok(None),
            Self::Controller { class, method } if !well_formed(class) || !well_formed(method) => {
                Err(Error::MalformedAction(self.name()))
            }
            Self::Controller { class, method } => Ok(Some((class.as_str(), method.as_str()))),
        }
    }
}

fn well_formed(half: &str) -> bool {
    !half.is_empty() && !half.contains('@')
}

/// Parses `"Closure"` or `"Class@method"`.
impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Closure" {
            return Ok(Self::Closure);
        }
        match s.split_once('@') {
            Some((class, method)) if well_formed(class) && well_formed(method) => {
                Ok(Self::controller(class, method))
            }
            _ => Err(Error::MalformedAction(s.to_owned())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure => f.write_str("Closure"),
            Self::Controller { class, method } => write!(f, "{class}@{method}"),
        }
    }
}

/// One registered route.
///
/// Built once at registration and read-only afterwards:
///
/// ```rust
/// use tsu_routes::{Action, Route};
///
/// let route = Route::get("/users/{id}", Action::controller("UserController", "show"))
///     .named("users.show")
///     .middleware(["web", "auth"]);
///
/// assert_eq!(route.uri(), "/users/{id}");
/// assert_eq!(route.name(), Some("users.show"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    uri: String,
    methods: Vec<Method>,
    name: Option<String>,
    action: Action,
    domain: Option<String>,
    middleware: Vec<String>,
}

impl Route {
    /// A route answering to `methods` at `uri`. A missing leading `/` is added.
    ///
    /// # Panics
    ///
    /// Panics if `methods` is empty.
    pub fn new(methods: impl Into<Vec<Method>>, uri: &str, action: Action) -> Self {
        let mut methods: Vec<Method> = methods.into();
        assert!(!methods.is_empty(), "route `{uri}` has no methods");

        // keep the first occurrence of each verb
        let mut i = 0;
        while i < methods.len() {
            if methods[..i].contains(&methods[i]) {
                methods.remove(i);
            } else {
                i += 1;
            }
        }

        Self {
            uri: normalize(uri),
            methods,
            name: None,
            action,
            domain: None,
            middleware: Vec::new(),
        }
    }

    /// `GET|HEAD` route. A GET route always answers HEAD too.
    pub fn get(uri: &str, action: Action) -> Self {
        Self::new([Method::Get, Method::Head], uri, action)
    }

    pub fn post(uri: &str, action: Action) -> Self {
        Self::new([Method::Post], uri, action)
    }

    pub fn put(uri: &str, action: Action) -> Self {
        Self::new([Method::Put], uri, action)
    }

    pub fn patch(uri: &str, action: Action) -> Self {
        Self::new([Method::Patch], uri, action)
    }

    pub fn delete(uri: &str, action: Action) -> Self {
        Self::new([Method::Delete], uri, action)
    }

    pub fn options(uri: &str, action: Action) -> Self {
        Self::new([Method::Options], uri, action)
    }

    /// Route answering every verb in [`Method::ANY`].
    pub fn any(uri: &str, action: Action) -> Self {
        Self::new(Method::ANY, uri, action)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the route to requests for `domain`.
    pub fn on_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Appends route-level middleware. Duplicates are kept as given.
    pub fn middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(middleware.into_iter().map(Into::into));
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Middleware attached to the route, as registered.
    pub fn route_middleware(&self) -> &[String] {
        &self.middleware
    }
}

fn normalize(uri: &str) -> String {
    if uri.starts_with('/') {
        uri.to_owned()
    } else {
        format!("/{uri}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_controller_actions() {
        assert_eq!("Closure".parse::<Action>().unwrap(), Action::Closure);
        assert_eq!(
            "App\\UserController@index".parse::<Action>().unwrap(),
            Action::controller("App\\UserController", "index"),
        );
    }

    #[test]
    fn rejects_malformed_actions() {
        for action in ["UserController", "@index", "UserController@", "A@b@c", ""] {
            let err = action.parse::<Action>().unwrap_err();
            assert!(matches!(err, Error::MalformedAction(ref s) if s == action), "{action}");
        }
    }

    #[test]
    fn action_name_round_trips_display() {
        assert_eq!(Action::controller("UserController", "show").name(), "UserController@show");
        assert_eq!(Action::Closure.name(), "Closure");
    }

    #[test]
    fn hand_built_controller_action_is_checked() {
        let action = Action::controller("", "index");
        assert!(matches!(action.controller_parts(), Err(Error::MalformedAction(_))));

        let action = Action::controller("A@b", "c");
        assert!(matches!(
            action.controller_parts(),
            Err(Error::MalformedAction(ref s)) if s == "A@b@c"
        ));
        assert!("A@b@c".parse::<Action>().is_err());
        assert_eq!(Action::Closure.controller_parts().unwrap(), None);
    }

    #[test]
    fn uri_gets_leading_slash() {
        assert_eq!(Route::get("users", Action::Closure).uri(), "/users");
        assert_eq!(Route::get("/", Action::Closure).uri(), "/");
    }

    #[test]
    fn duplicate_methods_collapse() {
        let route = Route::new([Method::Get, Method::Head, Method::Get], "/", Action::Closure);
        assert_eq!(route.methods(), [Method::Get, Method::Head]);
    }

    #[test]
    #[should_panic(expected = "has no methods")]
    fn methods_must_not_be_empty() {
        Route::new(Vec::<Method>::new(), "/", Action::Closure);
    }
}
