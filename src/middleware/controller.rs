//! Controller-declared middleware.
//!
//! A controller declares middleware for its actions, optionally narrowed with
//! `only` (apply to these action methods) or `except` (apply to all but
//! these). Resolving for one action method keeps the rules that apply, in
//! declaration order, and maps each short name through the
//! [`MiddlewareRegistry`].
//!
//! Controllers are never built here. A [`ControllerFactory`] supplied by the
//! caller turns a class identifier into something that exposes its rules.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::middleware::MiddlewareRegistry;

/// `only` / `except` narrowing of a controller middleware rule.
///
/// An empty set means the same as no set: unrestricted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MiddlewareOptions {
    only: BTreeSet<String>,
    except: BTreeSet<String>,
}

impl MiddlewareOptions {
    /// Whether these options keep the rule away from `method`.
    pub fn excludes(&self, method: &str) -> bool {
        (!self.only.is_empty() && !self.only.contains(method))
            || (!self.except.is_empty() && self.except.contains(method))
    }

    pub fn only(&self) -> &BTreeSet<String> {
        &self.only
    }

    pub fn except(&self) -> &BTreeSet<String> {
        &self.except
    }
}

/// One middleware declaration on a controller.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ControllerMiddleware {
    name: String,
    #[serde(flatten)]
    options: MiddlewareOptions,
}

impl ControllerMiddleware {
    /// A rule that applies to every action method.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), options: MiddlewareOptions::default() }
    }

    /// Restricts the rule to the given action methods.
    pub fn only<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.only.extend(methods.into_iter().map(Into::into));
        self
    }

    /// Keeps the rule away from the given action methods.
    pub fn except<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.except.extend(methods.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &MiddlewareOptions {
        &self.options
    }

    pub fn applies_to(&self, method: &str) -> bool {
        !self.options.excludes(method)
    }
}

/// A controller instance, as far as middleware resolution cares.
pub trait Controller {
    /// Declared middleware, in declaration order.
    fn middleware(&self) -> &[ControllerMiddleware];
}

impl Controller for Vec<ControllerMiddleware> {
    fn middleware(&self) -> &[ControllerMiddleware] {
        self
    }
}

/// Builds controller instances from their class identifier.
///
/// A failure is reported as [`Error::Instantiation`] and aborts the listing
/// pass that asked for it.
pub trait ControllerFactory {
    fn instantiate(&self, class: &str) -> Result<Box<dyn Controller>>;
}

impl<F> ControllerFactory for F
where
    F: Fn(&str) -> Result<Box<dyn Controller>>,
{
    fn instantiate(&self, class: &str) -> Result<Box<dyn Controller>> {
        self(class)
    }
}

/// A static [`ControllerFactory`]: class identifier → declared middleware.
#[derive(Clone, Debug, Default)]
pub struct Controllers {
    classes: HashMap<String, Vec<ControllerMiddleware>>,
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `class` with `middleware`. Chains.
    pub fn declare(
        mut self,
        class: impl Into<String>,
        middleware: impl IntoIterator<Item = ControllerMiddleware>,
    ) -> Self {
        self.insert(class, middleware);
        self
    }

    pub fn insert(
        &mut self,
        class: impl Into<String>,
        middleware: impl IntoIterator<Item = ControllerMiddleware>,
    ) {
        self.classes.insert(class.into(), middleware.into_iter().collect());
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }
}

impl ControllerFactory for Controllers {
    fn instantiate(&self, class: &str) -> Result<Box<dyn Controller>> {
        match self.classes.get(class) {
            Some(middleware) => Ok(Box::new(middleware.clone())),
            None => Err(Error::instantiation(class, "class is not declared")),
        }
    }
}

/// Middleware `controller` contributes to its action `method`.
///
/// Declaration order, short names replaced by their registered identifier.
/// Duplicates are left in; [`compose`](super::compose) drops them.
pub fn resolve(
    controller: &dyn Controller,
    method: &str,
    registry: &MiddlewareRegistry,
) -> Vec<String> {
    controller
        .middleware()
        .iter()
        .filter(|rule| rule.applies_to(method))
        .map(|rule| registry.resolve(rule.name()).to_owned())
        .collect()
}
