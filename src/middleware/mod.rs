//! Middleware resolution.
//!
//! A route's effective middleware comes from three places, folded in this
//! order:
//!
//! 1. middleware attached to the route itself,
//! 2. [pattern filters](pattern) whose expression matches the route URI for
//!    at least one of its methods,
//! 3. middleware a [controller](controller) declares for the action method.
//!
//! [`chain::compose`] does the fold. Nothing here runs middleware. This module
//! only works out *which* middleware a request to a route would pass through.

pub mod chain;
pub mod controller;
pub mod pattern;

use std::collections::HashMap;

use tracing::debug;

pub use chain::{Chain, compose};
pub use controller::{
    Controller, ControllerFactory, ControllerMiddleware, Controllers, MiddlewareOptions,
};
pub use pattern::{PatternFilterRule, PatternFilters};

/// Short name → implementation identifier table (`auth` →
/// `App\Http\Middleware\Authenticate`).
///
/// The table is allowed to be incomplete. A name without an entry resolves to
/// itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MiddlewareRegistry {
    aliases: HashMap<String, String>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` as an alias for `target`. Re-registering replaces.
    pub fn insert(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(name.into(), target.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Resolves a short name, falling back to the name itself.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        match self.get(name) {
            Some(target) => target,
            None => {
                debug!(middleware = name, "middleware name not registered, shown as-is");
                name
            }
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MiddlewareRegistry
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            aliases: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
