//! Middleware chain composition.
//!
//! Folds the route, pattern-filter and controller sources into one list. The
//! first occurrence of an identifier wins its position, later occurrences are
//! dropped, and nothing is removed once added.

use std::collections::HashSet;

/// An ordered, duplicate-free accumulator of middleware identifiers.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` unless it is already in the chain. Returns whether it was
    /// appended.
    pub fn push(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_owned());
        self.order.push(id.to_owned());
        true
    }

    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.push(id.as_ref());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Route middleware, then pattern filters, then controller middleware,
/// each identifier kept at its first position.
pub fn compose<R, P, C>(route: R, patterns: P, controller: C) -> Vec<String>
where
    R: IntoIterator,
    R::Item: AsRef<str>,
    P: IntoIterator,
    P::Item: AsRef<str>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let mut chain = Chain::new();
    chain.extend(route);
    chain.extend(patterns);
    chain.extend(controller);
    chain.into_vec()
}
