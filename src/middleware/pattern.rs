//! Pattern filters.
//!
//! A pattern filter is bound to a URI expression rather than to a route. To
//! find the filters a route picks up, its URI is replayed as a synthetic
//! request once per HTTP method the route accepts, and the hits are unioned.
//!
//! Rules are method-scoped. The method comparison is a plain, case-sensitive
//! string comparison: a rule registered for `"post"` never matches `POST`.

use std::collections::HashSet;

use regex::Regex;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
enum Subject {
    /// Regex searched in the URI as registered.
    Uri,
    /// Anchored glob matched against the URI without its leading `/`.
    Path,
}

/// One `(method, expression, filter name)` rule.
#[derive(Clone, Debug)]
pub struct PatternFilterRule {
    method: String,
    regex: Regex,
    subject: Subject,
    source: String,
    name: String,
}

impl PatternFilterRule {
    /// A rule whose `pattern` is a regular expression searched in the route
    /// URI. Anchor it yourself (`^/admin`) if a prefix match is meant.
    pub fn new(method: impl Into<String>, pattern: &str, name: impl Into<String>) -> Result<Self> {
        let regex = compile(pattern, pattern)?;
        Ok(Self {
            method: method.into(),
            regex,
            subject: Subject::Uri,
            source: pattern.to_owned(),
            name: name.into(),
        })
    }

    /// A rule whose `pattern` is a glob such as `admin/*`, where `*` matches
    /// any run of characters. The glob covers the whole path, which is
    /// compared without its leading `/`.
    pub fn wildcard(
        method: impl Into<String>,
        pattern: &str,
        name: impl Into<String>,
    ) -> Result<Self> {
        let glob = strip_slash(pattern);
        let expr = format!("^{}$", regex::escape(glob).replace(r"\*", ".*"));
        let regex = compile(&expr, pattern)?;
        Ok(Self {
            method: method.into(),
            regex,
            subject: Subject::Path,
            source: pattern.to_owned(),
            name: name.into(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The expression as it was registered.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a `method` request to `uri` would trigger this filter.
    pub fn matches(&self, uri: &str, method: &str) -> bool {
        if self.method != method {
            return false;
        }
        match self.subject {
            Subject::Uri => self.regex.is_match(uri),
            Subject::Path => self.regex.is_match(strip_slash(uri)),
        }
    }
}

/// The table of every registered pattern filter.
#[derive(Clone, Debug, Default)]
pub struct PatternFilters {
    rules: Vec<PatternFilterRule>,
}

impl PatternFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: PatternFilterRule) {
        self.rules.push(rule);
    }

    /// Registers one regex filter for each of `methods`.
    pub fn add<'m>(
        &mut self,
        methods: impl IntoIterator<Item = &'m str>,
        pattern: &str,
        name: &str,
    ) -> Result<()> {
        for method in methods {
            self.push(PatternFilterRule::new(method, pattern, name)?);
        }
        Ok(())
    }

    /// Registers one glob filter for each of `methods`.
    pub fn add_wildcard<'m>(
        &mut self,
        methods: impl IntoIterator<Item = &'m str>,
        pattern: &str,
        name: &str,
    ) -> Result<()> {
        for method in methods {
            self.push(PatternFilterRule::wildcard(method, pattern, name)?);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternFilterRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the filters a `method` request to `uri` triggers.
    ///
    /// Registration order, each name at most once. No match is an empty
    /// result, not an error.
    pub fn match_filters(&self, uri: &str, method: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .filter(|rule| rule.matches(uri, method))
            .map(PatternFilterRule::name)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Union of [`match_filters`](Self::match_filters) over every method a
    /// route accepts, in first-seen order.
    pub fn match_route<'m>(
        &self,
        uri: &str,
        methods: impl IntoIterator<Item = &'m str>,
    ) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for method in methods {
            for name in self.match_filters(uri, method) {
                if seen.insert(name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

fn compile(expr: &str, pattern: &str) -> Result<Regex> {
    Regex::new(expr).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

fn strip_slash(path: &str) -> &str {
    match path.trim_start_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
