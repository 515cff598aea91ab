//! Unified error type.

/// The error type returned by fallible resolution and registration operations.
///
/// Two kinds of failure live here. Resolution failures ([`EmptyRegistry`],
/// [`Instantiation`], [`MalformedAction`]) abort a whole listing pass: no
/// partial listing is ever returned. Registration failures ([`InvalidRoute`],
/// [`InvalidPattern`], [`Manifest`]) surface while the registry is built.
///
/// An unregistered middleware short name is *not* an error. It is shown as-is.
///
/// [`EmptyRegistry`]: Error::EmptyRegistry
/// [`Instantiation`]: Error::Instantiation
/// [`MalformedAction`]: Error::MalformedAction
/// [`InvalidRoute`]: Error::InvalidRoute
/// [`InvalidPattern`]: Error::InvalidPattern
/// [`Manifest`]: Error::Manifest
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The registry holds no routes at all.
    #[error("your application doesn't have any routes")]
    EmptyRegistry,

    /// Routes exist, but every one of them was excluded by the filters.
    #[error("your application doesn't have any routes matching the given criteria")]
    NoMatchingRoutes,

    /// The controller class named by a route action could not be built.
    #[error("cannot instantiate controller `{class}`: {reason}")]
    Instantiation { class: String, reason: String },

    /// An action string that is not of the form `Class@method`.
    #[error("malformed action `{0}`: expected `Class@method`")]
    MalformedAction(String),

    /// The route tree rejected a URI pattern.
    #[error("invalid route `{uri}`: {source}")]
    InvalidRoute {
        uri: String,
        #[source]
        source: matchit::InsertError,
    },

    /// A pattern filter whose expression does not compile.
    #[error("invalid pattern filter `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::Instantiation`] failure.
    pub fn instantiation(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation { class: class.into(), reason: reason.into() }
    }
}

/// `Result` specialised to this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
