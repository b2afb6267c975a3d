//! Error types of the composition layer.
//!
//! Every variant carries an optional human-readable `context`. [`error_context!`] generates
//! the companion `...Ext` trait that attaches it to a failed `Result`:
//!
//! ```rust
//! use monolith_kernel::error::{ModuleError, ModuleErrorExt};
//!
//! fn open() -> Result<(), ModuleError> {
//!     Err(ModuleError::Internal { message: "store offline".into(), context: None })
//! }
//!
//! let err = open().context("Opening artist store").unwrap_err();
//! assert_eq!(err.to_string(), "Internal module error (Opening artist store): store offline");
//! ```

use crate::config::ConfigError;
use std::borrow::Cow;

/// Renders an optional context as ` (context)` for error messages.
#[must_use]
pub fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// Generates a `context()` extension trait for an error enum whose variants all carry
/// a `context: Option<Cow<'static, str>>` field.
#[macro_export]
macro_rules! error_context {
    ($error:ident => $ext:ident { $($variant:ident),+ $(,)? }) => {
        pub trait $ext<T> {
            fn context(
                self,
                context: impl Into<::std::borrow::Cow<'static, str>>,
            ) -> ::std::result::Result<T, $error>;
        }

        #[automatically_derived]
        impl<T> $ext<T> for ::std::result::Result<T, $error> {
            #[inline]
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut error| {
                    match &mut error {
                        $( $error::$variant { context: slot, .. } => *slot = Some(context.into()), )+
                    }
                    error
                })
            }
        }
    };
}

/// Failures raised by a module's own hooks.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The module could not build its dependencies.
    #[error("Module service registration failed{}: {message}", format_context(.context))]
    Services { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The module could not append its pipeline segment.
    #[error("Module pipeline configuration failed{}: {message}", format_context(.context))]
    Pipeline { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The module's migration step failed.
    #[error("Module migration failed{}: {message}", format_context(.context))]
    Migration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An error bubbled up from a library the module uses.
    #[error("Module error{}: {source}", format_context(.context))]
    Source {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal module error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

error_context!(ModuleError => ModuleErrorExt { Services, Pipeline, Migration, Source, Internal });

impl ModuleError {
    /// Wraps any library error.
    pub fn source(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Source { source: source.into(), context: None }
    }
}

impl From<&'static str> for ModuleError {
    fn from(message: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(message), context: None }
    }
}

impl From<String> for ModuleError {
    fn from(message: String) -> Self {
        Self::Internal { message: Cow::Owned(message), context: None }
    }
}

/// Endpoint declaration and resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Invalid route template '{template}'{}", format_context(.context))]
    InvalidTemplate { template: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `{key}` placeholder was left without a route value, typically because the
    /// endpoint's origin is not a registered module.
    #[error(
        "Endpoint '{endpoint}' uses '{{{key}}}' in '{template}' but no route value was injected{}",
        format_context(.context)
    )]
    UnresolvedRouteValue {
        endpoint: Cow<'static, str>,
        key: &'static str,
        template: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("Route conflict on {method} {path}: '{first}' and '{second}'{}", format_context(.context))]
    Conflict {
        method: axum::http::Method,
        path: String,
        first: Cow<'static, str>,
        second: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("Unsupported HTTP method {method} for endpoint '{endpoint}'{}", format_context(.context))]
    UnsupportedMethod {
        method: axum::http::Method,
        endpoint: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },
}

error_context!(RoutingError => RoutingErrorExt {
    InvalidTemplate,
    UnresolvedRouteValue,
    Conflict,
    UnsupportedMethod,
});

/// Fatal errors raised while the Host boots. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error{}: {source}", format_context(.context))]
    Config {
        #[source]
        source: ConfigError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Invalid route prefix '{prefix}'{}", format_context(.context))]
    InvalidPrefix { prefix: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Route prefix '{prefix}' is already taken by {owner}{}", format_context(.context))]
    DuplicatePrefix {
        prefix: Cow<'static, str>,
        owner: &'static str,
        context: Option<Cow<'static, str>>,
    },

    #[error("Module {module} is already registered{}", format_context(.context))]
    DuplicateModule { module: &'static str, context: Option<Cow<'static, str>> },

    /// A module hook (service registration or pipeline segment) failed.
    #[error("Module '{module}' failed{}: {source}", format_context(.context))]
    Module {
        module: Cow<'static, str>,
        #[source]
        source: ModuleError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Routing error{}: {source}", format_context(.context))]
    Routing {
        #[source]
        source: RoutingError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Migration of module '{module}' failed{}: {source}", format_context(.context))]
    Migration {
        module: Cow<'static, str>,
        #[source]
        source: ModuleError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal startup error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

error_context!(StartupError => StartupErrorExt {
    Config,
    InvalidPrefix,
    DuplicatePrefix,
    DuplicateModule,
    Module,
    Routing,
    Migration,
    Internal,
});

impl From<ConfigError> for StartupError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

impl From<RoutingError> for StartupError {
    fn from(source: RoutingError) -> Self {
        Self::Routing { source, context: None }
    }
}
