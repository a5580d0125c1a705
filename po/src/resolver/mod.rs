//! Placeholder resolvers
//!
//! A closed set of strategies, each owning one placeholder syntax. The
//! processor walks [`Resolver::PRIORITY`] and hands a placeholder to the first
//! resolver whose [`Resolver::can_resolve`] matches; that resolver's answer is
//! final, there is no fallback to later resolvers.

mod command;
mod environment;
mod function;
mod inject;
mod variable;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::context::Context;

pub use function::BuiltinFunction;

pub const INJECT_PREFIX: &str = "INJECT:";
pub const ENV_PREFIX: &str = "ENV:";
pub const EXEC_PREFIX: &str = "EXEC:";

/// Resolution strategy for one placeholder syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolver {
    /// `{{ NAME }}` - variables, then data sources, then search-path files
    Variable,
    /// `{{ INJECT:rel/path }}` - verbatim file from the knowledge base
    FileInjection,
    /// `{{ NAME(args) }}` - custom or built-in function
    Function,
    /// `{{ ENV:NAME }}` - process environment
    Environment,
    /// `{{ EXEC:cmd args }}` - subprocess stdout
    Command,
}

impl Resolver {
    /// Fixed dispatch order
    pub const PRIORITY: [Resolver; 5] = [
        Resolver::Variable,
        Resolver::FileInjection,
        Resolver::Function,
        Resolver::Environment,
        Resolver::Command,
    ];

    /// The resolver that owns a placeholder, if any
    pub fn owner_of(placeholder: &str) -> Option<Resolver> {
        Self::PRIORITY.into_iter().find(|r| r.can_resolve(placeholder))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::FileInjection => "inject",
            Self::Function => "function",
            Self::Environment => "env",
            Self::Command => "exec",
        }
    }

    pub fn can_resolve(&self, placeholder: &str) -> bool {
        match self {
            Self::Variable => variable::can_resolve(placeholder),
            Self::FileInjection => placeholder.starts_with(INJECT_PREFIX),
            Self::Function => function::can_resolve(placeholder),
            Self::Environment => placeholder.starts_with(ENV_PREFIX),
            Self::Command => placeholder.starts_with(EXEC_PREFIX),
        }
    }

    /// Resolve a placeholder this resolver has claimed
    pub fn resolve(&self, placeholder: &str, ctx: &Context) -> Resolution {
        debug!(resolver = self.name(), %placeholder, "Resolver::resolve: called");
        let resolution = match self {
            Self::Variable => variable::resolve(placeholder, ctx),
            Self::FileInjection => inject::resolve(placeholder, ctx),
            Self::Function => function::resolve(placeholder, ctx),
            Self::Environment => environment::resolve(placeholder),
            Self::Command => command::resolve(placeholder, ctx),
        };
        debug!(resolver = self.name(), resolved = resolution.is_resolved(), "Resolver::resolve: returning");
        resolution
    }
}

impl std::fmt::Display for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of resolving one placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Replacement text
    Value(String),
    /// Claimed but failed; rendered inline and still counts as resolved
    Failed(InlineError),
    /// Nothing produced a value; reported as missing
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// Text to substitute, `None` for unresolved
    pub fn into_replacement(self) -> Option<String> {
        match self {
            Self::Value(value) => Some(value),
            Self::Failed(err) => Some(err.to_string()),
            Self::Unresolved => None,
        }
    }
}

/// Failures rendered into the output instead of aborting the template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InlineError {
    #[error("[ERROR: Command contains unsafe characters]")]
    UnsafeCommand,

    #[error("[ERROR executing command: {0}]")]
    Command(String),

    #[error("[ERROR in function {name}: {message}]")]
    Function { name: String, message: String },
}

/// Join `relative` onto `root` and return the canonical path, but only when it
/// stays inside the canonical root
///
/// Both sides are canonicalized, so `..` segments and symlinks pointing out of
/// the root are caught by the ancestor check rather than by string matching.
/// Paths that do not exist yield `None`.
pub(crate) fn resolve_within(root: &Path, relative: &Path) -> Option<PathBuf> {
    debug!(?root, ?relative, "resolve_within: called");
    let root = match root.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            debug!(%e, "resolve_within: root does not resolve");
            return None;
        }
    };

    let candidate = match root.join(relative).canonicalize() {
        Ok(candidate) => candidate,
        Err(e) => {
            debug!(%e, "resolve_within: candidate does not resolve");
            return None;
        }
    };

    if candidate.starts_with(&root) {
        Some(candidate)
    } else {
        debug!(?candidate, ?root, "resolve_within: path escapes root");
        None
    }
}
