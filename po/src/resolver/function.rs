//! `{{ NAME(args) }}` - custom functions, then the built-in table

use chrono::{DateTime, Local};
use tracing::debug;

use super::{InlineError, Resolution};
use crate::context::Context;

/// Zero-argument functions available in every template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    /// `2025-03-14`
    CurrentDate,
    /// `2025-03-14T09:26:53.589793`
    CurrentTimestamp,
    /// `2025`
    CurrentYear,
    /// `March`
    CurrentMonth,
}

impl BuiltinFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CURRENT_DATE" => Some(Self::CurrentDate),
            "CURRENT_TIMESTAMP" => Some(Self::CurrentTimestamp),
            "CURRENT_YEAR" => Some(Self::CurrentYear),
            "CURRENT_MONTH" => Some(Self::CurrentMonth),
            _ => None,
        }
    }

    /// Evaluate against a fixed instant
    pub fn evaluate(&self, now: DateTime<Local>) -> String {
        match self {
            Self::CurrentDate => now.format("%Y-%m-%d").to_string(),
            Self::CurrentTimestamp => now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            Self::CurrentYear => now.format("%Y").to_string(),
            Self::CurrentMonth => now.format("%B").to_string(),
        }
    }
}

/// Only the `NAME(args)` shape; `ENV:X(y)` and friends stay with their prefix owner
pub(super) fn can_resolve(placeholder: &str) -> bool {
    parse_call(placeholder).is_some()
}

pub(super) fn resolve(placeholder: &str, ctx: &Context) -> Resolution {
    let Some((name, args)) = parse_call(placeholder) else {
        debug!(%placeholder, "function::resolve: not a call expression");
        return Resolution::Unresolved;
    };

    if let Some(func) = ctx.custom_function(name) {
        debug!(%name, %args, "function::resolve: calling custom function");
        return match func(args) {
            Ok(value) => Resolution::Value(value),
            Err(e) => Resolution::Failed(InlineError::Function {
                name: name.to_string(),
                message: e.to_string(),
            }),
        };
    }

    match BuiltinFunction::from_name(name) {
        Some(builtin) => Resolution::Value(builtin.evaluate(Local::now())),
        None => {
            debug!(%name, "function::resolve: unknown function");
            Resolution::Unresolved
        }
    }
}

/// Split `NAME(args)` into name and the text up to the first `)`
///
/// The name must start the placeholder and be made of word characters.
/// Anything after the closing parenthesis is ignored.
fn parse_call(placeholder: &str) -> Option<(&str, &str)> {
    let open = placeholder.find('(')?;
    let name = &placeholder[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let rest = &placeholder[open + 1..];
    let close = rest.find(')')?;
    Some((name, &rest[..close]))
}
