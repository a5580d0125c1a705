//! `{{ ENV:NAME }}` - process environment variables

use super::{ENV_PREFIX, Resolution};

pub(super) fn resolve(placeholder: &str) -> Resolution {
    let Some(name) = placeholder.strip_prefix(ENV_PREFIX) else {
        return Resolution::Unresolved;
    };
    match std::env::var(name) {
        Ok(value) => Resolution::Value(value),
        Err(_) => Resolution::Unresolved,
    }
}
