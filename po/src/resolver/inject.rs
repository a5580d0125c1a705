//! `{{ INJECT:rel/path }}` - verbatim file content from the knowledge base

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::{INJECT_PREFIX, Resolution, resolve_within};
use crate::context::Context;

pub(super) fn resolve(placeholder: &str, ctx: &Context) -> Resolution {
    let Some(raw) = placeholder.strip_prefix(INJECT_PREFIX) else {
        return Resolution::Unresolved;
    };

    let Some(relative) = normalize(raw) else {
        warn!(path = %raw, "Rejected INJECT path outside the knowledge base");
        return Resolution::Unresolved;
    };

    let Some(path) = resolve_within(ctx.knowledge_base(), &relative) else {
        debug!(?relative, "inject::resolve: not found inside knowledge base");
        return Resolution::Unresolved;
    };

    if !path.is_file() {
        debug!(?path, "inject::resolve: not a file");
        return Resolution::Unresolved;
    }

    // Verbatim: callers rely on byte-for-byte injection, no trimming
    match std::fs::read_to_string(&path) {
        Ok(content) => Resolution::Value(content),
        Err(e) => {
            warn!(?path, %e, "Failed to read INJECT file");
            Resolution::Unresolved
        }
    }
}

/// Lexically normalize a relative path, `None` if it is absolute or climbs
/// above its starting point
///
/// `a/./b/../c` becomes `a/c`. A normalized result that still contains `..`
/// anywhere is refused as well.
fn normalize(raw: &str) -> Option<PathBuf> {
    let mut parts = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    let normalized: PathBuf = parts.iter().collect();
    if normalized.to_string_lossy().contains("..") {
        return None;
    }
    Some(normalized)
}
