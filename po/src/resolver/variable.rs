//! `{{ NAME }}` - variables, data sources, then `<name>.md` in search paths

use std::path::Path;

use tracing::{debug, warn};

use super::{ENV_PREFIX, EXEC_PREFIX, INJECT_PREFIX, Resolution, resolve_within};
use crate::context::Context;

pub(super) fn can_resolve(placeholder: &str) -> bool {
    let prefixed = [INJECT_PREFIX, ENV_PREFIX, EXEC_PREFIX]
        .iter()
        .any(|prefix| placeholder.starts_with(prefix));
    !prefixed && !placeholder.contains('(')
}

pub(super) fn resolve(name: &str, ctx: &Context) -> Resolution {
    if name.is_empty() {
        return Resolution::Unresolved;
    }

    if let Some(value) = ctx.variables().get(name) {
        debug!(%name, "variable::resolve: found in variables");
        return Resolution::Value(value.clone());
    }

    if let Some(value) = ctx.data_sources().get(name) {
        debug!(%name, "variable::resolve: found in data sources");
        return Resolution::Value(value.clone());
    }

    for search_path in ctx.search_paths() {
        if let Some(content) = read_variable_file(search_path, name) {
            debug!(%name, ?search_path, "variable::resolve: found variable file");
            return Resolution::Value(content.trim().to_string());
        }
    }

    Resolution::Unresolved
}

fn read_variable_file(search_path: &Path, name: &str) -> Option<String> {
    let file_name = format!("{}.md", name.to_lowercase());
    let path = resolve_within(search_path, Path::new(&file_name))?;
    if !path.is_file() {
        return None;
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(?path, %e, "Failed to read variable file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_variables_beat_data_sources() {
        let mut ctx = Context::new("/kb");
        ctx.add_data_source("NAME", "from-json");
        ctx.add_variable("NAME", "from-cli");

        assert_eq!(resolve("NAME", &ctx), Resolution::Value("from-cli".to_string()));
    }

    #[test]
    fn test_data_sources_beat_search_paths() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("name.md"), "from-file").unwrap();

        let mut ctx = Context::new("/kb");
        ctx.add_search_path(temp.path());
        ctx.add_data_source("NAME", "from-json");

        assert_eq!(resolve("NAME", &ctx), Resolution::Value("from-json".to_string()));
    }

    #[test]
    fn test_search_path_file_lowercased_and_trimmed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("persona.md"), "\n  You are a reviewer.  \n").unwrap();

        let mut ctx = Context::new("/kb");
        ctx.add_search_path(temp.path());

        assert_eq!(
            resolve("PERSONA", &ctx),
            Resolution::Value("You are a reviewer.".to_string())
        );
    }

    #[test]
    fn test_search_paths_checked_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("tone.md"), "first").unwrap();
        fs::write(second.path().join("tone.md"), "second").unwrap();

        let mut ctx = Context::new("/kb");
        ctx.add_search_path(first.path());
        ctx.add_search_path(second.path());

        assert_eq!(resolve("TONE", &ctx), Resolution::Value("first".to_string()));
    }

    #[test]
    fn test_search_path_traversal_rejected() {
        let temp = TempDir::new().unwrap();
        let vars = temp.path().join("vars");
        fs::create_dir(&vars).unwrap();
        fs::write(temp.path().join("secret.md"), "leaked").unwrap();

        let mut ctx = Context::new("/kb");
        ctx.add_search_path(&vars);

        assert_eq!(resolve("../SECRET", &ctx), Resolution::Unresolved);
    }

    #[test]
    fn test_unknown_name_unresolved() {
        let ctx = Context::new("/kb");
        assert_eq!(resolve("NOPE", &ctx), Resolution::Unresolved);
    }

    #[test]
    fn test_missing_search_path_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("x.md"), "found").unwrap();

        let mut ctx = Context::new("/kb");
        ctx.add_search_path(temp.path().join("does-not-exist"));
        ctx.add_search_path(temp.path());

        assert_eq!(resolve("X", &ctx), Resolution::Value("found".to_string()));
    }

    #[test]
    fn test_can_resolve() {
        assert!(can_resolve("NAME"));
        assert!(can_resolve("lower_case"));
        assert!(!can_resolve("INJECT:a.md"));
        assert!(!can_resolve("CALL()"));
    }

    #[test]
    fn test_empty_name_skips_search_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".md"), "hidden").unwrap();
        let mut ctx = Context::new("/kb");
        ctx.add_search_path(dir.path());

        assert_eq!(resolve("", &ctx), Resolution::Unresolved);
    }
}
