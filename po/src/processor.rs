//! TemplateProcessor - scan, resolve, substitute, report

use std::collections::HashMap;
use std::path::Path;

use regex::Captures;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::PromptError;
use crate::resolver::{Resolution, Resolver};
use crate::scanner::PlaceholderScanner;

/// Result of processing a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Template with every resolved placeholder substituted; unresolved ones
    /// are left exactly as written
    pub text: String,
    /// Placeholders nothing could resolve, each listed once
    pub missing: Vec<String>,
}

impl Rendered {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// The rendered text, or [`PromptError::Unresolved`] if anything is missing
    pub fn require_complete(self) -> Result<String, PromptError> {
        if self.missing.is_empty() {
            Ok(self.text)
        } else {
            Err(PromptError::Unresolved { missing: self.missing })
        }
    }
}

/// Drives placeholder resolution for one [`Context`]
///
/// Processing is a pure function of the template and the context: every
/// distinct placeholder is resolved once by its owning resolver, then all
/// occurrences are replaced in a single pass over the original text. Inserted
/// values are never scanned again, so injected files or command output that
/// happen to contain `{{ ... }}` come through untouched.
#[derive(Debug)]
pub struct TemplateProcessor<'a> {
    ctx: &'a Context,
    scanner: PlaceholderScanner,
}

impl<'a> TemplateProcessor<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self::with_scanner(ctx, PlaceholderScanner::new())
    }

    /// Reuse an already-compiled scanner
    pub fn with_scanner(ctx: &'a Context, scanner: PlaceholderScanner) -> Self {
        Self { ctx, scanner }
    }

    pub fn process(&self, template: &str) -> Rendered {
        debug!(len = template.len(), "TemplateProcessor::process: called");
        let placeholders = self.scanner.scan(template);

        let mut replacements: HashMap<String, String> = HashMap::new();
        let mut missing = Vec::new();

        for placeholder in placeholders {
            let resolution = match Resolver::owner_of(&placeholder) {
                Some(resolver) => resolver.resolve(&placeholder, self.ctx),
                None => {
                    debug!(%placeholder, "TemplateProcessor::process: no resolver claims placeholder");
                    Resolution::Unresolved
                }
            };

            match resolution.into_replacement() {
                Some(value) => {
                    replacements.insert(placeholder, value);
                }
                None => missing.push(placeholder),
            }
        }

        let text = if replacements.is_empty() {
            template.to_string()
        } else {
            self.scanner
                .regex()
                .replace_all(template, |caps: &Captures| match replacements.get(caps[1].trim()) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                })
                .into_owned()
        };

        info!(
            resolved = replacements.len(),
            missing = missing.len(),
            "Processed template"
        );
        Rendered { text, missing }
    }

    /// Read and process a template file
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<Rendered, PromptError> {
        let path = path.as_ref();
        debug!(?path, "TemplateProcessor::process_file: called");

        if !path.exists() {
            return Err(PromptError::TemplateNotFound { path: path.to_path_buf() });
        }

        let template = std::fs::read_to_string(path).map_err(|source| PromptError::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(self.process(&template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Local};
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_no_placeholders_unchanged() {
        let ctx = Context::new("/kb");
        let rendered = TemplateProcessor::new(&ctx).process("Nothing to see { here }.");
        assert_eq!(rendered.text, "Nothing to see { here }.");
        assert!(rendered.is_complete());
    }

    #[test]
    fn test_hello_scenario() {
        let mut ctx = Context::new("/kb");
        ctx.add_variable("NAME", "Ada");

        let rendered = TemplateProcessor::new(&ctx).process("Hello {{ NAME }}, today is {{ CURRENT_YEAR() }}.");

        let year = Local::now().year();
        assert_eq!(rendered.text, format!("Hello Ada, today is {}.", year));
        assert!(rendered.missing.is_empty());
    }

    #[test]
    fn test_all_occurrences_replaced() {
        let mut ctx = Context::new("/kb");
        ctx.add_variable("X", "1");

        let rendered = TemplateProcessor::new(&ctx).process("{{X}}-{{ X }}-{{   X   }}");
        assert_eq!(rendered.text, "1-1-1");
    }

    #[test]
    fn test_aggregate_missing_deduplicated() {
        let mut ctx = Context::new("/kb");
        ctx.add_variable("A", "a");
        ctx.add_variable("B", "b");

        let template = "{{ A }} {{ MISSING_ONE }} {{ B }} {{ MISSING_TWO }} {{ MISSING_ONE }} \
                        {{ ENV:PROMPTORCH_UNSET_VAR_XYZ }} {{ MISSING_TWO }}";
        let rendered = TemplateProcessor::new(&ctx).process(template);

        let mut missing = rendered.missing.clone();
        missing.sort();
        assert_eq!(
            missing,
            vec![
                "ENV:PROMPTORCH_UNSET_VAR_XYZ".to_string(),
                "MISSING_ONE".to_string(),
                "MISSING_TWO".to_string(),
            ]
        );
        assert!(rendered.text.starts_with("a {{ MISSING_ONE }} b"));
    }

    #[test]
    fn test_env_unset_left_literal() {
        let ctx = Context::new("/kb");
        let rendered = TemplateProcessor::new(&ctx).process("{{ ENV:PROMPTORCH_NOT_SET_VAR }}");

        assert_eq!(rendered.text, "{{ ENV:PROMPTORCH_NOT_SET_VAR }}");
        assert_eq!(rendered.missing, vec!["ENV:PROMPTORCH_NOT_SET_VAR".to_string()]);
    }

    #[test]
    fn test_whitespace_only_placeholder_reported_missing() {
        let mut ctx = Context::new("/kb");
        ctx.add_variable("A", "x");
        let rendered = TemplateProcessor::new(&ctx).process("a {{   }} b {{ A }} {{}}");

        assert_eq!(rendered.text, "a {{   }} b x {{}}");
        assert_eq!(rendered.missing, vec![String::new()]);
        assert!(!rendered.is_complete());
    }

    #[test]
    fn test_inline_error_counts_as_resolved() {
        let ctx = Context::new("/kb");
        let rendered = TemplateProcessor::new(&ctx).process("run: {{ EXEC:echo hi; rm -rf / }}");

        assert_eq!(rendered.text, "run: [ERROR: Command contains unsafe characters]");
        assert!(rendered.is_complete());
    }

    #[test]
    fn test_traversal_reported_missing() {
        let kb = TempDir::new().unwrap();
        let ctx = Context::new(kb.path());

        let rendered = TemplateProcessor::new(&ctx).process("{{ INJECT:../../etc/passwd }}{{ INJECT:/etc/passwd }}");

        assert_eq!(rendered.missing.len(), 2);
        assert!(!rendered.text.contains("root:"));
    }

    #[test]
    fn test_replacement_is_literal() {
        let mut ctx = Context::new("/kb");
        ctx.add_variable("PRICE", "$1 and ${2}");

        let rendered = TemplateProcessor::new(&ctx).process("cost: {{ PRICE }}");
        assert_eq!(rendered.text, "cost: $1 and ${2}");
    }

    #[test]
    fn test_injected_content_not_rescanned() {
        let kb = TempDir::new().unwrap();
        fs::write(kb.path().join("snippet.md"), "use {{ SECRET }} here").unwrap();
        let mut ctx = Context::new(kb.path());
        ctx.add_variable("SECRET", "leaked");

        let rendered = TemplateProcessor::new(&ctx).process("{{ INJECT:snippet.md }} / {{ SECRET }}");
        assert_eq!(rendered.text, "use {{ SECRET }} here / leaked");
    }

    #[test]
    fn test_json_data_source_scenario() {
        let temp = TempDir::new().unwrap();
        let json = temp.path().join("data.json");
        fs::write(&json, r#"{"a": {"b": "1"}}"#).unwrap();
        let mut ctx = Context::new(temp.path());
        ctx.add_json_file(&json).unwrap();

        let rendered = TemplateProcessor::new(&ctx).process("{{ A_B }}");
        assert_eq!(rendered.text, "1");
    }

    #[test]
    fn test_unclaimed_placeholder_missing() {
        let ctx = Context::new("/kb");
        let rendered = TemplateProcessor::new(&ctx).process("{{ BROKEN( }}");
        assert_eq!(rendered.missing, vec!["BROKEN(".to_string()]);
    }

    #[test]
    fn test_require_complete() {
        let mut ctx = Context::new("/kb");
        ctx.add_variable("A", "ok");
        let processor = TemplateProcessor::new(&ctx);

        assert_eq!(processor.process("{{ A }}").require_complete().unwrap(), "ok");
        let err = processor.process("{{ B }}").require_complete().unwrap_err();
        assert!(matches!(err, PromptError::Unresolved { ref missing } if missing == &vec!["B".to_string()]));
    }

    #[test]
    fn test_process_file_missing() {
        let ctx = Context::new("/kb");
        let err = TemplateProcessor::new(&ctx)
            .process_file("/definitely/not/here.md")
            .unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_process_file() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("prompt.md");
        fs::write(&template, "Issue #{{ ISSUE }}").unwrap();
        let mut ctx = Context::new(temp.path());
        ctx.add_variable("ISSUE", "123");

        let rendered = TemplateProcessor::new(&ctx).process_file(&template).unwrap();
        assert_eq!(rendered.text, "Issue #123");
    }

    proptest! {
        #[test]
        fn prop_brace_free_text_unchanged(text in "[^{}]*") {
            let ctx = Context::new("/kb");
            let rendered = TemplateProcessor::new(&ctx).process(&text);
            prop_assert_eq!(rendered.text, text);
            prop_assert!(rendered.missing.is_empty());
        }

        #[test]
        fn prop_variables_always_substituted(name in "[A-Z][A-Z0-9_]{0,12}", value in "[^{}]{0,40}") {
            let mut ctx = Context::new("/kb");
            ctx.add_variable(name.clone(), value.clone());
            let template = format!("<{{{{ {} }}}}>", name);

            let rendered = TemplateProcessor::new(&ctx).process(&template);
            prop_assert_eq!(rendered.text, format!("<{}>", value));
        }
    }
}
