//! Context - the resolution environment for one template run

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::data::{data_source_key, flatten_json};
use crate::error::PromptError;

/// A user-registered template function
///
/// Receives the raw text between the parentheses. An `Err` is rendered
/// inline as `[ERROR in function NAME: ...]`.
pub type CustomFunction = Arc<dyn Fn(&str) -> eyre::Result<String> + Send + Sync>;

/// Everything resolvers may consult
///
/// Built once per invocation and never mutated while a template is being
/// processed; the processor only ever holds a shared reference.
#[derive(Clone)]
pub struct Context {
    /// Explicit variables (e.g. `-v NAME=value`)
    variables: BTreeMap<String, String>,

    /// Flattened JSON data
    data_sources: BTreeMap<String, String>,

    /// Directories searched for `<name>.md` variable files, in order
    search_paths: Vec<PathBuf>,

    /// Trusted root for `INJECT:` lookups
    knowledge_base: PathBuf,

    custom_functions: HashMap<String, CustomFunction>,

    /// Upper bound for each `EXEC:` subprocess
    command_timeout: Duration,
}

impl Context {
    /// Create an empty context rooted at the given knowledge base
    pub fn new(knowledge_base: impl Into<PathBuf>) -> Self {
        let knowledge_base = knowledge_base.into();
        debug!(?knowledge_base, "Context::new: called");
        Self {
            variables: BTreeMap::new(),
            data_sources: BTreeMap::new(),
            search_paths: Vec::new(),
            knowledge_base,
            custom_functions: HashMap::new(),
            command_timeout: Duration::from_secs(crate::DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        debug!(%name, "Context::add_variable: called");
        self.variables.insert(name, value.into());
    }

    pub fn add_data_source(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        debug!(%name, "Context::add_data_source: called");
        self.data_sources.insert(name, value.into());
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(?path, "Context::add_search_path: called");
        self.search_paths.push(path);
    }

    /// Register a custom function, shadowing any built-in of the same name
    pub fn add_custom_function<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&str) -> eyre::Result<String> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(%name, "Context::add_custom_function: called");
        self.custom_functions.insert(name, Arc::new(func));
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) {
        debug!(?timeout, "Context::set_command_timeout: called");
        self.command_timeout = timeout;
    }

    /// Load a JSON file into the data sources
    ///
    /// Objects are flattened (see [`flatten_json`]) and the raw file content is
    /// also kept under the key derived from the file stem. On any error the
    /// context is left untouched. Returns the whole-file key.
    pub fn add_json_file(&mut self, path: impl AsRef<Path>) -> Result<String, PromptError> {
        let path = path.as_ref();
        debug!(?path, "Context::add_json_file: called");

        if !path.exists() {
            debug!("Context::add_json_file: file does not exist");
            return Err(PromptError::JsonNotFound { path: path.to_path_buf() });
        }

        let content = std::fs::read_to_string(path).map_err(|source| PromptError::JsonRead {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value = serde_json::from_str(&content).map_err(|source| PromptError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut flattened = BTreeMap::new();
        flatten_json(&value, &mut flattened);
        let count = flattened.len();
        self.data_sources.extend(flattened);

        let key = data_source_key(path);
        self.data_sources.insert(key.clone(), content);

        info!(path = %path.display(), %key, keys = count, "Loaded JSON data source");
        Ok(key)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn data_sources(&self) -> &BTreeMap<String, String> {
        &self.data_sources
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn knowledge_base(&self) -> &Path {
        &self.knowledge_base
    }

    pub fn custom_function(&self, name: &str) -> Option<&CustomFunction> {
        self.custom_functions.get(name)
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }
}

impl Default for Context {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(cwd.join(crate::DEFAULT_KNOWLEDGE_DIR))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&String> = self.custom_functions.keys().collect();
        functions.sort();
        f.debug_struct("Context")
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("search_paths", &self.search_paths)
            .field("knowledge_base", &self.knowledge_base)
            .field("custom_functions", &functions)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}
