//! Promptorch - prompt template orchestration
//!
//! Renders text templates by resolving `{{ ... }}` placeholders through a
//! fixed chain of resolvers. Each placeholder syntax is owned by exactly one
//! resolver, picked by its prefix or shape:
//!
//! ```text
//! {{ NAME }}                 variables → JSON data sources → search-path files
//! {{ INJECT:path/file.md }}  verbatim file from the knowledge base
//! {{ CURRENT_DATE() }}       custom or built-in function
//! {{ ENV:HOME }}             process environment
//! {{ EXEC:git rev-parse }}   stdout of a shell-free subprocess
//! ```
//!
//! # Example
//!
//! ```ignore
//! use promptorch::{Context, TemplateProcessor};
//!
//! let mut ctx = Context::new("knowledge");
//! ctx.add_variable("NAME", "Ada");
//! let rendered = TemplateProcessor::new(&ctx).process("Hello {{ NAME }}");
//! assert_eq!(rendered.text, "Hello Ada");
//! assert!(rendered.missing.is_empty());
//! ```

pub mod cli;
pub mod config;
mod context;
mod data;
mod error;
mod processor;
pub mod resolver;
mod scanner;

pub use context::{Context, CustomFunction};
pub use data::{data_source_key, flatten_json};
pub use error::PromptError;
pub use processor::{Rendered, TemplateProcessor};
pub use resolver::{InlineError, Resolution, Resolver};
pub use scanner::PlaceholderScanner;

/// Default timeout for `EXEC:` placeholders (10s)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

/// Knowledge base directory used when none is configured, relative to cwd
pub const DEFAULT_KNOWLEDGE_DIR: &str = "knowledge";
