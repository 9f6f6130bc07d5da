//! Text templates over JSON data
//!
//! A small template language in the style of Go's `text/template`, executed
//! against a `serde_json::Value`. Supported actions:
//!
//! - `{{ .Field }}`, `{{ .A.B }}`, `{{ $ }}`, `{{ $var }}` and literals
//! - pipelines `{{ .X | helper }}` and calls `{{ helper .X 1 }}`
//! - declarations `{{ $x := .Lats }}`
//! - `{{ if }}` / `{{ else if }}` / `{{ else }}` / `{{ end }}`
//! - `{{ range .List }}`, `{{ range $i, $v := .List }}` with optional `{{ else }}`
//! - `{{ with .X }}`
//! - comments `{{/* ... */}}` and trim markers `{{-` / `-}}`
//!
//! Builtins: `and`, `or`, `not`, `len`, `index`, `eq`, `ne`, `lt`, `le`,
//! `gt`, `ge`. Everything else comes from a [`FuncMap`].
//!
//! # Example
//!
//! ```
//! use bench_report::template::{FuncMap, Template};
//! use serde_json::json;
//!
//! let funcs = FuncMap::new();
//! let tmpl = Template::parse("greeting", "{{ range .Names }}hi {{ . }} {{ end }}", &funcs).unwrap();
//! let out = tmpl.execute(&json!({ "Names": ["a", "b"] }), &funcs).unwrap();
//! assert_eq!(out, "hi a hi b ");
//! ```

mod exec;
mod funcs;
mod lexer;
mod parser;

pub use funcs::{expect_args, FuncMap, Helper, HelperResult};

use parser::Node;
use serde_json::Value;
use thiserror::Error;

/// Template errors, tagged with the template name and source line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template {name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template {name}:{line}: executing: {message}")]
    Exec {
        name: String,
        line: usize,
        message: String,
    },
}

/// Lexer/parser error before the template name is attached
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A parsed template
///
/// Function names are resolved at parse time, so the `FuncMap` given to
/// [`Template::execute`] should contain the helpers given to
/// [`Template::parse`].
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse a template body
    ///
    /// # Arguments
    /// * `name` - Name used in error messages
    /// * `source` - Template text
    /// * `funcs` - Helpers the template may call
    ///
    /// # Returns
    /// The parsed template, or `TemplateError::Parse` on malformed input or
    /// a call to an unknown function
    pub fn parse(name: &str, source: &str, funcs: &FuncMap) -> Result<Self, TemplateError> {
        let to_error = |e: SyntaxError| TemplateError::Parse {
            name: name.to_string(),
            line: e.line,
            message: e.message,
        };
        let segments = lexer::scan(source).map_err(to_error)?;
        let nodes = parser::parse(segments, funcs).map_err(to_error)?;
        log::debug!("Parsed template '{}' ({} top-level nodes)", name, nodes.len());
        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the template against `data`
    ///
    /// Output is only returned when execution completes.
    pub fn execute(&self, data: &Value, funcs: &FuncMap) -> Result<String, TemplateError> {
        exec::Exec::new(funcs, data)
            .run(&self.nodes, data)
            .map_err(|e| TemplateError::Exec {
                name: self.name.clone(),
                line: e.line,
                message: e.message,
            })
    }
}
