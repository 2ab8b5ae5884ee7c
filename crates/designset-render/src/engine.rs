//! Template engine adapter.
//!
//! Design-set templates use `<{ ... }>` for output, `<{% ... %}>` for
//! statements and `<{* ... *}>` for comments. Output is never auto-escaped;
//! templates escape explicitly with the `escape` filter.

use minijinja::{AutoEscape, Environment, UndefinedBehavior, syntax::SyntaxConfig};
use serde_json::Value;
use tracing::trace;

use crate::{error::Result, filters};

/// Opening and closing delimiters for output expressions.
pub const VARIABLE_DELIMITERS: (&str, &str) = ("<{", "}>");

/// Opening and closing delimiters for statements.
pub const BLOCK_DELIMITERS: (&str, &str) = ("<{%", "%}>");

/// Opening and closing delimiters for comments.
pub const COMMENT_DELIMITERS: (&str, &str) = ("<{*", "*}>");

/// Configured engine shared by every render of a [`crate::Renderer`].
#[derive(Debug)]
pub struct Engine {
    env: Environment<'static>,
}

impl Engine {
    /// Build an environment with design-set syntax and filters registered.
    pub fn new() -> Result<Self> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters(BLOCK_DELIMITERS.0, BLOCK_DELIMITERS.1)
            .variable_delimiters(VARIABLE_DELIMITERS.0, VARIABLE_DELIMITERS.1)
            .comment_delimiters(COMMENT_DELIMITERS.0, COMMENT_DELIMITERS.1)
            .build()?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);
        filters::register(&mut env);

        Ok(Self { env })
    }

    /// Render UTF-8 template source against `context`.
    ///
    /// `name` only appears in error messages.
    pub fn render(&self, name: &str, source: &str, context: &Value) -> Result<String> {
        trace!(template = name, bytes = source.len(), "rendering");
        Ok(self.env.render_named_str(name, source, context)?)
    }
}
