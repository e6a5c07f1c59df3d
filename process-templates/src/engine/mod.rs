//! Template engines.
//!
//! The renderer only needs `render(text, bindings) -> text`; the engines here
//! are interchangeable behind [`TemplateEngine`].

use serde::Deserialize;
use thiserror::Error;

use crate::context::RenderContext;

mod hbs;
pub mod velocity;

pub use self::hbs::HandlebarsEngine;
pub use self::velocity::VelocityEngine;

/// Why an engine rejected a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("undefined variable `{name}` at line {line}")]
    Undefined { line: usize, name: String },

    #[error("evaluation error at line {line}: {message}")]
    Eval { line: usize, message: String },

    #[error(transparent)]
    Handlebars(#[from] ::handlebars::RenderError),
}

/// Renders template source against a context.
pub trait TemplateEngine {
    /// `name` identifies the template in diagnostics only.
    fn render(
        &self,
        name: &str,
        source: &str,
        context: &RenderContext,
    ) -> Result<String, TemplateError>;
}

/// Selectable engine implementations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// `$ref` / `#if` dialect; the format existing `.vm` templates use.
    #[default]
    Velocity,
    Handlebars,
}

impl EngineKind {
    /// Template-file suffix stripped from output names unless configured.
    pub fn default_suffix(self) -> &'static str {
        match self {
            EngineKind::Velocity => ".vm",
            EngineKind::Handlebars => ".hbs",
        }
    }

    pub fn build(self) -> Box<dyn TemplateEngine> {
        match self {
            EngineKind::Velocity => Box::new(VelocityEngine),
            EngineKind::Handlebars => Box::new(HandlebarsEngine::new()),
        }
    }
}
