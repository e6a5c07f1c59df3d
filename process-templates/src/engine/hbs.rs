//! Handlebars engine.

use handlebars::Handlebars;

use super::{TemplateEngine, TemplateError};
use crate::context::RenderContext;

pub struct HandlebarsEngine {
    handlebars: Handlebars<'static>,
}

impl HandlebarsEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Undefined variables must fail the build rather than render empty.
        handlebars.set_strict_mode(true);
        // Output is source code, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(
        &self,
        _name: &str,
        source: &str,
        context: &RenderContext,
    ) -> Result<String, TemplateError> {
        Ok(self.handlebars.render_template(source, context)?)
    }
}
