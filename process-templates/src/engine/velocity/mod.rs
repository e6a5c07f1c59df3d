//! Velocity-style templates: `$ref` substitution plus `#if`/`#elseif`/
//! `#else`/`#end` and `#set` directives.
//!
//! Only the subset needed for API-level switching is supported. There are no
//! method calls, property access, loops or macros; `$obj.prop` renders the
//! value of `$obj` followed by the literal `.prop`. String literals in
//! directives are taken verbatim, without interpolation.

use std::collections::HashMap;

use tracing::trace;

use super::{TemplateEngine, TemplateError};
use crate::context::{RenderContext, Value};

mod expr;
mod parse;

use self::parse::Node;

#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityEngine;

impl TemplateEngine for VelocityEngine {
    fn render(
        &self,
        name: &str,
        source: &str,
        context: &RenderContext,
    ) -> Result<String, TemplateError> {
        let nodes = parse::parse(source)?;
        trace!(template = name, nodes = nodes.len(), "parsed template");

        let mut scope = Scope {
            context,
            locals: HashMap::new(),
        };
        let mut out = String::with_capacity(source.len());
        scope.render(&nodes, &mut out)?;
        Ok(out)
    }
}

/// Context bindings overlaid with variables assigned by `#set`.
struct Scope<'a> {
    context: &'a RenderContext,
    locals: HashMap<String, Value>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .or_else(|| self.context.get(name))
            .cloned()
    }

    fn render(&mut self, nodes: &[Node], out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Ref(r) => match self.lookup(&r.name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None if r.quiet => {}
                    None => {
                        return Err(TemplateError::Undefined {
                            line: r.line,
                            name: r.name.clone(),
                        });
                    }
                },
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for branch in branches {
                        let value = expr::eval(&branch.condition, &|n: &str| self.lookup(n))
                            .map_err(|message| TemplateError::Eval {
                                line: branch.line,
                                message,
                            })?;
                        if expr::truthy(value.as_ref()) {
                            taken = Some(&branch.body);
                            break;
                        }
                    }
                    self.render(taken.unwrap_or(otherwise), out)?;
                }
                Node::Set { name, value, line } => {
                    let eval_error = |message| TemplateError::Eval {
                        line: *line,
                        message,
                    };
                    let value = expr::eval(value, &|n: &str| self.lookup(n))
                        .map_err(eval_error)?
                        .ok_or_else(|| {
                            eval_error(format!("right-hand side of #set(${name}) is undefined"))
                        })?;
                    self.locals.insert(name.clone(), value);
                }
            }
        }
        Ok(())
    }
}
