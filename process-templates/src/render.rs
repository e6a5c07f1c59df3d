//! Rendering template files to their output locations.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::context::{RenderContext, build_context};
use crate::engine::{EngineKind, TemplateEngine};
use crate::error::{Error, Result};
use crate::fileset::{FileSetSpec, resolve_inputs};

/// Where `input`, possibly still prefixed with `base_dir`, is written under `output_dir`.
///
/// A leading `base_dir` prefix on `input` is dropped, as is `suffix` at the
/// end of the file name. `templates/Foo.java.vm` under base `templates` maps
/// to `<output_dir>/Foo.java`.
pub fn output_path(input: &Path, base_dir: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    mirror(strip_base(input, base_dir), output_dir, suffix)
}

/// Re-root `relative` under `output_dir` and drop `suffix` from its file name.
fn mirror(relative: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let mut out = output_dir.join(relative);
    let stem = out
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .map(str::to_owned);
    if let Some(stem) = stem {
        out.set_file_name(stem);
    }
    out
}

fn strip_base<'a>(input: &'a Path, base_dir: &Path) -> &'a Path {
    let base: PathBuf = base_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if base.as_os_str().is_empty() {
        return input;
    }
    input.strip_prefix(&base).unwrap_or(input)
}

/// Renders template files through one engine.
pub struct TemplateRenderer {
    engine: Box<dyn TemplateEngine>,
    suffix: String,
}

impl TemplateRenderer {
    /// A renderer for `kind` using that engine's default template suffix.
    pub fn new(kind: EngineKind) -> Self {
        Self::with_engine(kind.build(), kind.default_suffix())
    }

    pub fn with_engine(engine: Box<dyn TemplateEngine>, suffix: impl Into<String>) -> Self {
        Self {
            engine,
            suffix: suffix.into(),
        }
    }

    /// Override the template suffix stripped from output file names.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Where `input`, a path relative to the template directory as returned
    /// by [`resolve_inputs`], is written under `output_dir`. Every component
    /// of `input` is kept.
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        mirror(input, output_dir, &self.suffix)
    }

    /// Render `base_dir/input` and write it to its output path, replacing any
    /// existing file. Returns the path written.
    pub fn render(
        &self,
        context: &RenderContext,
        input: &Path,
        base_dir: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let input_file = base_dir.join(input);
        debug!(path = %input_file.display(), "input file");

        let source = std::fs::read_to_string(&input_file).map_err(|source| Error::Read {
            path: input_file.clone(),
            source,
        })?;

        let rendered = self
            .engine
            .render(&input.to_string_lossy(), &source, context)
            .map_err(|source| Error::Template {
                path: input_file.clone(),
                source,
            })?;

        let output_file = self.output_path(input, output_dir);
        debug!(path = %output_file.display(), "output file");

        let write_error = |source| Error::Write {
            path: input_file.clone(),
            output: output_file.clone(),
            source,
        };
        if let Some(parent) = output_file.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&output_file, rendered.as_bytes()).map_err(write_error)?;

        Ok(output_file)
    }

    /// Render every file selected by `spec` for `api_level` into
    /// `output_dir`, stopping at the first failure. Files written before the
    /// failure are left in place.
    pub fn run(
        &self,
        spec: &FileSetSpec,
        api_level: u32,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let context = build_context(api_level);
        let inputs = resolve_inputs(spec)?;
        self.check_collisions(&inputs, &spec.directory, output_dir)?;

        let mut written = Vec::with_capacity(inputs.len());
        for input in &inputs {
            written.push(self.render(&context, input, &spec.directory, output_dir)?);
        }

        info!(
            api_level,
            templates = written.len(),
            output = %output_dir.display(),
            "processed templates"
        );
        Ok(written)
    }

    fn check_collisions(&self, inputs: &[PathBuf], base_dir: &Path, output_dir: &Path) -> Result<()> {
        let mut seen: HashMap<PathBuf, &Path> = HashMap::with_capacity(inputs.len());
        for input in inputs {
            let output = self.output_path(input, output_dir);
            if let Some(first) = seen.get(&output) {
                return Err(Error::Collision {
                    first: base_dir.join(first),
                    second: base_dir.join(input),
                    output,
                });
            }
            seen.insert(output, input);
        }
        Ok(())
    }
}
