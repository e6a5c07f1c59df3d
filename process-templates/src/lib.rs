//! process-templates — render API-level dependent source templates.
//!
//! Selects template files under a base directory with ant-style include
//! patterns, binds `apiLevel`, `ptrClass` and `ptrClassBoxed`, renders each
//! file and writes it under an output directory with the template suffix
//! removed.
//!
//! # Quick start
//!
//! From a `process-templates.toml` (suitable for `build.rs`):
//!
//! ```no_run
//! use std::path::Path;
//!
//! let written = process_templates::run(
//!     Path::new("process-templates.toml"),
//!     &process_templates::Overrides::default(),
//! )
//! .unwrap();
//! ```
//!
//! Or without a config file:
//!
//! ```no_run
//! use std::path::Path;
//! use process_templates::{EngineKind, FileSetSpec, TemplateRenderer};
//!
//! let spec = FileSetSpec::new("src/main/templates", ["**/*.vm"]);
//! TemplateRenderer::new(EngineKind::Velocity)
//!     .run(&spec, 21, Path::new("target/generated-sources"))
//!     .unwrap();
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod fileset;
pub mod render;

pub use config::{Config, Overrides};
pub use context::{RenderContext, Value, build_context};
pub use engine::{EngineKind, TemplateEngine, TemplateError};
pub use error::{Error, ErrorKind, Result};
pub use fileset::{FileSetSpec, resolve_inputs};
pub use render::{TemplateRenderer, output_path};

/// Run the full pipeline: load config, apply `overrides`, and render every
/// selected template.
///
/// Relative paths in the config resolve against the config file's directory.
/// Returns the paths written, in processing order.
pub fn run(config_path: &Path, overrides: &Overrides) -> Result<Vec<PathBuf>> {
    let mut cfg = config::load_config(config_path)?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    cfg.resolve_paths(base_dir);
    cfg.apply(overrides);

    run_config(&cfg)
}

/// Render the templates described by an already-loaded [`Config`].
///
/// Paths are used as given; see [`Config::resolve_paths`].
pub fn run_config(cfg: &Config) -> Result<Vec<PathBuf>> {
    info!(
        api_level = cfg.api_level,
        directory = %cfg.template_files.directory.display(),
        engine = ?cfg.render.engine,
        "loaded configuration"
    );

    TemplateRenderer::new(cfg.render.engine)
        .suffix(cfg.render.suffix())
        .run(&cfg.template_files, cfg.api_level, &cfg.output_directory)
}
