//! Configuration types for `process-templates.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::EngineKind;
use crate::error::{Error, Result};
use crate::fileset::FileSetSpec;

/// Root configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root under which rendered files are written.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Target platform API level; selects the pointer type names.
    pub api_level: u32,
    /// Which templates to render.
    pub template_files: FileSetSpec,
    #[serde(default)]
    pub render: RenderConfig,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("target")
}

/// Engine selection.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default)]
    pub engine: EngineKind,
    /// Template suffix stripped from output names. Defaults per engine
    /// (`.vm` for velocity, `.hbs` for handlebars).
    #[serde(default)]
    pub suffix: Option<String>,
}

impl RenderConfig {
    pub fn suffix(&self) -> &str {
        self.suffix
            .as_deref()
            .unwrap_or_else(|| self.engine.default_suffix())
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output_directory: Option<PathBuf>,
    pub api_level: Option<u32>,
}

impl Config {
    /// Resolve relative output and template directories against `base_dir`
    /// (the directory holding the config file).
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if self.output_directory.is_relative() {
            self.output_directory = base_dir.join(&self.output_directory);
        }
        if self.template_files.directory.is_relative() {
            self.template_files.directory = base_dir.join(&self.template_files.directory);
        }
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.output_directory {
            self.output_directory = dir.clone();
        }
        if let Some(level) = overrides.api_level {
            self.api_level = level;
        }
    }
}

/// Load and parse a `process-templates.toml` configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(
            r#"
            api_level = 19

            [template_files]
            directory = "src/main/templates"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api_level, 19);
        assert_eq!(cfg.output_directory, PathBuf::from("target"));
        assert!(cfg.template_files.includes.is_empty());
        assert!(cfg.template_files.use_default_excludes);
        assert!(!cfg.template_files.follow_symlinks);
        assert_eq!(cfg.render.engine, EngineKind::Velocity);
        assert_eq!(cfg.render.suffix(), ".vm");
    }

    #[test]
    fn full_config() {
        let cfg = parse_config(
            r#"
            output_directory = "gen"
            api_level = 23

            [template_files]
            directory = "templates"
            includes = ["**/*.hbs"]
            excludes = ["legacy/**"]
            use_default_excludes = false
            follow_symlinks = true

            [render]
            engine = "handlebars"
            suffix = ".tpl"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output_directory, PathBuf::from("gen"));
        assert_eq!(cfg.template_files.includes, vec!["**/*.hbs".to_string()]);
        assert_eq!(cfg.template_files.excludes, vec!["legacy/**".to_string()]);
        assert!(!cfg.template_files.use_default_excludes);
        assert!(cfg.template_files.follow_symlinks);
        assert_eq!(cfg.render.engine, EngineKind::Handlebars);
        assert_eq!(cfg.render.suffix(), ".tpl");
    }

    #[test]
    fn rejects_missing_and_unknown_fields() {
        assert!(parse_config("[template_files]\ndirectory = \"t\"\n").is_err());
        assert!(parse_config("api_level = 21\n").is_err());
        assert!(
            parse_config("api_level = 21\napilevel = 3\n[template_files]\ndirectory = \"t\"\n")
                .is_err()
        );
        assert!(parse_config("api_level = -1\n[template_files]\ndirectory = \"t\"\n").is_err());
        assert!(
            parse_config(
                "api_level = 21\n[template_files]\ndirectory = \"t\"\n[render]\nengine = \"jinja\"\n"
            )
            .is_err()
        );
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut cfg = parse_config(
            "api_level = 21\noutput_directory = \"/abs/out\"\n[template_files]\ndirectory = \"t\"\n",
        )
        .unwrap();
        cfg.resolve_paths(Path::new("/project"));
        assert_eq!(cfg.output_directory, PathBuf::from("/abs/out"));
        assert_eq!(cfg.template_files.directory, PathBuf::from("/project/t"));
    }

    #[test]
    fn overrides_win() {
        let mut cfg =
            parse_config("api_level = 21\n[template_files]\ndirectory = \"t\"\n").unwrap();
        cfg.apply(&Overrides {
            output_directory: Some(PathBuf::from("elsewhere")),
            api_level: Some(18),
        });
        assert_eq!(cfg.output_directory, PathBuf::from("elsewhere"));
        assert_eq!(cfg.api_level, 18);

        cfg.apply(&Overrides::default());
        assert_eq!(cfg.api_level, 18);
    }
}
