//! Template discovery: a base directory plus ant-style include/exclude
//! patterns, resolved to a concrete list of relative file paths.

use std::path::PathBuf;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// SCM metadata and editor droppings skipped unless
/// [`FileSetSpec::use_default_excludes`] is turned off.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/.DS_Store",
    "**/CVS/**",
    "**/.cvsignore",
    "**/.svn/**",
    "**/.git/**",
    "**/.gitignore",
    "**/.gitattributes",
    "**/.gitmodules",
    "**/.hg/**",
    "**/.hgignore",
    "**/.bzr/**",
];

/// The set of template files to process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSetSpec {
    /// Base directory; patterns and returned paths are relative to it.
    pub directory: PathBuf,
    /// Files must match at least one of these. Empty means every file.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Files matching any of these are dropped.
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default = "default_true")]
    pub use_default_excludes: bool,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_true() -> bool {
    true
}

impl FileSetSpec {
    /// A spec rooted at `directory` with the given include patterns and
    /// default settings otherwise.
    pub fn new<I, S>(directory: impl Into<PathBuf>, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directory: directory.into(),
            includes: includes.into_iter().map(Into::into).collect(),
            excludes: Vec::new(),
            use_default_excludes: true,
            follow_symlinks: false,
        }
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    fn include_set(&self) -> Result<GlobSet> {
        if self.includes.is_empty() {
            return build_set(["**"]);
        }
        build_set(self.includes.iter().map(String::as_str))
    }

    fn exclude_set(&self) -> Result<GlobSet> {
        let defaults: &[&str] = if self.use_default_excludes {
            DEFAULT_EXCLUDES
        } else {
            &[]
        };
        build_set(
            defaults
                .iter()
                .copied()
                .chain(self.excludes.iter().map(String::as_str)),
        )
    }
}

/// Resolve `spec` to the files it selects, relative to its base directory.
///
/// Directory entries are visited in file-name order, so the result is stable
/// for a given filesystem state.
pub fn resolve_inputs(spec: &FileSetSpec) -> Result<Vec<PathBuf>> {
    let base = &spec.directory;
    if !base.is_dir() {
        return Err(Error::MissingDirectory { path: base.clone() });
    }

    let includes = spec.include_set()?;
    let excludes = spec.exclude_set()?;

    let mut files = Vec::new();
    for entry in WalkDir::new(base)
        .follow_links(spec.follow_symlinks)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Walk {
            path: e.path().unwrap_or(base).to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(base) else {
            continue;
        };
        if !includes.is_match(rel) || excludes.is_match(rel) {
            trace!(path = %rel.display(), "not selected");
            continue;
        }
        files.push(rel.to_path_buf());
    }

    debug!(
        directory = %base.display(),
        count = files.len(),
        "resolved template files"
    );
    Ok(files)
}

/// Compile ant-style patterns into one matcher.
fn build_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = normalize_pattern(pattern);
        let glob = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|source| Error::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| Error::Pattern {
        pattern: String::from("<set>"),
        source,
    })
}

/// `\` becomes `/`, and a trailing separator means everything below it.
fn normalize_pattern(pattern: &str) -> String {
    let mut p = pattern.trim().replace('\\', "/");
    if p.ends_with('/') {
        p.push_str("**");
    }
    p
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn matches(pattern: &str, path: &Path) -> Result<bool> {
        Ok(build_set([pattern])?.is_match(path))
    }

    #[test]
    fn trailing_separator_selects_subtree() {
        assert_eq!(normalize_pattern("gen/"), "gen/**");
        assert_eq!(normalize_pattern("gen\\"), "gen/**");
        assert_eq!(normalize_pattern(" a\\b.vm "), "a/b.vm");
    }

    #[test]
    fn star_stays_within_one_directory() {
        assert!(matches("*.vm", Path::new("a.vm")).unwrap());
        assert!(!matches("*.vm", Path::new("sub/a.vm")).unwrap());
        assert!(matches("**/*.vm", Path::new("a.vm")).unwrap());
        assert!(matches("**/*.vm", Path::new("x/y/a.vm")).unwrap());
        assert!(matches("sub/?.vm", Path::new("sub/a.vm")).unwrap());
        assert!(!matches("sub/?.vm", Path::new("sub/ab.vm")).unwrap());
    }

    #[test]
    fn invalid_pattern_is_a_discovery_error() {
        let err = matches("a[", Path::new("a")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Discovery);
        assert!(err.to_string().contains("a["), "{err}");
    }

    #[test]
    fn default_excludes_cover_scm_dirs() {
        let spec = FileSetSpec::new(".", ["**"]);
        let set = spec.exclude_set().unwrap();
        assert!(set.is_match(".git/config"));
        assert!(set.is_match("src/.svn/entries"));
        assert!(set.is_match("Foo.java.vm~"));
        assert!(!set.is_match("Foo.java.vm"));
    }
}
