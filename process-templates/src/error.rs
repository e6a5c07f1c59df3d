//! Error types for a template processing run.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::TemplateError;

/// Coarse classification of [`Error`], one per failure stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Discovery,
    Read,
    Template,
    Write,
}

/// Every failure aborts the run. Per-file variants carry the template path.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("template directory {} does not exist or is not a directory", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("invalid file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("failed to walk template directory {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error(
        "templates {} and {} both render to {}",
        first.display(),
        second.display(),
        output.display()
    )]
    Collision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    #[error("error reading template file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error processing template file {}: {source}", path.display())]
    Template {
        path: PathBuf,
        source: TemplateError,
    },

    #[error(
        "error writing {} for template file {}: {source}",
        output.display(),
        path.display()
    )]
    Write {
        path: PathBuf,
        output: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigRead { .. } | Error::ConfigParse { .. } => ErrorKind::Config,
            Error::MissingDirectory { .. }
            | Error::Pattern { .. }
            | Error::Walk { .. }
            | Error::Collision { .. } => ErrorKind::Discovery,
            Error::Read { .. } => ErrorKind::Read,
            Error::Template { .. } => ErrorKind::Template,
            Error::Write { .. } => ErrorKind::Write,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
