use std::path::PathBuf;
use thiserror::Error;

/// Structural preconditions of a generation pass.
///
/// Data-quality problems (bad tags, unresolved references) are diagnosed and
/// worked around; these are not. Each variant aborts the whole pass and maps
/// to its own process exit code so wrapping scripts can tell them apart.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not find source directory {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("source {} is not a directory", .0.display())]
    SourceNotADirectory(PathBuf),
    #[error("source directory does not contain a {0} subdirectory")]
    SubdirMissing(String),
    #[error("required template \"{0}\" not found")]
    TemplateMissing(String),
}

impl SetupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceMissing(_) => 66,
            Self::SourceNotADirectory(_) => 67,
            Self::SubdirMissing(_) => 68,
            Self::TemplateMissing(_) => 69,
        }
    }
}
