use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Why a config file could not be turned into a [`crate::HelpdeskConfig`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {format} in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("unsupported config format `.{extension}` ({})", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },
}

impl Error {
    pub(crate) fn parse(path: &Path, format: &'static str, e: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            format,
            message: e.to_string(),
        }
    }
}
