use std::path::PathBuf;

use thiserror::Error;

use crate::style::StyleDecodeError;

/// Everything that can go wrong while turning files on disk into a deck.
///
/// At startup any of these is fatal. Once the presentation is running they
/// are shown as an error slide instead.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front matter in slide {slide}: {message}")]
    PropertiesDecode { slide: usize, message: String },

    #[error("failed to merge configurations: {0}")]
    StyleDecode(#[from] StyleDecodeError),

    #[error("file watch failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl DeckError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
