//! Turning slide bodies into styled terminal text.

pub mod ansi;
pub mod markdown;
pub mod syntax;

use thiserror::Error;

pub use markdown::render_markdown;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to highlight code: {0}")]
    Highlight(#[from] syntect::Error),
}
