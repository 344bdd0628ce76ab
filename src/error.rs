use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SorterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Worker pool failed: {0}")]
    Pool(String),

    #[error("Sample directory already exists: {0}")]
    SampleDirExists(PathBuf),

    #[error("Malformed sample table row: {0}")]
    TableFormat(String),

    #[error(transparent)]
    Prompt(#[from] crate::prompt::PromptError),
}

pub type Result<T> = std::result::Result<T, SorterError>;
