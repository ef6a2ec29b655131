use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Http Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload Error: {0}")]
    Upload(String),

    #[error("Upload timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid file: {0}")]
    Validation(String),

    #[error("Decode Error: {0}")]
    Decode(String),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Initialization Failed: {0}")]
    Init(String),
}
