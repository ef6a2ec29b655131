use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::models::FileMeta;

/// Synchronous pre-queue gate. Rejected files never become media items and
/// never touch the upload queue; the message names the offending file.
pub fn validate_file(meta: &FileMeta, config: &UploadConfig) -> Result<()> {
    let is_image = config.is_image(&meta.mime_type);
    let is_video = config.is_video(&meta.mime_type);

    if !is_image && !is_video {
        return Err(Error::Validation(format!(
            "Unsupported file type: {}",
            meta.name
        )));
    }

    if is_video && meta.size_bytes > config.max_video_size {
        return Err(Error::Validation(format!(
            "Video too large: {} (max 1GB)",
            meta.name
        )));
    }

    if is_image && meta.size_bytes > config.max_image_size {
        return Err(Error::Validation(format!(
            "Image too large: {} (max 50MB)",
            meta.name
        )));
    }

    Ok(())
}
