use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GIB: u64 = 1024 * 1024 * 1024;
pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub media_upload_webhook: String,
    pub final_submission_webhook: String,
    #[serde(default = "default_max_video_size")]
    pub max_video_size: u64,
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    #[serde(default = "default_allowed_image_types")]
    pub allowed_image_types: Vec<String>,
    #[serde(default = "default_allowed_video_types")]
    pub allowed_video_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            media_upload_webhook: String::new(),
            final_submission_webhook: String::new(),
            max_video_size: default_max_video_size(),
            max_image_size: default_max_image_size(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            allowed_image_types: default_allowed_image_types(),
            allowed_video_types: default_allowed_video_types(),
        }
    }
}

impl UploadConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        if config.max_concurrent_uploads == 0 {
            return Err(Error::Init(
                "max_concurrent_uploads must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    pub fn is_image(&self, mime: &str) -> bool {
        self.allowed_image_types.iter().any(|t| t == mime)
    }

    pub fn is_video(&self, mime: &str) -> bool {
        self.allowed_video_types.iter().any(|t| t == mime)
    }
}

fn default_max_video_size() -> u64 {
    GIB
}

fn default_max_image_size() -> u64 {
    50 * MIB
}

fn default_max_concurrent_uploads() -> usize {
    2
}

fn default_allowed_image_types() -> Vec<String> {
    ["image/jpeg", "image/jpg", "image/png", "image/heic"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_allowed_video_types() -> Vec<String> {
    ["video/mp4", "video/quicktime", "video/mov"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
