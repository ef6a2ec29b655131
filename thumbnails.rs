use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

pub const THUMB_WIDTH: u32 = 220;
pub const THUMB_HEIGHT: u32 = 116;
const JPEG_QUALITY: u8 = 70;

/// Build a small preview for a picked file and return it as an embeddable
/// `data:image/jpeg;base64,...` string. Decode failures of any kind resolve
/// to `None`; callers fall back to a placeholder rather than propagating an
/// error.
pub fn generate(path: &Path, mime: &str) -> Option<String> {
    let result = if mime.starts_with("video/") {
        video_thumbnail(path)
    } else {
        image_thumbnail(path)
    };
    match result {
        Ok(data_url) => Some(data_url),
        Err(err) => {
            log::warn!("Thumbnail generation failed for {}: {}", path.display(), err);
            None
        }
    }
}

fn image_thumbnail(path: &Path) -> Result<String> {
    let img = image::open(path)?;
    encode_cover_fit(&img)
}

#[cfg(feature = "video-thumbs")]
fn video_thumbnail(path: &Path) -> Result<String> {
    let frame = crate::video_frame::grab_frame(path, 1.0)?;
    encode_cover_fit(&DynamicImage::ImageRgba8(frame))
}

#[cfg(not(feature = "video-thumbs"))]
fn video_thumbnail(path: &Path) -> Result<String> {
    Err(Error::Decode(format!(
        "video frame decoding not built in; no thumbnail for {}",
        path.display()
    )))
}

/// Cover-fit scale into the target box: the frame always fills the full
/// 220x116 canvas and overflow is cropped centered, matching the preview
/// cards the submission form renders.
pub(crate) fn encode_cover_fit(img: &DynamicImage) -> Result<String> {
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(Error::Decode("zero-sized frame".into()));
    }

    let scale = f64::max(
        THUMB_WIDTH as f64 / src_w as f64,
        THUMB_HEIGHT as f64 / src_h as f64,
    );
    let scaled_w = ((src_w as f64 * scale).round() as u32).max(THUMB_WIDTH);
    let scaled_h = ((src_h as f64 * scale).round() as u32).max(THUMB_HEIGHT);
    let scaled = img.resize_exact(scaled_w, scaled_h, FilterType::CatmullRom);

    let x = (scaled_w - THUMB_WIDTH) / 2;
    let y = (scaled_h - THUMB_HEIGHT) / 2;
    let cropped = image::imageops::crop_imm(&scaled, x, y, THUMB_WIDTH, THUMB_HEIGHT).to_image();
    let rgb = DynamicImage::ImageRgba8(cropped).to_rgb8();

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&buf)))
}
