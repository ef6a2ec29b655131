// Single-frame video decode for thumbnails. Only compiled with the
// `video-thumbs` feature; without it video items simply get no thumbnail.

use crate::error::{Error, Result};
use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::{input, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use image::RgbaImage;
use std::path::Path;

fn dec(err: impl std::fmt::Display) -> Error {
    Error::Decode(err.to_string())
}

/// Decode the frame nearest to `target_secs` (clamped to the clip length)
/// and return it as RGBA pixels at source resolution. The demuxer and
/// decoder are dropped on every exit path, so nothing stays open between
/// thumbnail jobs.
pub fn grab_frame(path: &Path, target_secs: f64) -> Result<RgbaImage> {
    ffmpeg::init().map_err(dec)?;

    let src = path.to_path_buf();
    let mut ictx = input(&src).map_err(dec)?;
    let video_idx = ictx
        .streams()
        .best(Type::Video)
        .ok_or_else(|| Error::Decode("no video stream".into()))?
        .index();

    // Clamp the seek target for clips shorter than the requested timestamp.
    let duration_secs = if ictx.duration() > 0 {
        ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
    } else {
        f64::MAX
    };
    let target = target_secs.min(duration_secs).max(0.0);

    // Backward seek lands on the keyframe before the target; the decode loop
    // below returns the first frame the decoder produces from there.
    if target > 0.0 {
        let seek_ts = (target * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
        if let Err(err) = ictx.seek(seek_ts, ..=seek_ts) {
            log::warn!("Seek failed for {} ({err}); decoding from start", path.display());
        }
    }

    let decoder_ctx = {
        let stream = ictx
            .stream(video_idx)
            .ok_or_else(|| Error::Decode("video stream vanished".into()))?;
        ffmpeg::codec::context::Context::from_parameters(stream.parameters()).map_err(dec)?
    };
    let mut decoder = decoder_ctx.decoder().video().map_err(dec)?;

    let (src_w, src_h) = (decoder.width(), decoder.height());
    if src_w == 0 || src_h == 0 {
        return Err(Error::Decode("zero-sized video frame".into()));
    }
    let mut scaler = SwsContext::get(
        decoder.format(),
        src_w,
        src_h,
        Pixel::RGBA,
        src_w,
        src_h,
        Flags::BILINEAR,
    )
    .map_err(dec)?;

    for (stream, packet) in ictx.packets().flatten() {
        if stream.index() != video_idx {
            continue;
        }
        if decoder.send_packet(&packet).is_err() {
            continue;
        }
        let mut frame = ffmpeg::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut frame).is_ok() {
            let mut rgba = ffmpeg::util::frame::video::Video::empty();
            scaler.run(&frame, &mut rgba).map_err(dec)?;

            let stride = rgba.stride(0);
            let raw = rgba.data(0);
            let row_bytes = src_w as usize * 4;
            let mut pixels = Vec::with_capacity(row_bytes * src_h as usize);
            for row in 0..src_h as usize {
                let start = row * stride;
                pixels.extend_from_slice(&raw[start..start + row_bytes]);
            }
            return RgbaImage::from_raw(src_w, src_h, pixels)
                .ok_or_else(|| Error::Decode("frame buffer size mismatch".into()));
        }
    }

    Err(Error::Decode("no decodable frame".into()))
}
