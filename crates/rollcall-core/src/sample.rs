//! Face sample extraction — crop a detected region and normalize it to the
//! fixed sample dimensions.

use crate::types::{FaceRegion, Sample, SAMPLE_SIZE};
use image::imageops::FilterType;
use image::GrayImage;

/// Crop `region` out of a grayscale frame and resize it to
/// [`SAMPLE_SIZE`]×[`SAMPLE_SIZE`].
///
/// The region is clamped to the frame bounds before cropping. Returns
/// `None` when the frame buffer is malformed or the clamped region is
/// empty.
pub fn extract(gray: &[u8], width: u32, height: u32, region: &FaceRegion) -> Option<Sample> {
    if gray.len() < (width * height) as usize || width == 0 || height == 0 {
        return None;
    }

    let x = region.x.min(width.saturating_sub(1));
    let y = region.y.min(height.saturating_sub(1));
    let w = region.width.min(width - x);
    let h = region.height.min(height - y);
    if w == 0 || h == 0 {
        return None;
    }

    let frame = GrayImage::from_raw(width, height, gray[..(width * height) as usize].to_vec())?;
    let crop = image::imageops::crop_imm(&frame, x, y, w, h).to_image();
    let resized = image::imageops::resize(&crop, SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle);

    Sample::from_raw(resized.into_raw())
}
