use crate::{
    error::{SwingsyncError, SwingsyncResult},
    frame::{BYTES_PER_PIXEL, RasterFrame},
};

/// Default half-canvas each clip is conformed to; the combined matchup
/// frame is two of these side by side (1280x720).
pub const HALF_WIDTH: u32 = 640;
pub const HALF_HEIGHT: u32 = 720;

/// Aspect-preserving resize onto a centered black canvas.
///
/// `None` input stands in for an absent swing frame and yields an
/// all-black canvas of the target size.
pub fn letterbox(
    frame: Option<&RasterFrame>,
    target_width: u32,
    target_height: u32,
) -> SwingsyncResult<RasterFrame> {
    if target_width == 0 || target_height == 0 {
        return Err(SwingsyncError::validation(
            "letterbox target dimensions must be non-zero",
        ));
    }

    let Some(src) = frame else {
        return Ok(RasterFrame::black(target_width, target_height));
    };
    if src.width == 0 || src.height == 0 {
        return Err(SwingsyncError::validation(
            "letterbox source dimensions must be non-zero",
        ));
    }

    let scale = (f64::from(target_width) / f64::from(src.width))
        .min(f64::from(target_height) / f64::from(src.height));
    let scaled_w = ((f64::from(src.width) * scale) as u32).max(1);
    let scaled_h = ((f64::from(src.height) * scale) as u32).max(1);

    let scaled = if scaled_w == src.width && scaled_h == src.height {
        // Already fits; skipping the resampler keeps re-letterboxing
        // bitwise idempotent.
        src.clone()
    } else {
        resize_bilinear(src, scaled_w, scaled_h)?
    };

    let mut canvas = RasterFrame::black(target_width, target_height);
    let x = (target_width - scaled_w) / 2;
    let y = (target_height - scaled_h) / 2;
    canvas.blit(&scaled, x, y)?;
    Ok(canvas)
}

// Channel order is irrelevant to resampling, so the BGR buffer rides
// through `image`'s RGB resize unchanged.
fn resize_bilinear(src: &RasterFrame, width: u32, height: u32) -> SwingsyncResult<RasterFrame> {
    let img = image::RgbImage::from_raw(src.width, src.height, src.data.clone()).ok_or_else(
        || SwingsyncError::validation("frame buffer does not match its declared dimensions"),
    )?;
    let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
    debug_assert_eq!(
        resized.len(),
        width as usize * height as usize * BYTES_PER_PIXEL
    );
    RasterFrame::from_bgr(width, height, resized.into_raw())
}
