//! Target size computation for the resize step.
//!
//! Pure functions, no image data involved.

use crate::models::Dimensions;

/// Fit `natural` inside `max_width` x `max_height`, preserving aspect ratio.
///
/// Images already within bounds are returned unchanged; nothing is ever
/// upscaled. Otherwise both sides are scaled by
/// `min(max_width / width, max_height / height)` and rounded to the nearest
/// pixel, never below 1 and never above the bound.
///
/// ```
/// # use blog_admin::image::dimensions::target_dimensions;
/// # use blog_admin::models::Dimensions;
/// assert_eq!(
///     target_dimensions(Dimensions::new(3000, 2000), 1920, 1080),
///     Dimensions::new(1620, 1080)
/// );
/// ```
pub fn target_dimensions(natural: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    if natural.fits_within(max_width, max_height) {
        return natural;
    }

    let ratio = scale_ratio(natural, max_width, max_height);
    Dimensions {
        width: scale_side(natural.width, ratio, max_width),
        height: scale_side(natural.height, ratio, max_height),
    }
}

fn scale_ratio(natural: Dimensions, max_width: u32, max_height: u32) -> f64 {
    let ratio_w = max_width as f64 / natural.width as f64;
    let ratio_h = max_height as f64 / natural.height as f64;
    ratio_w.min(ratio_h)
}

fn scale_side(side: u32, ratio: f64, bound: u32) -> u32 {
    ((side as f64 * ratio).round() as u32).clamp(1, bound.max(1))
}
