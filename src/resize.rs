use image::{RgbImage, imageops};

use crate::core::Dimensions;

/// Compute output dimensions under the aspect-ratio policy.
///
/// With `keep_aspect_ratio` the source aspect is preserved inside the target
/// box: whichever target axis binds is kept exactly, and the other axis is
/// truncated (not rounded). Without it the target dimensions are used as-is.
pub fn fitted_dimensions(
    target: Dimensions,
    source: Dimensions,
    keep_aspect_ratio: bool,
) -> Dimensions {
    if !keep_aspect_ratio {
        return target;
    }

    let source_aspect = source.aspect();
    let target_aspect = target.aspect();

    if source_aspect > target_aspect {
        // Width is the limiting factor.
        let height = (f64::from(target.width) / source_aspect) as u32;
        Dimensions::new(target.width, height.max(1))
    } else {
        let width = (f64::from(target.height) * source_aspect) as u32;
        Dimensions::new(width.max(1), target.height)
    }
}

/// Resample a frame to the given dimensions.
///
/// Triangle (bilinear) filtering is deterministic for fixed inputs, which the
/// pipeline relies on for reproducible artifacts.
pub fn resize_to_output(img: &RgbImage, dims: Dimensions) -> RgbImage {
    imageops::resize(img, dims.width, dims.height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_aspect_when_disabled() {
        let out = fitted_dimensions(
            Dimensions::new(64, 64),
            Dimensions::new(1920, 1080),
            false,
        );
        assert_eq!(out, Dimensions::new(64, 64));
    }

    #[test]
    fn wide_source_binds_on_width() {
        // 1920/1080 ≈ 1.78 > 1.0, so width is kept and height truncates to 36.
        let out =
            fitted_dimensions(Dimensions::new(64, 64), Dimensions::new(1920, 1080), true);
        assert_eq!(out, Dimensions::new(64, 36));
    }

    #[test]
    fn tall_source_binds_on_height() {
        let out =
            fitted_dimensions(Dimensions::new(64, 64), Dimensions::new(1080, 1920), true);
        assert_eq!(out, Dimensions::new(36, 64));
    }

    #[test]
    fn fitted_output_preserves_aspect_within_truncation() {
        for (w, h) in [(1920u32, 1080u32), (640, 480), (100, 99), (333, 77), (77, 333)] {
            let source = Dimensions::new(w, h);
            let out = fitted_dimensions(Dimensions::new(64, 64), source, true);
            assert!(out.width <= 64 && out.height <= 64);
            // The binding axis is exact; the other truncates by less than one.
            let (ideal, actual) = if out.width == 64 {
                (64.0 / source.aspect(), out.height)
            } else {
                (64.0 * source.aspect(), out.width)
            };
            let drift = ideal - f64::from(actual);
            assert!(
                (0.0..1.0).contains(&drift),
                "source {w}x{h} -> {out:?} (drift {drift})"
            );
        }
    }

    #[test]
    fn extreme_aspect_still_yields_a_drawable_frame() {
        let out =
            fitted_dimensions(Dimensions::new(64, 64), Dimensions::new(4000, 2), true);
        assert_eq!(out.width, 64);
        assert_eq!(out.height, 1);
    }

    #[test]
    fn resample_hits_requested_dimensions() {
        let img = RgbImage::from_pixel(8, 4, image::Rgb([200, 100, 50]));
        let out = resize_to_output(&img, Dimensions::new(4, 2));
        assert_eq!(out.dimensions(), (4, 2));
        // A constant image stays constant under bilinear resampling.
        assert!(out.pixels().all(|p| p.0 == [200, 100, 50]));
    }
}
