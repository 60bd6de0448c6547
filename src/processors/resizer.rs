// imgchain/src/processors/resizer.rs
use crate::core::{FitMode, ResizeAlgorithm};
use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbaImage};

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn resize(&self, image: &DynamicImage, width: u32, height: u32, fit: FitMode) -> DynamicImage {
        let (orig_width, orig_height) = image.dimensions();
        let filter = self.get_filter_type();

        log::debug!(
            "Resizing image from {}x{} to {}x{} ({:?})",
            orig_width,
            orig_height,
            width,
            height,
            fit
        );

        match fit {
            FitMode::Fill => self.resize_exact(image, width, height),
            FitMode::Cover => {
                if (orig_width, orig_height) == (width, height) {
                    return image.clone();
                }
                image.resize_to_fill(width, height, filter)
            }
            FitMode::Inside | FitMode::Outside => {
                let (w, h) = calculate_dimensions(orig_width, orig_height, width, height, fit);
                self.resize_exact(image, w, h)
            }
            FitMode::Contain => {
                let (w, h) = calculate_dimensions(orig_width, orig_height, width, height, fit);
                let scaled = self.resize_exact(image, w, h).to_rgba8();

                let mut canvas = RgbaImage::new(width, height);
                let x = i64::from((width - w) / 2);
                let y = i64::from((height - h) / 2);
                image::imageops::overlay(&mut canvas, &scaled, x, y);
                DynamicImage::ImageRgba8(canvas)
            }
        }
    }

    pub fn resize_exact(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        if width == image.width() && height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resize");
            return image.clone();
        }

        image.resize_exact(width, height, self.get_filter_type())
    }

    fn get_filter_type(&self) -> FilterType {
        match self.algorithm {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Size of the scaled image before any crop or padding.
///
/// `Inside` and `Contain` scale to fit within the box, `Outside` and
/// `Cover` scale to cover it, `Fill` ignores the aspect ratio.
pub fn calculate_dimensions(
    orig_w: u32,
    orig_h: u32,
    target_w: u32,
    target_h: u32,
    fit: FitMode,
) -> (u32, u32) {
    if orig_w == 0 || orig_h == 0 {
        return (target_w, target_h);
    }

    let ratio_w = target_w as f64 / orig_w as f64;
    let ratio_h = target_h as f64 / orig_h as f64;

    let ratio = match fit {
        FitMode::Fill => return (target_w, target_h),
        FitMode::Inside | FitMode::Contain => ratio_w.min(ratio_h),
        FitMode::Outside | FitMode::Cover => ratio_w.max(ratio_h),
    };

    let new_w = (orig_w as f64 * ratio).round() as u32;
    let new_h = (orig_h as f64 * ratio).round() as u32;

    let (new_w, new_h) = (new_w.max(1), new_h.max(1));
    match fit {
        FitMode::Inside | FitMode::Contain => (new_w.min(target_w), new_h.min(target_h)),
        _ => (new_w, new_h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_fits_within_box() {
        assert_eq!(calculate_dimensions(4000, 3000, 800, 800, FitMode::Inside), (800, 600));
        assert_eq!(calculate_dimensions(3000, 4000, 800, 800, FitMode::Contain), (600, 800));
    }

    #[test]
    fn outside_covers_box() {
        assert_eq!(calculate_dimensions(4000, 3000, 800, 800, FitMode::Outside), (1067, 800));
        assert_eq!(calculate_dimensions(4000, 3000, 800, 800, FitMode::Cover), (1067, 800));
    }

    #[test]
    fn fill_ignores_aspect() {
        assert_eq!(calculate_dimensions(4000, 3000, 100, 700, FitMode::Fill), (100, 700));
    }

    #[test]
    fn every_fit_mode_produces_expected_canvas() {
        let image = DynamicImage::new_rgb8(40, 20);
        let resizer = Resizer::new(ResizeAlgorithm::Nearest);

        assert_eq!(resizer.resize(&image, 10, 10, FitMode::Cover).dimensions(), (10, 10));
        assert_eq!(resizer.resize(&image, 10, 10, FitMode::Contain).dimensions(), (10, 10));
        assert_eq!(resizer.resize(&image, 10, 10, FitMode::Fill).dimensions(), (10, 10));
        assert_eq!(resizer.resize(&image, 10, 10, FitMode::Inside).dimensions(), (10, 5));
        assert_eq!(resizer.resize(&image, 10, 10, FitMode::Outside).dimensions(), (20, 10));
    }
}
