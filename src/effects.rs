//! The glitch: blocky pixelation and a contrast shift with random parameters

use std::fmt;
use std::ops::RangeInclusive;

use image::imageops::{self, FilterType};
use image::RgbImage;
use rand::Rng;

/// Range of the pixelation factor, inclusive
pub const PIXELATION_FACTORS: RangeInclusive<u32> = 2..=8;

/// Contrast bands, one is picked uniformly before drawing a value from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastBand {
    /// Mushy, almost flat gray
    WashedOut,
    Mild,
    Extreme,
}

impl ContrastBand {
    pub const ALL: [ContrastBand; 3] = [
        ContrastBand::WashedOut,
        ContrastBand::Mild,
        ContrastBand::Extreme,
    ];

    pub fn range(self) -> RangeInclusive<f64> {
        match self {
            ContrastBand::WashedOut => 0.0..=0.2,
            ContrastBand::Mild => 0.5..=1.8,
            ContrastBand::Extreme => 3.0..=5.0,
        }
    }

    /// The band a contrast factor belongs to, if any
    pub fn of(contrast: f64) -> Option<ContrastBand> {
        Self::ALL
            .iter()
            .copied()
            .find(|band| band.range().contains(&contrast))
    }
}

/// Parameters of one degraded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Degradation {
    pub pixelation: u32,
    pub contrast: f64,
}

impl Degradation {
    /// Draw a pixelation factor and a contrast factor rounded to two decimals.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let pixelation = rng.random_range(PIXELATION_FACTORS);
        let band = ContrastBand::ALL[rng.random_range(0..ContrastBand::ALL.len())];
        let contrast = (rng.random_range(band.range()) * 100.).round() / 100.;
        Self {
            pixelation,
            contrast,
        }
    }

    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        adjust_contrast(&pixelate(img, self.pixelation), self.contrast)
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:?}` keeps the decimal point on whole numbers: 3.0, not 3
        write!(f, "px {}, contrast {:?}", self.pixelation, self.contrast)
    }
}

/// Shrink by `factor` and blow back up, both with nearest-neighbor sampling.
///
/// The intermediate image is at least 1x1, so images smaller than the factor
/// collapse to a single color instead of failing.
pub fn pixelate(img: &RgbImage, factor: u32) -> RgbImage {
    let factor = factor.max(1);
    let (width, height) = img.dimensions();
    let small = imageops::resize(
        img,
        (width / factor).max(1),
        (height / factor).max(1),
        FilterType::Nearest,
    );
    imageops::resize(&small, width, height, FilterType::Nearest)
}

/// ITU-R 601 luma in 16.16 fixed point, rounded
fn luma(pixel: &image::Rgb<u8>) -> u32 {
    let [r, g, b] = pixel.0;
    (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16
}

/// Mean luma of the image, rounded to the nearest gray level
pub fn mean_gray(img: &RgbImage) -> u8 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0;
    }
    let sum: u64 = img.pixels().map(|p| luma(p) as u64).sum();
    (sum as f64 / count as f64 + 0.5) as u8
}

/// Interpolate every channel between the mean gray level and itself.
///
/// A factor of 1 returns the image unchanged, 0 a flat gray image, and values
/// above 1 push channels away from the mean.
pub fn adjust_contrast(img: &RgbImage, factor: f64) -> RgbImage {
    let gray = mean_gray(img) as f64;
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = gray + factor * (*channel as f64 - gray);
            *channel = if value <= 0. {
                0
            } else if value >= 255. {
                255
            } else {
                value as u8
            };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = Vec::new();
        for _ in 0..2000 {
            let d = Degradation::draw(&mut rng);
            assert!(PIXELATION_FACTORS.contains(&d.pixelation), "{:?}", d);
            let band = ContrastBand::of(d.contrast).unwrap_or_else(|| panic!("{:?}", d));
            assert_eq!((d.contrast * 100.).round() / 100., d.contrast);
            if !seen.contains(&band) {
                seen.push(band);
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn caption_fragment() {
        let d = Degradation {
            pixelation: 4,
            contrast: 4.2,
        };
        assert_eq!(d.to_string(), "px 4, contrast 4.2");
        let d = Degradation {
            pixelation: 2,
            contrast: 3.0,
        };
        assert_eq!(d.to_string(), "px 2, contrast 3.0");
    }

    #[test]
    fn pixelate_builds_uniform_blocks() {
        let img = gradient(100, 100);
        let out = pixelate(&img, 4);
        assert_eq!(out.dimensions(), (100, 100));
        for by in (0..100).step_by(4) {
            for bx in (0..100).step_by(4) {
                let first = out.get_pixel(bx, by);
                for y in by..by + 4 {
                    for x in bx..bx + 4 {
                        assert_eq!(out.get_pixel(x, y), first);
                    }
                }
            }
        }
        // 25x25 distinct source samples survive
        let mut colors: Vec<_> = out.pixels().map(|p| p.0).collect();
        colors.sort_unstable();
        colors.dedup();
        assert!(colors.len() > 1);
    }

    #[test]
    fn pixelate_smaller_than_factor() {
        let img = gradient(3, 2);
        let out = pixelate(&img, 8);
        assert_eq!(out.dimensions(), (3, 2));
        let first = *out.get_pixel(0, 0);
        assert!(out.pixels().all(|p| *p == first));

        let line = gradient(1, 50);
        assert_eq!(pixelate(&line, 5).dimensions(), (1, 50));
    }

    #[test]
    fn contrast_one_is_identity() {
        let img = gradient(32, 16);
        assert_eq!(adjust_contrast(&img, 1.0), img);
    }

    #[test]
    fn contrast_zero_is_flat_mean_gray() {
        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let out = adjust_contrast(&img, 0.0);
        // mean of 0 and 255 is 127.5, rounds up
        assert!(out.pixels().all(|p| p.0 == [128, 128, 128]));
    }

    #[test]
    fn contrast_above_one_spreads_values() {
        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([100, 100, 100]) } else { Rgb([150, 150, 150]) });
        let out = adjust_contrast(&img, 2.0);
        assert_eq!(out.get_pixel(0, 0).0, [75, 75, 75]);
        assert_eq!(out.get_pixel(1, 0).0, [175, 175, 175]);

        let out = adjust_contrast(&img, 5.0);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [250, 250, 250]);
    }

    #[test]
    fn apply_pixelates_then_adjusts_contrast() {
        let img = gradient(100, 100);
        let d = Degradation {
            pixelation: 4,
            contrast: 4.2,
        };
        let expected = adjust_contrast(&pixelate(&img, 4), 4.2);
        assert_eq!(d.apply(&img), expected);
    }
}
