use std::path::Path;

use image::{Rgb, RgbImage, RgbaImage};
use rand::Rng;

use crate::effects::Degradation;
use crate::errors::{ConveyorError, ConveyorResult};
use crate::source::ImageSource;

/// A decoded image and the caption shown on top of it
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbImage,
    pub caption: String,
}

impl Frame {
    pub fn original(name: &str, image: RgbImage) -> Self {
        Self {
            image,
            caption: format!("{} - original", name),
        }
    }

    pub fn modified(name: &str, image: RgbImage, degradation: &Degradation) -> Self {
        Self {
            image: degradation.apply(&image),
            caption: format!("{} - modified ({})", name, degradation),
        }
    }
}

/// A path that could not be turned into a frame
#[derive(Debug)]
pub struct SkippedFrame {
    pub caption: String,
    pub error: ConveyorError,
}

pub trait Provider {
    /// The next frame, or `ConveyorError::Retry` if the current image was skipped.
    fn next_frame(&mut self) -> ConveyorResult<Frame>;
}

impl Provider for Box<dyn Provider> {
    fn next_frame(&mut self) -> ConveyorResult<Frame> {
        (**self).next_frame()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Decode the whole image, guessing the format from its contents first.
pub fn load_image_from_path<P: AsRef<Path>>(path: P) -> ConveyorResult<RgbImage> {
    let _t = crate::Timer::new(|e| debug!("Loading took {}ms", e.as_millis()));
    let img = image::io::Reader::open(&path)?
        .with_guessed_format()?
        .decode()?;
    if img.color().has_alpha() {
        Ok(flatten_on_white(&img.to_rgba8()))
    } else {
        Ok(img.to_rgb8())
    }
}

/// Composite over a white background, the way transparent areas look on screen.
pub fn flatten_on_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Loads images and degrades a share of them
pub struct FrameProcessor<R: Rng> {
    rng: R,
    modification_rate: f64,
}

impl<R: Rng> FrameProcessor<R> {
    pub fn new(rng: R, modification_rate: f64) -> Self {
        Self {
            rng,
            modification_rate,
        }
    }

    pub fn process<P: AsRef<Path>>(&mut self, path: P) -> Result<Frame, SkippedFrame> {
        let path = path.as_ref();
        let name = file_name(path);
        let image = match load_image_from_path(path) {
            Ok(image) => image,
            Err(error) => {
                warn!("Error processing image {}: {}", path.display(), error);
                return Err(SkippedFrame {
                    caption: format!("Error: {}", name),
                    error,
                });
            }
        };

        if self.rng.random::<f64>() < self.modification_rate {
            let degradation = Degradation::draw(&mut self.rng);
            debug!("Degrading {} with {}", name, degradation);
            Ok(Frame::modified(&name, image, &degradation))
        } else {
            Ok(Frame::original(&name, image))
        }
    }
}

/// Cycles through an image source and runs every path through a processor
pub struct ConveyorProvider<R: Rng> {
    source: ImageSource,
    processor: FrameProcessor<R>,
}

impl<R: Rng> ConveyorProvider<R> {
    pub fn new(source: ImageSource, processor: FrameProcessor<R>) -> Self {
        Self { source, processor }
    }
}

impl<R: Rng> Provider for ConveyorProvider<R> {
    fn next_frame(&mut self) -> ConveyorResult<Frame> {
        let path = self.source.next_path();
        info!("Loading {}", path.display());
        self.processor
            .process(path)
            .map_err(|_skipped| ConveyorError::Retry)
    }
}
