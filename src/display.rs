use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::errors::{ConveyorError, ConveyorResult};
use crate::font::FontRenderer;
use crate::provider::{Frame, Provider};

/// A surface covering the whole screen
pub trait Display {
    /// Show `img`, which matches `dimensions()`.
    fn render(&mut self, img: &RgbImage) -> ConveyorResult<()>;

    fn dimensions(&self) -> (u32, u32);

    /// Keep the current image up for `interval` while handling the surface's
    /// events. Returns `ConveyorError::Terminate` once the user closes the
    /// surface or `stop` is raised.
    fn wait(&mut self, interval: Duration, stop: &AtomicBool) -> ConveyorResult<()>;
}

/// The instant `interval` from now, or an error if the clock cannot represent it.
pub fn deadline_after(interval: Duration) -> ConveyorResult<Instant> {
    Instant::now().checked_add(interval).ok_or_else(|| {
        ConveyorError::InvalidSetting(format!("display interval {:?} is out of range", interval))
    })
}

/// Caption drawn in the top-left corner of every frame
pub struct Overlay {
    font: Option<FontRenderer>,
    font_size: f32,
}

impl Overlay {
    pub fn new(font: Option<FontRenderer>, font_size: f32) -> Self {
        Self { font, font_size }
    }

    /// Stretch the frame over the whole surface and place the caption on top.
    pub fn compose(&self, frame: &Frame, dimensions: (u32, u32)) -> RgbImage {
        let _t = crate::Timer::new(|e| debug!("Compose {}ms", e.as_millis()));
        let (width, height) = dimensions;
        // Blowing up with nearest keeps pixelation blocks crisp
        let filter = if width >= frame.image.width() && height >= frame.image.height() {
            FilterType::Nearest
        } else {
            FilterType::Triangle
        };
        let mut canvas = imageops::resize(&frame.image, width, height, filter);
        if let Some(font) = &self.font {
            let margin_x = width / 100;
            let margin_y = height / 100;
            match font.render(&frame.caption, self.font_size, width - margin_x) {
                Ok(caption) => {
                    imageops::replace(&mut canvas, &caption, margin_x as i64, margin_y as i64)
                }
                Err(e) => warn!("Failed to render caption {:?}: {}", frame.caption, e),
            }
        }
        canvas
    }
}

/// Show frames until the user interrupts.
///
/// Skipped images are retried with the next path right away. Returns `Ok`
/// once the display or `stop` asks to terminate; every other error is passed
/// on.
pub fn main_loop<P: Provider, D: Display>(
    provider: &mut P,
    display: &mut D,
    overlay: &Overlay,
    interval: Duration,
    stop: &AtomicBool,
) -> ConveyorResult<()> {
    info!("main_loop, dimensions: {:?}", display.dimensions());
    match run(provider, display, overlay, interval, stop) {
        Err(ConveyorError::Terminate) => Ok(()),
        res => res,
    }
}

fn run<P: Provider, D: Display>(
    provider: &mut P,
    display: &mut D,
    overlay: &Overlay,
    interval: Duration,
    stop: &AtomicBool,
) -> ConveyorResult<()> {
    loop {
        let frame = loop {
            if stop.load(Ordering::SeqCst) {
                return Err(ConveyorError::Terminate);
            }
            match provider.next_frame() {
                Err(ConveyorError::Retry) => {}
                res => break res?,
            }
        };
        info!("Showing {}", frame.caption);
        let canvas = overlay.compose(&frame, display.dimensions());
        drop(frame);
        display.render(&canvas)?;
        display.wait(interval, stop)?;
    }
}
