//! Functionality to render images on a borderless desktop window

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::display::{deadline_after, Display};
use crate::errors::{ConveyorError, ConveyorResult};
use image::RgbImage;
use minifb::{Key, ScaleMode, Window, WindowOptions};

/// How often window events are pumped while an image is shown
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A display driver rendering to a minifb window
pub struct MiniFBDisplay {
    window: Window,
    buffer: Vec<u32>,
}

impl MiniFBDisplay {
    /// Open a borderless, top-most window of the given size at the screen's
    /// origin. minifb cannot switch to full-screen mode, so the window is
    /// expected to be sized to the screen.
    pub fn new(width: u32, height: u32) -> ConveyorResult<Self> {
        let mut window = Window::new(
            "Conveyor",
            width as _,
            height as _,
            WindowOptions {
                borderless: true,
                title: false,
                resize: false,
                topmost: true,
                scale_mode: ScaleMode::Stretch,
                ..WindowOptions::default()
            },
        )?;
        window.set_position(0, 0);
        window.limit_update_rate(Some(Duration::from_millis(20)));
        Ok(Self {
            window,
            buffer: vec![0; (width * height) as _],
        })
    }

    fn is_closed(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }
}

fn from_rgb(pixel: &image::Rgb<u8>) -> u32 {
    let [r, g, b] = pixel.0;
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

impl Display for MiniFBDisplay {
    fn render(&mut self, img: &RgbImage) -> ConveyorResult<()> {
        let _t = crate::Timer::new(|e| debug!("Rendering {}ms", e.as_millis()));
        let (width, height) = self.dimensions();
        self.buffer.clear();
        self.buffer.extend(img.pixels().map(from_rgb));
        self.buffer.resize((width * height) as _, 0);
        self.window
            .update_with_buffer(&self.buffer, width as _, height as _)?;
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        let (x, y) = self.window.get_size();
        (x as _, y as _)
    }

    fn wait(&mut self, interval: Duration, stop: &AtomicBool) -> ConveyorResult<()> {
        let deadline = deadline_after(interval)?;
        loop {
            if stop.load(Ordering::SeqCst) || self.is_closed() {
                return Err(ConveyorError::Terminate);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            self.window.update();
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}
