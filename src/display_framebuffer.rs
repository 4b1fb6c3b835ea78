use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::display::{deadline_after, Display};
use crate::errors::{ConveyorError, ConveyorResult};
use framebuffer::{Framebuffer, KdMode};
use image::RgbImage;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A display driver writing to a 32 bit Linux framebuffer device.
///
/// The console is switched to graphics mode while the display is alive and
/// back to text mode when it is dropped.
pub struct FramebufferDisplay {
    framebuffer: Framebuffer,
    buffer: Vec<u8>,
}

impl FramebufferDisplay {
    pub fn new<P: AsRef<Path>>(path_to_device: P) -> ConveyorResult<Self> {
        let framebuffer = Framebuffer::new(path_to_device.as_ref())?;
        let bits_per_pixel = framebuffer.var_screen_info.bits_per_pixel;
        if bits_per_pixel != 32 {
            return Err(ConveyorError::InvalidSetting(format!(
                "{} uses {} bits per pixel, only 32 are supported",
                path_to_device.as_ref().display(),
                bits_per_pixel
            )));
        }
        let _ = Framebuffer::set_kd_mode(KdMode::Graphics)
            .map_err(|e| warn!("Failed to set graphics mode: {:?}", e));
        let buffer = vec![
            0;
            (framebuffer.fix_screen_info.line_length * framebuffer.var_screen_info.yres) as _
        ];
        Ok(Self {
            framebuffer,
            buffer,
        })
    }
}

impl Display for FramebufferDisplay {
    fn render(&mut self, img: &RgbImage) -> ConveyorResult<()> {
        let _t = crate::Timer::new(|e| debug!("Rendering {}ms", e.as_millis()));
        let line_length = self.framebuffer.fix_screen_info.line_length as usize;
        let (width, height) = self.dimensions();
        for (x, y, pixel) in img.enumerate_pixels() {
            if x >= width || y >= height {
                continue;
            }
            let index = y as usize * line_length + x as usize * 4;
            let [r, g, b] = pixel.0;
            self.buffer[index..index + 3].copy_from_slice(&[b, g, r]);
        }
        let len = self.buffer.len().min(self.framebuffer.frame.len());
        self.framebuffer.frame[..len].copy_from_slice(&self.buffer[..len]);
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (
            self.framebuffer.var_screen_info.xres,
            self.framebuffer.var_screen_info.yres,
        )
    }

    fn wait(&mut self, interval: Duration, stop: &AtomicBool) -> ConveyorResult<()> {
        let deadline = deadline_after(interval)?;
        loop {
            if stop.load(Ordering::SeqCst) {
                return Err(ConveyorError::Terminate);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for FramebufferDisplay {
    fn drop(&mut self) {
        let _ = Framebuffer::set_kd_mode(KdMode::Text)
            .map_err(|e| warn!("Failed to restore text mode: {:?}", e));
    }
}
