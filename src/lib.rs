extern crate image;
#[macro_use]
extern crate log;
extern crate minifb;
#[macro_use]
extern crate serde_derive;

use std::time::{Duration, Instant};

pub mod config;
pub mod display;
pub mod display_framebuffer;
pub mod display_minifb;
pub mod effects;
pub mod errors;
pub mod font;
pub mod provider;
pub mod source;

pub(crate) struct Timer<F: Fn(Duration)> {
    start: Instant,
    f: F,
}

impl<F: Fn(Duration)> Timer<F> {
    pub(crate) fn new(f: F) -> Self {
        Self {
            start: Instant::now(),
            f,
        }
    }
}

impl<F: Fn(Duration)> Drop for Timer<F> {
    fn drop(&mut self) {
        (self.f)(self.start.elapsed())
    }
}
