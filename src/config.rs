//! Configuration data for Conveyor

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ConveyorError, ConveyorResult};

/// Name of the configuration file looked up in the XDG config directories
pub const CONFIG_FILE: &str = "conveyor.toml";

/// Longest time a single image may stay on screen, one day
pub const MAX_DISPLAY_TIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Prefix of environment variables overriding configuration keys
pub const ENV_PREFIX: &str = "CONVEYOR";

/// The surface images are shown on
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayDriver {
    /// A borderless desktop window covering the screen
    Window,
    /// The Linux framebuffer console device
    Framebuffer,
}

/// Config file root structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Folder to read images from (mandatory, from any source)
    pub image_folder: Option<PathBuf>,
    /// Seconds each image stays on screen
    pub display_time: f64,
    /// Probability of degrading an image, 0.1 = one out of ten
    pub modification_rate: f64,
    pub display: DisplayDriver,
    /// Framebuffer device for the `framebuffer` display
    pub framebuffer: PathBuf,
    /// Size of the full-screen window
    pub width: u32,
    pub height: u32,
    /// Font file for the caption, the system sans-serif font if unset
    pub font: Option<PathBuf>,
    /// Caption font size in pixels
    pub font_size: f32,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_folder: None,
            display_time: 3.,
            modification_rate: 0.1,
            display: DisplayDriver::Window,
            framebuffer: PathBuf::from("/dev/fb0"),
            width: 1920,
            height: 1080,
            font: None,
            font_size: 20.,
            seed: None,
        }
    }
}

/// The configuration file in the user's XDG config directory, if present
pub fn default_config_file() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("conveyor")
        .ok()
        .and_then(|dirs| dirs.find_config_file(CONFIG_FILE))
}

impl Settings {
    /// Layer an optional configuration file and `CONVEYOR_*` environment
    /// variables over the defaults.
    pub fn load(file: Option<&Path>) -> ConveyorResult<Self> {
        let mut config = ::config::Config::default();
        if let Some(file) = file {
            debug!("Reading configuration from {}", file.display());
            config.merge(::config::File::from(file).required(true))?;
        }
        config.merge(::config::Environment::with_prefix(ENV_PREFIX))?;
        Ok(config.try_into()?)
    }

    /// How long each image stays on screen.
    pub fn interval(&self) -> ConveyorResult<Duration> {
        match Duration::try_from_secs_f64(self.display_time) {
            Ok(interval) if !interval.is_zero() && interval <= MAX_DISPLAY_TIME => Ok(interval),
            _ => Err(ConveyorError::InvalidSetting(format!(
                "display_time must be positive and at most {}s, got {}",
                MAX_DISPLAY_TIME.as_secs(),
                self.display_time
            ))),
        }
    }

    /// Check ranges and the presence of the image folder.
    pub fn validate(self) -> ConveyorResult<Self> {
        if self.image_folder.is_none() {
            return Err(ConveyorError::InvalidSetting(
                "image_folder is required".to_string(),
            ));
        }
        self.interval()?;
        if !(0. ..=1.).contains(&self.modification_rate) {
            return Err(ConveyorError::InvalidSetting(format!(
                "modification_rate must be within [0, 1], got {}",
                self.modification_rate
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConveyorError::InvalidSetting(format!(
                "window size must not be empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.) {
            return Err(ConveyorError::InvalidSetting(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(self)
    }
}
