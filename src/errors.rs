//! Conveyor error handling

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Error types within Conveyor
#[derive(std::fmt::Debug)]
pub enum ConveyorError {
    /// Errors interacting with I/O
    IoError(std::io::Error),
    /// Errors from the image library
    ImageError(Arc<image::error::ImageError>),
    /// Errors reading the configuration sources
    ConfigError(::config::ConfigError),
    /// A configuration value outside of its valid range
    InvalidSetting(String),
    /// The image folder did not contain a single displayable file
    NoImages(PathBuf),
    /// Errors from the desktop window
    WindowError(minifb::Error),
    /// Errors from the framebuffer device
    FramebufferError(framebuffer::FramebufferError),
    /// Errors loading a font or rasterizing glyphs
    FontError(String),
    /// Errors installing the interrupt handler
    SignalError(ctrlc::Error),
    /// Pseudo-error to indicate a retry condition
    Retry,
    /// Pseudo-error to indicate program termination
    Terminate,
}

/// Result type for `ConveyorError`
pub type ConveyorResult<T> = Result<T, ConveyorError>;

impl fmt::Display for ConveyorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            ConveyorError::IoError(err) => write!(f, "{}", err),
            ConveyorError::ImageError(err) => write!(f, "{}", err),
            ConveyorError::ConfigError(err) => write!(f, "{}", err),
            ConveyorError::InvalidSetting(msg) => write!(f, "Invalid setting: {}", msg),
            ConveyorError::NoImages(dir) => {
                write!(f, "No images found in {}", dir.display())
            }
            ConveyorError::WindowError(err) => write!(f, "{}", err),
            ConveyorError::FramebufferError(err) => write!(f, "Framebuffer: {:?}", err),
            ConveyorError::FontError(msg) => write!(f, "Font: {}", msg),
            ConveyorError::SignalError(err) => write!(f, "{}", err),
            ConveyorError::Retry => write!(f, "Retry"),
            ConveyorError::Terminate => write!(f, "Terminate"),
        }
    }
}

impl Error for ConveyorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConveyorError::IoError(err) => Some(err),
            ConveyorError::ImageError(err) => Some(err.as_ref()),
            ConveyorError::ConfigError(err) => Some(err),
            ConveyorError::SignalError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConveyorError {
    fn from(err: std::io::Error) -> Self {
        ConveyorError::IoError(err)
    }
}

impl From<image::error::ImageError> for ConveyorError {
    fn from(err: image::error::ImageError) -> Self {
        ConveyorError::ImageError(Arc::new(err))
    }
}

impl From<::config::ConfigError> for ConveyorError {
    fn from(err: ::config::ConfigError) -> Self {
        ConveyorError::ConfigError(err)
    }
}

impl From<minifb::Error> for ConveyorError {
    fn from(err: minifb::Error) -> Self {
        ConveyorError::WindowError(err)
    }
}

impl From<framebuffer::FramebufferError> for ConveyorError {
    fn from(err: framebuffer::FramebufferError) -> Self {
        ConveyorError::FramebufferError(err)
    }
}

impl From<ctrlc::Error> for ConveyorError {
    fn from(err: ctrlc::Error) -> Self {
        ConveyorError::SignalError(err)
    }
}
