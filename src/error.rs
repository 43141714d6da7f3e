//! Crate error type

use display_interface::DisplayError;

/// Errors produced by the panel drivers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Bus or control-line failure while talking to the controller.
    #[error("display interface error")]
    Interface(DisplayError),

    /// A gray level outside 0..=3 was passed to the 4-level e-paper
    /// driver. The palette is discrete; an out-of-range value is a
    /// contract violation, not something to clamp.
    #[error("invalid 2-bit color index {0}")]
    InvalidColor(u8),
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Error::Interface(e)
    }
}
