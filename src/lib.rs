//! SPI panel drivers
//!
//! Drivers for three small SPI display controllers sharing the same
//! command/data bus framing but nothing else:
//!
//! - [`Ili9341`] - 240×320 RGB565 TFT, immediate mode (every drawing call
//!   goes straight to the controller RAM).
//! - [`Sh1106`] - 128×64 monochrome OLED, buffered (drawing mutates an
//!   in-memory page buffer, [`Sh1106::flush`] pushes it out).
//! - [`Ssd1606`] - 172×72 4-level gray e-paper, buffered with a physical
//!   refresh cycle gated on the BUSY line ([`Ssd1606::show`]).
//!
//! ### Usage
//!
//! Each driver is generic over the `embedded-hal` 1.0 traits. Chip-select
//! belongs to the [`embedded_hal::spi::SpiDevice`] you construct; the
//! drivers own the data/command and reset lines (plus BUSY for the
//! e-paper) exclusively for their lifetime.
//!
//! 1. construct the driver with the bus, pins and a delay provider,
//! 1. call `reset()` then `init()`,
//! 1. draw with `pixel`/`fill`/`fill_rectangle`/`text`,
//! 1. for the buffered panels, push the frame with `flush()`/`show()`.
//!
//! Two displays may share one physical bus only if the caller serializes
//! access externally; nothing here interleaves transfers.

#![no_std]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[cfg(test)]
extern crate std;

pub mod color;
pub mod error;
pub mod glyph;
pub mod ili9341;
pub mod interface;
pub mod sh1106;
pub mod ssd1606;

pub use crate::color::color565;
pub use crate::error::Error;
pub use crate::ili9341::driver::Ili9341;
pub use crate::interface::DisplayInterface;
pub use crate::sh1106::driver::Sh1106;
pub use crate::ssd1606::driver::Ssd1606;

/// Minimal capability set common to all three controllers.
///
/// The addressing math and color depth of the panels are unrelated, so
/// there is no shared base - only this trait unifying what is genuinely
/// uniform: bounds-checked single pixels and whole-panel fills. Text,
/// scroll and frame push stay on the individual drivers.
pub trait Panel {
    /// Native logical color of the panel (`u16` RGB565, `bool` on/off,
    /// `u8` gray level 0..=3).
    type Color: Copy;

    /// Panel width in pixels.
    fn width(&self) -> u16;

    /// Panel height in pixels.
    fn height(&self) -> u16;

    /// Draw one pixel. Out-of-range coordinates are silently dropped.
    fn pixel(&mut self, x: u16, y: u16, color: Self::Color) -> Result<(), Error>;

    /// Fill the whole panel with one color.
    fn fill(&mut self, color: Self::Color) -> Result<(), Error>;
}
