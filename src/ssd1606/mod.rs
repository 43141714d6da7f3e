//! SSD1606 4-level gray e-paper driver
//!
//! Buffered panel with a physical refresh cycle. The host-side buffer
//! packs four 2-bit pixels per byte in the controller's column-major,
//! x-reversed memory order; [`driver::Ssd1606::show`] transfers the whole
//! buffer, triggers the refresh and blocks on the BUSY line until the
//! panel has settled.

pub mod cmd;
pub mod driver;
pub mod flag;

/// Display width, pixels horizontally
pub const WIDTH: u16 = 172;

/// Display height, pixels vertically
pub const HEIGHT: u16 = 72;
