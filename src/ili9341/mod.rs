//! ILI9341 RGB565 TFT driver
//!
//! Immediate-mode panel: there is no host-side frame buffer. Every drawing
//! operation selects an address window on the controller and streams
//! big-endian RGB565 samples straight into display RAM, so pixels appear
//! as soon as the transfer completes.

pub mod cmd;
pub mod driver;
pub mod flag;

/// Display width, pixels horizontally
pub const WIDTH: u16 = 240;

/// Display height, pixels vertically
pub const HEIGHT: u16 = 320;
