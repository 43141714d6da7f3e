//! ILI9341 register payload values

pub struct Flag;
#[allow(missing_docs)]
impl Flag {
    // Memory Access Control (0x36) bits
    pub const MADCTL_MY: u8 = 0x80; // row address order
    pub const MADCTL_MX: u8 = 0x40; // column address order
    pub const MADCTL_MV: u8 = 0x20; // row/column exchange
    pub const MADCTL_BGR: u8 = 0x08; // BGR subpixel order

    // Pixel Format (0x3A)
    pub const PIXEL_FORMAT_16BPP: u8 = 0x55; // 16 bits/pixel on both interfaces

    // Gamma Curve (0x26)
    pub const GAMMA_CURVE_1: u8 = 0x01;
}
