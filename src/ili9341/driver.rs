//! ILI9341 display controller

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::error::Error;
use crate::glyph::{self, TextCursor, GLYPH_SIZE};
use crate::ili9341::{cmd::Cmd, flag::Flag, HEIGHT, WIDTH};
use crate::interface::DisplayInterface;
use crate::Panel;

/// Vendor initialization table, replayed in order on `init()`.
///
/// The leading extended-command entries and every payload byte are opaque
/// vendor values; reproduce them exactly, do not re-derive.
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (0xEF, &[0x03, 0x80, 0x02]),
    (0xCF, &[0x00, 0xC1, 0x30]),
    (0xED, &[0x64, 0x03, 0x12, 0x81]),
    (0xE8, &[0x85, 0x00, 0x78]),
    (0xCB, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    (0xF7, &[0x20]),
    (0xEA, &[0x00, 0x00]),
    (Cmd::POWER_CONTROL_1, &[0x23]), // VRH[5:0]
    (Cmd::POWER_CONTROL_2, &[0x10]), // SAP[2:0], BT[3:0]
    (Cmd::VCOM_CONTROL_1, &[0x3E, 0x28]),
    (Cmd::VCOM_CONTROL_2, &[0x86]),
    (
        Cmd::MEMORY_ACCESS_CONTROL,
        &[Flag::MADCTL_MX | Flag::MADCTL_BGR],
    ),
    (Cmd::PIXEL_FORMAT, &[Flag::PIXEL_FORMAT_16BPP]),
    (Cmd::FRAME_RATE_CONTROL, &[0x00, 0x18]),
    (Cmd::DISPLAY_FUNCTION_CONTROL, &[0x08, 0x82, 0x27]),
    (Cmd::ENABLE_3GAMMA, &[0x00]), // 3-gamma disabled
    (Cmd::GAMMA_SET, &[Flag::GAMMA_CURVE_1]),
    (
        Cmd::POSITIVE_GAMMA,
        &[
            0x0F, 0x31, 0x2B, 0x0C, 0x0E, 0x08, 0x4E, 0xF1, 0x37, 0x07, 0x10, 0x03, 0x0E, 0x09,
            0x00,
        ],
    ),
    (
        Cmd::NEGATIVE_GAMMA,
        &[
            0x00, 0x0E, 0x14, 0x03, 0x11, 0x07, 0x31, 0xC1, 0x48, 0x08, 0x0F, 0x0C, 0x31, 0x36,
            0x0F,
        ],
    ),
];

/// ILI9341 RGB565 TFT driver.
///
/// ## Type parameters
///
/// - `SPI` - [`SpiDevice`] for the bus (owns chip-select)
/// - `DC` - data/command select pin
/// - `RST` - reset pin
/// - `DELAY` - delay provider for reset and power-up timing
pub struct Ili9341<SPI, DC, RST, DELAY> {
    interface: DisplayInterface<SPI, DC, RST>,
    delay: DELAY,
    scroll_offset: u16,
    wrap_col: u16,
    wrap_row: u16,
}

/// Add a signed scroll delta to an offset, wrapping into `[0, height)`.
pub(crate) fn wrap_offset(current: u16, delta: i16, height: u16) -> u16 {
    (i32::from(current) + i32::from(delta)).rem_euclid(i32::from(height)) as u16
}

/// Expand an 8×8 glyph into a 128-byte block of big-endian RGB565 samples.
pub(crate) fn glyph_block(c: char, fg: u16, bg: u16) -> [u8; 128] {
    let mut block = [0u8; 128];
    let rows = glyph::glyph(c);
    let mut i = 0;
    for row in rows {
        for col in 0..8 {
            let color = if row & (1 << col) != 0 { fg } else { bg };
            block[i] = (color >> 8) as u8;
            block[i + 1] = color as u8;
            i += 2;
        }
    }
    block
}

impl<SPI, DC, RST, DELAY> Ili9341<SPI, DC, RST, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Create the driver. No bus traffic; call [`reset`](Self::reset) and
    /// [`init`](Self::init) before drawing.
    pub fn new(spi: SPI, dc: DC, rst: RST, delay: DELAY) -> Self {
        Ili9341 {
            interface: DisplayInterface::new(spi, dc, rst),
            delay,
            scroll_offset: 0,
            wrap_col: WIDTH - GLYPH_SIZE,
            wrap_row: HEIGHT - GLYPH_SIZE,
        }
    }

    /// Hardware reset: high 5 ms, low 20 ms, high 150 ms.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.interface.rst_high()?;
        self.delay.delay_ms(5);
        self.interface.rst_low()?;
        self.delay.delay_ms(20);
        self.interface.rst_high()?;
        self.delay.delay_ms(150);
        Ok(())
    }

    /// Replay the vendor init table, exit sleep and switch the display on.
    pub fn init(&mut self) -> Result<(), Error> {
        log::debug!("replaying ILI9341 init table");
        for (command, data) in INIT_SEQUENCE {
            self.interface.cmd_with_data(*command, data)?;
        }
        self.interface.cmd(Cmd::SLEEP_OUT)?;
        self.delay.delay_ms(120);
        self.interface.cmd(Cmd::DISPLAY_ON)?;
        Ok(())
    }

    /// Select the inclusive rectangle the next pixel stream writes into
    /// and open the memory write.
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Error> {
        let mut span = [0u8; 4];
        span[..2].copy_from_slice(&x0.to_be_bytes());
        span[2..].copy_from_slice(&x1.to_be_bytes());
        self.interface.cmd_with_data(Cmd::COLUMN_ADDRESS_SET, &span)?;
        span[..2].copy_from_slice(&y0.to_be_bytes());
        span[2..].copy_from_slice(&y1.to_be_bytes());
        self.interface.cmd_with_data(Cmd::PAGE_ADDRESS_SET, &span)?;
        self.interface.cmd(Cmd::MEMORY_WRITE)?;
        Ok(())
    }

    /// Draw one pixel. Out-of-range coordinates are silently dropped.
    pub fn pixel(&mut self, x: u16, y: u16, color: u16) -> Result<(), Error> {
        if x >= WIDTH || y >= HEIGHT {
            return Ok(());
        }
        self.set_window(x, y, x, y)?;
        self.interface.data(&color.to_be_bytes())?;
        Ok(())
    }

    /// Fill a rectangle, clamped to the panel bounds.
    pub fn fill_rectangle(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        color: u16,
    ) -> Result<(), Error> {
        let x = x.min(WIDTH - 1);
        let y = y.min(HEIGHT - 1);
        let w = w.max(1).min(WIDTH - x);
        let h = h.max(1).min(HEIGHT - y);
        self.set_window(x, y, x + w - 1, y + h - 1)?;
        self.interface
            .data_repeated(&color.to_be_bytes(), u32::from(w) * u32::from(h))?;
        Ok(())
    }

    /// Fill the whole panel.
    pub fn fill(&mut self, color: u16) -> Result<(), Error> {
        self.fill_rectangle(0, 0, WIDTH, HEIGHT, color)
    }

    /// Shift the displayed frame vertically by `dy` lines.
    ///
    /// A hardware line shift: one register write moves the persistent
    /// scroll start address, no pixel data is touched. The offset
    /// accumulates modulo the panel height; negative deltas scroll back.
    pub fn scroll(&mut self, dy: i16) -> Result<(), Error> {
        self.scroll_offset = wrap_offset(self.scroll_offset, dy, HEIGHT);
        self.interface
            .cmd_with_data(Cmd::VSCROLL_START_ADDRESS, &self.scroll_offset.to_be_bytes())?;
        Ok(())
    }

    /// Current vertical scroll offset, always in `[0, height)`.
    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    /// Set the text wrap bounds: the last column a glyph may start at and
    /// the last row. Defaults are one glyph short of the panel edges.
    pub fn set_text_wrap(&mut self, wrap_col: u16, wrap_row: u16) {
        self.wrap_col = wrap_col;
        self.wrap_row = wrap_row;
    }

    /// Draw text starting at `(x, y)` with foreground over background.
    ///
    /// Each character becomes one 8×8 windowed transfer. `'\n'` returns
    /// the cursor to the starting column and advances one glyph row; with
    /// `clear_eol` the rest of the row is erased with `bg` first. Glyph
    /// cells that do not fully fit on the panel are skipped.
    pub fn text(
        &mut self,
        s: &str,
        x: u16,
        y: u16,
        fg: u16,
        bg: u16,
        clear_eol: bool,
    ) -> Result<(), Error> {
        let mut cursor = TextCursor::new(x, y, self.wrap_col, self.wrap_row);
        for c in s.chars() {
            if c == '\n' {
                let cells = cursor.cells_to_eol();
                if clear_eol && cells > 0 {
                    self.fill_rectangle(cursor.x, cursor.y, cells * GLYPH_SIZE, GLYPH_SIZE, bg)?;
                }
                cursor.newline();
                continue;
            }
            if cursor.x + GLYPH_SIZE <= WIDTH && cursor.y + GLYPH_SIZE <= HEIGHT {
                let block = glyph_block(c, fg, bg);
                self.set_window(
                    cursor.x,
                    cursor.y,
                    cursor.x + GLYPH_SIZE - 1,
                    cursor.y + GLYPH_SIZE - 1,
                )?;
                self.interface.data(&block)?;
            }
            cursor.advance();
        }
        Ok(())
    }
}

impl<SPI, DC, RST, DELAY> Panel for Ili9341<SPI, DC, RST, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    type Color = u16;

    fn width(&self) -> u16 {
        WIDTH
    }

    fn height(&self) -> u16 {
        HEIGHT
    }

    fn pixel(&mut self, x: u16, y: u16, color: u16) -> Result<(), Error> {
        Ili9341::pixel(self, x, y, color)
    }

    fn fill(&mut self, color: u16) -> Result<(), Error> {
        Ili9341::fill(self, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::color565;

    #[test]
    fn scroll_offset_wraps_both_directions() {
        let mut offset = 0;
        offset = wrap_offset(offset, 300, HEIGHT);
        assert_eq!(offset, 300);
        offset = wrap_offset(offset, 40, HEIGHT);
        assert_eq!(offset, 20);
        offset = wrap_offset(offset, -30, HEIGHT);
        assert_eq!(offset, 310);
        offset = wrap_offset(offset, -310, HEIGHT);
        assert_eq!(offset, 0);
    }

    #[test]
    fn scroll_offset_stays_in_range_for_any_sequence() {
        let mut offset = 0;
        for delta in [5, -1000, 319, -1, 321, i16::MIN, i16::MAX] {
            offset = wrap_offset(offset, delta, HEIGHT);
            assert!(offset < HEIGHT);
        }
    }

    #[test]
    fn glyph_block_maps_bits_to_colors() {
        let fg = color565(0xFF, 0x00, 0x00);
        let bg = color565(0x00, 0x00, 0x00);
        let block = glyph_block('|', fg, bg);
        let rows = crate::glyph::glyph('|');
        for (i, sample) in block.chunks(2).enumerate() {
            let (row, col) = (i / 8, i % 8);
            let expected = if rows[row] & (1 << col) != 0 { fg } else { bg };
            assert_eq!(sample[0], (expected >> 8) as u8);
            assert_eq!(sample[1], expected as u8);
        }
    }

    #[test]
    fn glyph_block_is_big_endian() {
        // all-background block of a space glyph
        let block = glyph_block(' ', 0x0000, 0xF884);
        assert_eq!(block[0], 0xF8);
        assert_eq!(block[1], 0x84);
    }
}
