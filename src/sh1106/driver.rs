//! SH1106 display controller

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::error::Error;
use crate::glyph::{self, TextCursor, GLYPH_SIZE};
use crate::interface::DisplayInterface;
use crate::sh1106::{cmd::Cmd, HEIGHT, PAGES, WIDTH};
use crate::Panel;

/// Frame buffer size: height/8 pages of `WIDTH` bytes each.
pub const BUFFER_SIZE: usize = PAGES * WIDTH as usize;

/// The controller RAM is 132 columns wide but the panel is wired to the
/// middle 128, so every flush addresses columns starting at 2. Hardware
/// quirk; do not re-derive.
const COLUMN_OFFSET: u8 = 2;

/// SH1106 monochrome OLED driver.
///
/// All drawing operations mutate the internal page buffer in memory;
/// nothing reaches the bus until [`flush`](Self::flush). Each buffer byte
/// covers one 8-pixel-tall column within a page, bit N = row N of the
/// page.
pub struct Sh1106<SPI, DC, RST, DELAY> {
    interface: DisplayInterface<SPI, DC, RST>,
    delay: DELAY,
    buffer: [u8; BUFFER_SIZE],
    wrap_col: u16,
    wrap_row: u16,
}

impl<SPI, DC, RST, DELAY> Sh1106<SPI, DC, RST, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Create the driver with a cleared frame buffer. No bus traffic.
    pub fn new(spi: SPI, dc: DC, rst: RST, delay: DELAY) -> Self {
        Sh1106 {
            interface: DisplayInterface::new(spi, dc, rst),
            delay,
            buffer: [0u8; BUFFER_SIZE],
            wrap_col: WIDTH - GLYPH_SIZE,
            wrap_row: HEIGHT - GLYPH_SIZE,
        }
    }

    /// Hardware reset: low 50 ms, high 50 ms.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.interface.rst_low()?;
        self.delay.delay_ms(50);
        self.interface.rst_high()?;
        self.delay.delay_ms(50);
        Ok(())
    }

    /// Switch the display on.
    ///
    /// The controller runs on its power-on defaults; there is no vendor
    /// init table for this panel.
    pub fn init(&mut self) -> Result<(), Error> {
        self.sleep(false)
    }

    /// Enter (`true`) or leave (`false`) display sleep.
    pub fn sleep(&mut self, sleep: bool) -> Result<(), Error> {
        self.interface.cmd(Cmd::DISPLAY_OFF | u8::from(!sleep))?;
        Ok(())
    }

    /// Set display contrast.
    pub fn contrast(&mut self, value: u8) -> Result<(), Error> {
        self.interface.cmd_with_data(Cmd::SET_CONTRAST, &[value])?;
        Ok(())
    }

    /// Invert the display (hardware, does not touch the buffer).
    pub fn invert(&mut self, invert: bool) -> Result<(), Error> {
        self.interface
            .cmd(Cmd::SET_NORMAL_DISPLAY | u8::from(invert))?;
        Ok(())
    }

    /// Hardware vertical scroll: move the display start line to `dy`.
    pub fn vscroll(&mut self, dy: u8) -> Result<(), Error> {
        self.interface.cmd(Cmd::START_LINE_ADDRESS | (dy & 0x3F))?;
        Ok(())
    }

    /// Set or clear one pixel in the frame buffer. Out-of-range
    /// coordinates are silently dropped.
    pub fn pixel(&mut self, x: u16, y: u16, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let index = (y as usize / 8) * WIDTH as usize + x as usize;
        let bit = 1 << (y % 8);
        if on {
            self.buffer[index] |= bit;
        } else {
            self.buffer[index] &= !bit;
        }
    }

    /// Fill the frame buffer with one color.
    pub fn fill(&mut self, on: bool) {
        self.buffer.fill(if on { 0xFF } else { 0x00 });
    }

    /// Fill a rectangle in the frame buffer, clamped to the panel bounds.
    pub fn fill_rectangle(&mut self, x: u16, y: u16, w: u16, h: u16, on: bool) {
        let x = x.min(WIDTH - 1);
        let y = y.min(HEIGHT - 1);
        let w = w.max(1).min(WIDTH - x);
        let h = h.max(1).min(HEIGHT - y);
        for yy in y..y + h {
            for xx in x..x + w {
                self.pixel(xx, yy, on);
            }
        }
    }

    /// Shift the frame buffer by `(dx, dy)` pixels with wraparound on
    /// both axes. In-memory only; the panel changes on the next flush.
    pub fn scroll(&mut self, dx: i16, dy: i16) {
        let dy = i32::from(dy).rem_euclid(i32::from(HEIGHT)) as u32;
        let dx = i32::from(dx).rem_euclid(i32::from(WIDTH)) as usize;
        if dy != 0 {
            // Each column spans the panel height exactly once in a u64:
            // bit (page * 8 + n) = row (page * 8 + n).
            for x in 0..WIDTH as usize {
                let mut column: u64 = 0;
                for page in 0..PAGES {
                    column |= u64::from(self.buffer[page * WIDTH as usize + x]) << (8 * page);
                }
                let column = column.rotate_left(dy);
                for page in 0..PAGES {
                    self.buffer[page * WIDTH as usize + x] = (column >> (8 * page)) as u8;
                }
            }
        }
        if dx != 0 {
            for page in 0..PAGES {
                let row = &mut self.buffer[page * WIDTH as usize..(page + 1) * WIDTH as usize];
                row.rotate_right(dx);
            }
        }
    }

    /// Draw text into the frame buffer, set glyph bits only.
    ///
    /// Same layout rules as the TFT: fixed 8-px advance, wrap at the
    /// configured column/row bounds, `'\n'` starts a new line.
    pub fn text(&mut self, s: &str, x: u16, y: u16, on: bool) {
        let mut cursor = TextCursor::new(x, y, self.wrap_col, self.wrap_row);
        for c in s.chars() {
            if c == '\n' {
                cursor.newline();
                continue;
            }
            let rows = glyph::glyph(c);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..8u16 {
                    if bits & (1 << col) != 0 {
                        self.pixel(cursor.x + col, cursor.y + row as u16, on);
                    }
                }
            }
            cursor.advance();
        }
    }

    /// Set the text wrap bounds (defaults: one glyph short of the panel).
    pub fn set_text_wrap(&mut self, wrap_col: u16, wrap_row: u16) {
        self.wrap_col = wrap_col;
        self.wrap_row = wrap_row;
    }

    /// Push the frame buffer to the controller, one page per transfer.
    pub fn flush(&mut self) -> Result<(), Error> {
        log::trace!("flushing {} pages", PAGES);
        for page in 0..PAGES {
            self.interface.cmd(Cmd::SET_PAGE_ADDRESS | page as u8)?;
            self.interface.cmd(Cmd::LOW_COLUMN_ADDRESS | COLUMN_OFFSET)?;
            self.interface.cmd(Cmd::HIGH_COLUMN_ADDRESS)?;
            let start = page * WIDTH as usize;
            self.interface
                .data(&self.buffer[start..start + WIDTH as usize])?;
        }
        Ok(())
    }

    /// The raw page-organized frame buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

impl<SPI, DC, RST, DELAY> Panel for Sh1106<SPI, DC, RST, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    type Color = bool;

    fn width(&self) -> u16 {
        WIDTH
    }

    fn height(&self) -> u16 {
        HEIGHT
    }

    fn pixel(&mut self, x: u16, y: u16, on: bool) -> Result<(), Error> {
        Sh1106::pixel(self, x, y, on);
        Ok(())
    }

    fn fill(&mut self, on: bool) -> Result<(), Error> {
        Sh1106::fill(self, on);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::Mock as PinMock;
    use embedded_hal_mock::eh1::spi::Mock as SpiMock;

    type TestDriver = Sh1106<SpiMock<u8>, PinMock, PinMock, NoopDelay>;

    /// Driver with idle bus doubles: any SPI or pin activity fails the test.
    fn quiet_driver() -> (TestDriver, SpiMock<u8>, PinMock, PinMock) {
        let spi = SpiMock::new(&[]);
        let dc = PinMock::new(&[]);
        let rst = PinMock::new(&[]);
        let drv = Sh1106::new(spi.clone(), dc.clone(), rst.clone(), NoopDelay);
        (drv, spi, dc, rst)
    }

    fn finish(mut spi: SpiMock<u8>, mut dc: PinMock, mut rst: PinMock) {
        spi.done();
        dc.done();
        rst.done();
    }

    #[test]
    fn pixel_sets_page_bit() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.pixel(3, 10, true);
        // y=10 -> page 1, bit 2
        assert_eq!(drv.buffer()[WIDTH as usize + 3], 0b0000_0100);
        drv.pixel(3, 10, false);
        assert_eq!(drv.buffer()[WIDTH as usize + 3], 0);
        finish(spi, dc, rst);
    }

    #[test]
    fn out_of_range_pixel_is_dropped() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.pixel(WIDTH, 0, true);
        drv.pixel(0, HEIGHT, true);
        drv.pixel(u16::MAX, u16::MAX, true);
        assert!(drv.buffer().iter().all(|&b| b == 0));
        finish(spi, dc, rst);
    }

    #[test]
    fn fill_saturates_buffer() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.fill(true);
        assert!(drv.buffer().iter().all(|&b| b == 0xFF));
        drv.fill(false);
        assert!(drv.buffer().iter().all(|&b| b == 0x00));
        finish(spi, dc, rst);
    }

    #[test]
    fn fill_rectangle_clamps_to_panel() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.fill_rectangle(120, 60, 100, 100, true);
        // clamped to the 8×4 corner at (120..128, 60..64)
        let set: u32 = drv.buffer().iter().map(|b| b.count_ones()).sum();
        assert_eq!(set, 32);
        let read = |drv: &TestDriver, x: u16, y: u16| {
            drv.buffer()[(y as usize / 8) * WIDTH as usize + x as usize] & (1 << (y % 8)) != 0
        };
        assert!(read(&drv, 120, 60));
        assert!(read(&drv, 127, 63));
        assert!(!read(&drv, 119, 60));
        finish(spi, dc, rst);
    }

    #[test]
    fn scroll_wraps_both_axes() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.pixel(0, 0, true);
        drv.pixel(127, 63, true);
        drv.scroll(3, -5);
        // (0,0) -> (3, 59); (127,63) -> ((127+3)%128=2, (63-5)%64=58)
        let read = |drv: &TestDriver, x: u16, y: u16| {
            drv.buffer()[(y as usize / 8) * WIDTH as usize + x as usize] & (1 << (y % 8)) != 0
        };
        assert!(read(&drv, 3, 59));
        assert!(read(&drv, 2, 58));
        // exactly two pixels survive
        let set: u32 = drv.buffer().iter().map(|b| b.count_ones()).sum();
        assert_eq!(set, 2);
        finish(spi, dc, rst);
    }

    #[test]
    fn scroll_full_period_is_identity() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.pixel(17, 29, true);
        drv.scroll(WIDTH as i16, HEIGHT as i16);
        assert_eq!(
            drv.buffer()[(29usize / 8) * WIDTH as usize + 17] & (1 << (29 % 8)),
            1 << (29 % 8)
        );
        finish(spi, dc, rst);
    }

    #[test]
    fn text_draws_set_glyph_bits() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.text("|", 8, 8, true);
        let rows = crate::glyph::glyph('|');
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8u16 {
                let x = 8 + col;
                let y = 8 + row as u16;
                let lit =
                    drv.buffer()[(y as usize / 8) * WIDTH as usize + x as usize] & (1 << (y % 8));
                assert_eq!(lit != 0, bits & (1 << col) != 0);
            }
        }
        finish(spi, dc, rst);
    }

    #[test]
    fn newline_resets_column() {
        let (mut drv, spi, dc, rst) = quiet_driver();
        drv.text("\n|", 16, 0, true);
        // glyph lands at (16, 8); '|' has bit 3+4 set in its top row
        let rows = crate::glyph::glyph('|');
        let y = 8u16;
        for col in 0..8u16 {
            let x = 16 + col;
            let lit = drv.buffer()[(y as usize / 8) * WIDTH as usize + x as usize] & (1 << (y % 8));
            assert_eq!(lit != 0, rows[0] & (1 << col) != 0);
        }
        finish(spi, dc, rst);
    }
}
