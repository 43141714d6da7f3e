//! SSD1606 display controller

use display_interface::DisplayError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::color::gray2_fill_byte;
use crate::error::Error;
use crate::interface::DisplayInterface;
use crate::ssd1606::{cmd::Cmd, flag::Flag, HEIGHT, WIDTH};
use crate::Panel;

/// Frame buffer size: four 2-bit pixels per byte.
pub const BUFFER_SIZE: usize = (WIDTH as usize * HEIGHT as usize) / 4;

/// Busy-line poll interval during a refresh cycle.
const BUSY_POLL_MS: u32 = 10;

/// 90-byte waveform LUT, loaded with register 0x32 during init.
///
/// Opaque vendor data for the 4-level panel; reproduce exactly.
const LUT: [u8; 90] = [
    0x00, 0x00, 0x00, 0x55, 0x00, 0x00, 0x55, 0x55, //
    0x00, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, 0x55, //
    0x55, 0xAA, 0x55, 0x55, 0xAA, 0xAA, 0xAA, 0xAA, //
    0x05, 0x05, 0x05, 0x05, 0x15, 0x15, 0x15, 0x15, //
    0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x34, 0x32, 0xF1, 0x74, 0x14, 0x00, 0x00, 0x00, //
    0x00, 0x00,
];

/// Vendor initialization table, replayed in order on `init()`.
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (Cmd::DEEP_SLEEP, &[Flag::DEEP_SLEEP_EXIT]),
    (Cmd::DATA_ENTRY_MODE, &[Flag::DATA_ENTRY_INCRY_INCRX]),
    (Cmd::DISPLAY_UPDATE_CONTROL, &[Flag::UPDATE_OPTIONS_DEFAULT]),
    (Cmd::BOOSTER_FEEDBACK, &[Flag::BOOSTER_FEEDBACK_INTERNAL]),
    (Cmd::WRITE_VCOM, &[Flag::VCOM_DEFAULT]),
    (Cmd::BORDER_WAVEFORM, &[Flag::BORDER_DEFAULT]),
    (Cmd::DISPLAY_UPDATE_SEQUENCE, &[Flag::SEQUENCE_FULL]),
    (Cmd::WRITE_LUT, &LUT),
];

/// Buffer index of the byte holding logical pixel `(x, y)`.
///
/// The controller stores `height/4` rows per physical column and addresses
/// columns in reverse horizontal order (logical column 0 is the last
/// physical column). Getting this or the bit order wrong mirrors the image
/// or shifts it by one column.
pub(crate) fn byte_index(x: u16, y: u16) -> usize {
    (y as usize / 4) + (WIDTH as usize - 1 - x as usize) * (HEIGHT as usize / 4)
}

/// Bit position of pixel `(…, y)`'s 2-bit field within its byte; slot 3
/// (row 0 of the group of four) is most significant.
pub(crate) fn bit_shift(y: u16) -> u8 {
    (3 - (y % 4) as u8) * 2
}

/// SSD1606 4-level gray e-paper driver.
///
/// ## Type parameters
///
/// - `SPI` - [`SpiDevice`] for the bus (owns chip-select)
/// - `DC` - data/command select pin
/// - `RST` - reset pin
/// - `BUSY` - busy input pin (high while the panel refreshes)
/// - `DELAY` - delay provider for reset timing and busy polling
pub struct Ssd1606<SPI, DC, RST, BUSY, DELAY> {
    interface: DisplayInterface<SPI, DC, RST>,
    busy: BUSY,
    delay: DELAY,
    buffer: [u8; BUFFER_SIZE],
}

impl<SPI, DC, RST, BUSY, DELAY> Ssd1606<SPI, DC, RST, BUSY, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    /// Create the driver with a cleared frame buffer. No bus traffic.
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, delay: DELAY) -> Self {
        Ssd1606 {
            interface: DisplayInterface::new(spi, dc, rst),
            busy,
            delay,
            buffer: [0u8; BUFFER_SIZE],
        }
    }

    /// Hardware reset: low 10 ms, high 10 ms.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.interface.rst_low()?;
        self.delay.delay_ms(10);
        self.interface.rst_high()?;
        self.delay.delay_ms(10);
        Ok(())
    }

    /// Replay the vendor init table. Order matters: power sequencing
    /// comes before the LUT load.
    pub fn init(&mut self) -> Result<(), Error> {
        log::debug!("replaying SSD1606 init table");
        for (command, data) in INIT_SEQUENCE {
            self.interface.cmd_with_data(*command, data)?;
        }
        Ok(())
    }

    /// Enter (`true`) or leave (`false`) deep sleep.
    pub fn sleep(&mut self, sleep: bool) -> Result<(), Error> {
        let mode = if sleep {
            Flag::DEEP_SLEEP_ENTER
        } else {
            Flag::DEEP_SLEEP_EXIT
        };
        self.interface.cmd_with_data(Cmd::DEEP_SLEEP, &[mode])?;
        Ok(())
    }

    /// Write one pixel into the frame buffer.
    ///
    /// Out-of-range coordinates are silently dropped; a gray level outside
    /// 0..=3 is [`Error::InvalidColor`]. The 2-bit field is
    /// read-modify-written, leaving the other three pixels in the byte
    /// untouched.
    pub fn pixel(&mut self, x: u16, y: u16, color: u8) -> Result<(), Error> {
        if x >= WIDTH || y >= HEIGHT {
            return Ok(());
        }
        if color > 3 {
            return Err(Error::InvalidColor(color));
        }
        let index = byte_index(x, y);
        let shift = bit_shift(y);
        self.buffer[index] &= !(0x03 << shift);
        self.buffer[index] |= color << shift;
        Ok(())
    }

    /// Fill the frame buffer with one gray level.
    ///
    /// Validates the level like [`pixel`](Self::pixel) does.
    pub fn fill(&mut self, color: u8) -> Result<(), Error> {
        let pattern = gray2_fill_byte(color)?;
        self.buffer.fill(pattern);
        Ok(())
    }

    /// Fill a rectangle in the frame buffer, clamped to the panel bounds.
    pub fn fill_rectangle(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        color: u8,
    ) -> Result<(), Error> {
        if color > 3 {
            return Err(Error::InvalidColor(color));
        }
        let x = x.min(WIDTH - 1);
        let y = y.min(HEIGHT - 1);
        let w = w.max(1).min(WIDTH - x);
        let h = h.max(1).min(HEIGHT - y);
        for yy in y..y + h {
            for xx in x..x + w {
                self.pixel(xx, yy, color)?;
            }
        }
        Ok(())
    }

    /// Transfer the frame buffer, trigger the refresh and wait for it.
    ///
    /// Sets the RAM window to the full frame, resets both address
    /// counters, streams the buffer, issues Master Activate and then
    /// blocks on the busy gate until the physical refresh completes.
    pub fn show(&mut self) -> Result<(), Error> {
        self.interface
            .cmd_with_data(Cmd::SET_RAMX_START_END, &[0, (HEIGHT / 4 - 1) as u8])?;
        self.interface
            .cmd_with_data(Cmd::SET_RAMY_START_END, &[0, (WIDTH - 1) as u8])?;
        self.interface.cmd_with_data(Cmd::SET_RAMX_COUNTER, &[0])?;
        self.interface.cmd_with_data(Cmd::SET_RAMY_COUNTER, &[0])?;
        self.interface.cmd(Cmd::WRITE_RAM)?;
        self.interface.data(&self.buffer)?;
        self.interface.cmd(Cmd::MASTER_ACTIVATE)?;
        self.wait_until_idle()
    }

    /// Poll the busy line every 10 ms until the panel is ready.
    ///
    /// No timeout: a busy line that never releases is a hardware fault,
    /// not something this driver recovers from.
    fn wait_until_idle(&mut self) -> Result<(), Error> {
        log::debug!("waiting for e-paper refresh");
        loop {
            // DisplayError has no busy-pin variant; a read failure is
            // reported as DCError like the other control lines.
            match self.busy.is_high() {
                Ok(false) => return Ok(()),
                Ok(true) => self.delay.delay_ms(BUSY_POLL_MS),
                Err(_) => return Err(Error::Interface(DisplayError::DCError)),
            }
        }
    }

    /// The raw packed frame buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

impl<SPI, DC, RST, BUSY, DELAY> Panel for Ssd1606<SPI, DC, RST, BUSY, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    type Color = u8;

    fn width(&self) -> u16 {
        WIDTH
    }

    fn height(&self) -> u16 {
        HEIGHT
    }

    fn pixel(&mut self, x: u16, y: u16, color: u8) -> Result<(), Error> {
        Ssd1606::pixel(self, x, y, color)
    }

    fn fill(&mut self, color: u8) -> Result<(), Error> {
        Ssd1606::fill(self, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::Mock as PinMock;
    use embedded_hal_mock::eh1::spi::Mock as SpiMock;

    type TestDriver = Ssd1606<SpiMock<u8>, PinMock, PinMock, PinMock, NoopDelay>;

    fn quiet_driver() -> (TestDriver, SpiMock<u8>, PinMock, PinMock, PinMock) {
        let spi = SpiMock::new(&[]);
        let dc = PinMock::new(&[]);
        let rst = PinMock::new(&[]);
        let busy = PinMock::new(&[]);
        let drv = Ssd1606::new(spi.clone(), dc.clone(), rst.clone(), busy.clone(), NoopDelay);
        (drv, spi, dc, rst, busy)
    }

    fn finish(mut spi: SpiMock<u8>, mut dc: PinMock, mut rst: PinMock, mut busy: PinMock) {
        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }

    #[test]
    fn address_translation_reverses_columns() {
        // (0,0): row 0 of the last physical column
        assert_eq!(byte_index(0, 0), 171 * 18);
        assert_eq!(byte_index(0, 0), 3078);
        // (width-1, 0): first physical column
        assert_eq!(byte_index(WIDTH - 1, 0), 0);
        // four rows share a byte
        assert_eq!(byte_index(5, 0), byte_index(5, 3));
        assert_ne!(byte_index(5, 3), byte_index(5, 4));
    }

    #[test]
    fn bit_slot_is_msb_first() {
        assert_eq!(bit_shift(0), 6);
        assert_eq!(bit_shift(1), 4);
        assert_eq!(bit_shift(2), 2);
        assert_eq!(bit_shift(3), 0);
        assert_eq!(bit_shift(4), 6);
    }

    #[test]
    fn pixel_sets_top_left_group() {
        let (mut drv, spi, dc, rst, busy) = quiet_driver();
        drv.pixel(0, 0, 3).unwrap();
        assert_eq!(drv.buffer()[3078], 0b1100_0000);
        finish(spi, dc, rst, busy);
    }

    #[test]
    fn read_modify_write_preserves_neighbors() {
        let (mut drv, spi, dc, rst, busy) = quiet_driver();
        drv.pixel(10, 8, 3).unwrap();
        drv.pixel(10, 9, 1).unwrap();
        let byte = drv.buffer()[byte_index(10, 8)];
        // slot 3 = color 3, slot 2 = color 1, rest untouched
        assert_eq!(byte, 0b1101_0000);
        // overwrite (10,9) and make sure (10,8) survives
        drv.pixel(10, 9, 2).unwrap();
        assert_eq!(drv.buffer()[byte_index(10, 8)], 0b1110_0000);
        finish(spi, dc, rst, busy);
    }

    #[test]
    fn out_of_range_pixel_is_dropped() {
        let (mut drv, spi, dc, rst, busy) = quiet_driver();
        drv.pixel(WIDTH, 0, 3).unwrap();
        drv.pixel(0, HEIGHT, 3).unwrap();
        assert!(drv.buffer().iter().all(|&b| b == 0));
        finish(spi, dc, rst, busy);
    }

    #[test]
    fn invalid_color_is_rejected() {
        let (mut drv, spi, dc, rst, busy) = quiet_driver();
        assert!(matches!(drv.pixel(0, 0, 4), Err(Error::InvalidColor(4))));
        assert!(matches!(drv.fill(7), Err(Error::InvalidColor(7))));
        assert!(drv.buffer().iter().all(|&b| b == 0));
        finish(spi, dc, rst, busy);
    }

    #[test]
    fn fill_packs_four_pixels_per_byte() {
        let (mut drv, spi, dc, rst, busy) = quiet_driver();
        drv.fill(2).unwrap();
        assert!(drv.buffer().iter().all(|&b| b == 0b1010_1010));
        finish(spi, dc, rst, busy);
    }

    #[test]
    fn fill_rectangle_clamps_to_panel() {
        let (mut drv, spi, dc, rst, busy) = quiet_driver();
        drv.fill_rectangle(170, 70, 50, 50, 3).unwrap();
        // clamped to the 2×2 corner at (170..172, 70..72)
        let lit: usize = drv
            .buffer()
            .iter()
            .map(|b| (b.count_ones() / 2) as usize)
            .sum();
        assert_eq!(lit, 4);
        drv.pixel(169, 70, 0).unwrap();
        assert_eq!(
            drv.buffer()[byte_index(170, 70)] >> bit_shift(70) & 0x03,
            3
        );
        finish(spi, dc, rst, busy);
    }
}
