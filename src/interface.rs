//! Command/data framing over SPI
//!
//! All three controllers speak the same framing: a dedicated line selects
//! whether the bytes on the bus are a command (low) or payload data (high),
//! and every transfer is one chip-select-bracketed SPI transaction. CS
//! itself belongs to the [`SpiDevice`] - the trait asserts and releases it
//! around each `write`, so a logical command or data burst can never be
//! interleaved with traffic from another device on the bus.

use display_interface::DisplayError;
use embedded_hal::{digital::OutputPin, spi::SpiDevice};

/// Chunk size for streaming repeated pixel patterns without materializing
/// the whole payload.
const FILL_CHUNK: usize = 1024;

/// The command/data framer shared by all panel drivers.
///
/// Owns the SPI device and the data/command and reset lines for the
/// lifetime of one display controller.
pub struct DisplayInterface<SPI, DC, RST> {
    /// SPI device (manages chip-select per transaction)
    spi: SPI,
    /// Data/Command control pin (high for data, low for command)
    dc: DC,
    /// Reset pin
    rst: RST,
}

impl<SPI, DC, RST> DisplayInterface<SPI, DC, RST> {
    /// Wrap a bus and control pins into a framer.
    pub fn new(spi: SPI, dc: DC, rst: RST) -> Self {
        DisplayInterface { spi, dc, rst }
    }
}

impl<SPI, DC, RST> DisplayInterface<SPI, DC, RST>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Send one command byte.
    pub fn cmd(&mut self, command: u8) -> Result<(), DisplayError> {
        // low for commands
        self.dc.set_low().map_err(|_| DisplayError::DCError)?;
        self.spi
            .write(&[command])
            .map_err(|_| DisplayError::BusWriteError)
    }

    /// Send payload bytes.
    pub fn data(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        // high for data
        self.dc.set_high().map_err(|_| DisplayError::DCError)?;
        self.spi
            .write(data)
            .map_err(|_| DisplayError::BusWriteError)
    }

    /// Send a command and the data belonging to it.
    pub fn cmd_with_data(&mut self, command: u8, data: &[u8]) -> Result<(), DisplayError> {
        self.cmd(command)?;
        self.data(data)
    }

    /// Stream `count` repetitions of `pattern` as data.
    ///
    /// Used for bulk fills: a fixed chunk buffer holds the repeating
    /// encoded pattern, so filling the whole panel never allocates the
    /// full payload. `pattern` must be non-empty and no longer than the
    /// chunk size.
    pub fn data_repeated(&mut self, pattern: &[u8], count: u32) -> Result<(), DisplayError> {
        if pattern.is_empty() || count == 0 {
            return Ok(());
        }
        debug_assert!(pattern.len() <= FILL_CHUNK);
        self.dc.set_high().map_err(|_| DisplayError::DCError)?;

        let mut chunk = [0u8; FILL_CHUNK];
        let per_chunk = FILL_CHUNK / pattern.len();
        for slot in chunk.chunks_exact_mut(pattern.len()).take(per_chunk) {
            slot.copy_from_slice(pattern);
        }

        let full = (count as usize) / per_chunk;
        let remainder = (count as usize) % per_chunk;
        for _ in 0..full {
            self.spi
                .write(&chunk[..per_chunk * pattern.len()])
                .map_err(|_| DisplayError::BusWriteError)?;
        }
        if remainder > 0 {
            self.spi
                .write(&chunk[..remainder * pattern.len()])
                .map_err(|_| DisplayError::BusWriteError)?;
        }
        Ok(())
    }

    /// Drive the reset line high.
    pub fn rst_high(&mut self) -> Result<(), DisplayError> {
        self.rst.set_high().map_err(|_| DisplayError::RSError)
    }

    /// Drive the reset line low.
    pub fn rst_low(&mut self) -> Result<(), DisplayError> {
        self.rst.set_low().map_err(|_| DisplayError::RSError)
    }
}
