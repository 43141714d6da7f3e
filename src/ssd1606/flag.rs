//! SSD1606 register payload values

pub struct Flag;
#[allow(missing_docs)]
impl Flag {
    // Deep Sleep Mode (0x10)
    pub const DEEP_SLEEP_EXIT: u8 = 0x00;
    pub const DEEP_SLEEP_ENTER: u8 = 0x01;

    // Data Entry Mode (0x11)
    pub const DATA_ENTRY_INCRY_INCRX: u8 = 0x03; // Y increment, X increment

    // Display Update Control (0x21)
    pub const UPDATE_OPTIONS_DEFAULT: u8 = 0x03;

    // Display Update Sequence (0x22)
    // Enable sequence: clk -> CP -> LUT -> initial display -> pattern
    pub const SEQUENCE_FULL: u8 = 0xC4;

    // Booster feedback selection (0xF0)
    pub const BOOSTER_FEEDBACK_INTERNAL: u8 = 0x1F;

    // Write VCOM (0x2C)
    pub const VCOM_DEFAULT: u8 = 0xA0;

    // Border Waveform (0x3C)
    pub const BORDER_DEFAULT: u8 = 0x63;
}
