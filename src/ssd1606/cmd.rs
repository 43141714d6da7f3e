//! SSD1606 command bytes

pub struct Cmd;
impl Cmd {
    pub const DEEP_SLEEP: u8 = 0x10;
    pub const DATA_ENTRY_MODE: u8 = 0x11;
    pub const MASTER_ACTIVATE: u8 = 0x20;
    pub const DISPLAY_UPDATE_CONTROL: u8 = 0x21;
    pub const DISPLAY_UPDATE_SEQUENCE: u8 = 0x22;
    pub const WRITE_RAM: u8 = 0x24;
    pub const WRITE_VCOM: u8 = 0x2C;
    pub const WRITE_LUT: u8 = 0x32;
    pub const BORDER_WAVEFORM: u8 = 0x3C;
    pub const SET_RAMX_START_END: u8 = 0x44;
    pub const SET_RAMY_START_END: u8 = 0x45;
    pub const SET_RAMX_COUNTER: u8 = 0x4E;
    pub const SET_RAMY_COUNTER: u8 = 0x4F;
    pub const BOOSTER_FEEDBACK: u8 = 0xF0;
}
