//! UART serial endpoint abstractions
//!
//! Provides the byte-level interface between a serial transport and an
//! emulated device attached to it.

/// Serial endpoint of an emulated device
///
/// The host delivers one byte at a time with [`receive_byte`](Self::receive_byte)
/// and drains the device's output with [`transmit_byte`](Self::transmit_byte).
/// Neither call blocks.
pub trait UartDevice {
    /// Deliver a byte from the line to the device
    ///
    /// Devices that assemble fixed-length frames act once enough bytes are
    /// buffered; otherwise they simply return and wait for more.
    fn receive_byte(&mut self, byte: u8);

    /// Take the next byte the device wants to put on the line
    ///
    /// Returns `None` when nothing is pending.
    fn transmit_byte(&mut self) -> Option<u8>;

    /// Current line settings
    fn line_config(&self) -> UartConfig;

    /// Number of bytes waiting to be transmitted
    fn pending(&self) -> usize;
}

/// UART line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second (0 for devices with a fixed rate)
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Line settings reported by devices whose rate is fixed by the part
    ///
    /// 8N1 with a baud rate of zero, meaning "whatever the host uses".
    pub const FIXED_RATE: Self = Self {
        baudrate: 0,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    Half,
    One,
    OneAndHalf,
    Two,
}
