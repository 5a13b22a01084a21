//! I2C target abstractions
//!
//! Provides the transaction-level interface between an I2C bus model and
//! an emulated target device.

use heapless::Vec;

/// Largest response any emulated I2C target produces in one read
///
/// Sized for a few queued multi-chunk responses (a 48-bit serial number is
/// 9 bytes on the wire).
pub const MAX_READ_LEN: usize = 32;

/// Bytes returned from a single read transaction
pub type ReadBuffer = Vec<u8, MAX_READ_LEN>;

/// I2C target device
///
/// The bus model addresses the device and then hands it whole write or
/// read transactions.
pub trait I2cPeripheral {
    /// Handle a write transaction
    ///
    /// `data` holds every byte the controller sent after the address.
    fn write(&mut self, data: &[u8]);

    /// Handle a read transaction
    ///
    /// Returns everything the device has queued and clears the queue.
    /// `count` is the number of bytes the controller asked for; devices
    /// may return fewer or more, as the bus model forwards what it gets.
    fn read(&mut self, count: usize) -> ReadBuffer;

    /// Called when the controller issues a STOP condition
    fn finish_transmission(&mut self) {}
}
