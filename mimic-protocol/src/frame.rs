//! Frame encoding and decoding
//!
//! Requests are fixed-length frames assembled from a byte queue by
//! [`FrameAssembler`]. Responses are built from a [`FrameTemplate`]:
//! - HEADER: device magic bytes
//! - LENGTH (optional): recomputed from the payload on every encode
//! - PAYLOAD: device data
//! - TRAILER (optional): checksum over everything before it
//!
//! Where the checksum goes and which byte order it uses is a property of
//! the device's template, not of the codec.

use heapless::{Deque, Vec};

use crate::checksum::{crc16_modbus, sum16};

/// Maximum complete response frame size
pub const MAX_FRAME_SIZE: usize = 64;

/// Maximum payload size (leaves room for 2B header, 2B length, 2B trailer)
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - 6;

/// Receive queue depth
pub const RX_QUEUE_SIZE: usize = 64;

/// Errors that can occur during frame assembly or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Not enough bytes buffered yet (not a failure, try again later)
    Incomplete,
    /// Header bytes do not match the device's magic
    BadHeader,
    /// Length field disagrees with the frame size
    BadLength,
    /// Checksum mismatch
    BadChecksum,
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for the operation
    BufferTooSmall,
}

/// How a frame declares its own size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LengthField {
    /// No length field
    None,
    /// One byte holding the payload length
    PayloadU8,
    /// Two bytes, big-endian, holding payload + trailer length
    PayloadAndTrailerU16,
    /// Two bytes, big-endian, holding the length of the whole frame
    FrameTotalU16,
}

impl LengthField {
    /// Bytes the field occupies on the wire
    pub const fn size(&self) -> usize {
        match self {
            LengthField::None => 0,
            LengthField::PayloadU8 => 1,
            LengthField::PayloadAndTrailerU16 | LengthField::FrameTotalU16 => 2,
        }
    }
}

/// Checksum appended after the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trailer {
    /// No checksum
    None,
    /// Additive sum-16, big-endian
    Sum16,
    /// CRC-16/MODBUS, little-endian
    Crc16Modbus,
}

impl Trailer {
    /// Bytes the trailer occupies on the wire
    pub const fn size(&self) -> usize {
        match self {
            Trailer::None => 0,
            Trailer::Sum16 | Trailer::Crc16Modbus => 2,
        }
    }

    /// Compute trailer bytes over the preceding frame bytes
    fn compute(&self, covered: &[u8]) -> Option<[u8; 2]> {
        match self {
            Trailer::None => None,
            Trailer::Sum16 => Some(sum16(covered).to_be_bytes()),
            Trailer::Crc16Modbus => Some(crc16_modbus(covered).to_le_bytes()),
        }
    }
}

/// Fixed layout of a device's response frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTemplate {
    /// Magic bytes at the start of every frame
    pub header: &'static [u8],
    /// Length field format
    pub length: LengthField,
    /// Checksum format
    pub trailer: Trailer,
}

impl FrameTemplate {
    /// Create a new frame template
    pub const fn new(header: &'static [u8], length: LengthField, trailer: Trailer) -> Self {
        Self {
            header,
            length,
            trailer,
        }
    }

    /// Size of an encoded frame carrying `payload_len` bytes
    pub const fn frame_len(&self, payload_len: usize) -> usize {
        self.header.len() + self.length.size() + payload_len + self.trailer.size()
    }

    /// Value written into the length field for a given payload
    fn length_value(&self, payload_len: usize) -> usize {
        match self.length {
            LengthField::None => 0,
            LengthField::PayloadU8 => payload_len,
            LengthField::PayloadAndTrailerU16 => payload_len + self.trailer.size(),
            LengthField::FrameTotalU16 => self.frame_len(payload_len),
        }
    }

    /// Encode a payload into a complete frame
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }
        if self.frame_len(payload.len()) > MAX_FRAME_SIZE {
            return Err(FrameError::BufferTooSmall);
        }

        let mut frame = Vec::new();
        frame
            .extend_from_slice(self.header)
            .map_err(|_| FrameError::BufferTooSmall)?;

        let length = self.length_value(payload.len());
        match self.length {
            LengthField::None => {}
            LengthField::PayloadU8 => {
                let length = u8::try_from(length).map_err(|_| FrameError::PayloadTooLarge)?;
                frame.push(length).map_err(|_| FrameError::BufferTooSmall)?;
            }
            LengthField::PayloadAndTrailerU16 | LengthField::FrameTotalU16 => {
                let length = u16::try_from(length).map_err(|_| FrameError::PayloadTooLarge)?;
                frame
                    .extend_from_slice(&length.to_be_bytes())
                    .map_err(|_| FrameError::BufferTooSmall)?;
            }
        }

        frame
            .extend_from_slice(payload)
            .map_err(|_| FrameError::BufferTooSmall)?;

        if let Some(trailer) = self.trailer.compute(&frame) {
            frame
                .extend_from_slice(&trailer)
                .map_err(|_| FrameError::BufferTooSmall)?;
        }

        Ok(frame)
    }

    /// Validate a complete frame and return its payload
    ///
    /// Checks header, length field and trailer. This is the inverse of
    /// [`encode`](Self::encode), used by hosts that want to parse what a
    /// device sent.
    pub fn decode<'a>(&self, frame: &'a [u8]) -> Result<&'a [u8], FrameError> {
        let overhead = self.frame_len(0);
        if frame.len() < overhead {
            return Err(FrameError::Incomplete);
        }
        if !frame.starts_with(self.header) {
            return Err(FrameError::BadHeader);
        }

        let payload_start = self.header.len() + self.length.size();
        let payload_end = frame.len() - self.trailer.size();
        let payload_len = payload_end - payload_start;

        let declared = match self.length {
            LengthField::None => None,
            LengthField::PayloadU8 => Some(frame[self.header.len()] as usize),
            LengthField::PayloadAndTrailerU16 | LengthField::FrameTotalU16 => Some(
                u16::from_be_bytes([frame[self.header.len()], frame[self.header.len() + 1]])
                    as usize,
            ),
        };
        if let Some(declared) = declared {
            if declared != self.length_value(payload_len) {
                return Err(FrameError::BadLength);
            }
        }

        if let Some(expected) = self.trailer.compute(&frame[..payload_end]) {
            if frame[payload_end..] != expected {
                return Err(FrameError::BadChecksum);
            }
        }

        Ok(&frame[payload_start..payload_end])
    }
}

/// Assembles fixed-length request frames from a byte stream
///
/// Bytes are queued as they arrive. Once `N` are buffered,
/// [`next_frame`](Self::next_frame) takes them off the queue and checks the
/// header. A short queue is left untouched; a bad header discards the
/// frame so the next one starts clean.
#[derive(Debug, Clone)]
pub struct FrameAssembler<const N: usize> {
    header: &'static [u8],
    queue: Deque<u8, RX_QUEUE_SIZE>,
}

impl<const N: usize> FrameAssembler<N> {
    /// Create an assembler for `N`-byte frames starting with `header`
    pub const fn new(header: &'static [u8]) -> Self {
        Self {
            header,
            queue: Deque::new(),
        }
    }

    /// Queue a received byte
    ///
    /// Fails with [`FrameError::BufferTooSmall`] if the queue is full; the
    /// byte is dropped.
    pub fn push(&mut self, byte: u8) -> Result<(), FrameError> {
        self.queue
            .push_back(byte)
            .map_err(|_| FrameError::BufferTooSmall)
    }

    /// Number of bytes waiting
    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    /// Check if a whole frame is buffered
    pub fn is_ready(&self) -> bool {
        self.queue.len() >= N
    }

    /// Take the next frame off the queue
    pub fn next_frame(&mut self) -> Result<[u8; N], FrameError> {
        if self.queue.len() < N {
            return Err(FrameError::Incomplete);
        }

        let mut frame = [0u8; N];
        for slot in frame.iter_mut() {
            match self.queue.pop_front() {
                Some(byte) => *slot = byte,
                None => return Err(FrameError::Incomplete),
            }
        }

        if !frame.starts_with(self.header) {
            return Err(FrameError::BadHeader);
        }

        Ok(frame)
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ACK: FrameTemplate =
        FrameTemplate::new(&[0x42, 0x4D], LengthField::PayloadAndTrailerU16, Trailer::Sum16);
    const MODBUS: FrameTemplate =
        FrameTemplate::new(&[0xFE, 0x04], LengthField::PayloadU8, Trailer::Crc16Modbus);
    const TOTAL: FrameTemplate =
        FrameTemplate::new(&[0x42, 0x4D], LengthField::FrameTotalU16, Trailer::Sum16);

    #[test]
    fn test_encode_sleep_ack() {
        let frame = ACK.encode(&[0xE4, 0x00]).unwrap();
        assert_eq!(&frame[..], &[0x42, 0x4D, 0x00, 0x04, 0xE4, 0x00, 0x01, 0x77]);
    }

    #[test]
    fn test_encode_modbus_trailer_is_little_endian() {
        let frame = MODBUS.encode(&[0x00, 0x00]).unwrap();
        assert_eq!(&frame[..], &[0xFE, 0x04, 0x02, 0x00, 0x00, 0xAD, 0x24]);
    }

    #[test]
    fn test_length_recomputed_from_payload() {
        let short = TOTAL.encode(&[0; 4]).unwrap();
        let long = TOTAL.encode(&[0; 26]).unwrap();
        assert_eq!(short[3] as usize, short.len());
        assert_eq!(long[3] as usize, long.len());
        assert_eq!(long.len(), 32);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(ACK.encode(&payload), Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let mut frame = MODBUS.encode(&[0x01, 0xA4]).unwrap();
        assert_eq!(MODBUS.decode(&frame), Ok(&[0x01, 0xA4][..]));

        frame[3] ^= 0x01;
        assert_eq!(MODBUS.decode(&frame), Err(FrameError::BadChecksum));

        frame[0] = 0x00;
        assert_eq!(MODBUS.decode(&frame), Err(FrameError::BadHeader));
        assert_eq!(MODBUS.decode(&frame[..3]), Err(FrameError::Incomplete));
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        let mut frame = ACK.encode(&[0xE1, 0x01]).unwrap();
        frame[3] = 0x05;
        assert_eq!(ACK.decode(&frame), Err(FrameError::BadLength));
    }

    #[test]
    fn test_assembler_waits_without_consuming() {
        let mut assembler = FrameAssembler::<7>::new(&[0x42, 0x4D]);
        for &byte in &[0x42, 0x4D, 0xE2, 0x00] {
            assembler.push(byte).unwrap();
        }

        assert!(!assembler.is_ready());
        assert_eq!(assembler.next_frame(), Err(FrameError::Incomplete));
        assert_eq!(assembler.buffered(), 4);
    }

    #[test]
    fn test_assembler_yields_frame() {
        let mut assembler = FrameAssembler::<7>::new(&[0x42, 0x4D]);
        for &byte in &[0x42, 0x4D, 0xE2, 0x00, 0x00, 0x01, 0x71] {
            assembler.push(byte).unwrap();
        }

        let frame = assembler.next_frame().unwrap();
        assert_eq!(frame[2], 0xE2);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn test_assembler_discards_bad_header() {
        let mut assembler = FrameAssembler::<3>::new(&[0xFE, 0x04]);
        for &byte in &[0xFE, 0x05, 0x00, 0xFE, 0x04, 0x00] {
            assembler.push(byte).unwrap();
        }

        assert_eq!(assembler.next_frame(), Err(FrameError::BadHeader));
        assert_eq!(assembler.next_frame(), Ok([0xFE, 0x04, 0x00]));
    }

    #[test]
    fn test_assembler_full_queue_drops() {
        let mut assembler = FrameAssembler::<7>::new(&[0x42, 0x4D]);
        for _ in 0..RX_QUEUE_SIZE {
            assembler.push(0).unwrap();
        }
        assert_eq!(assembler.push(0), Err(FrameError::BufferTooSmall));
    }

    proptest! {
        #[test]
        fn prop_trailer_matches_recomputed_checksum(payload in proptest::collection::vec(any::<u8>(), 0..MAX_PAYLOAD_SIZE)) {
            for template in [ACK, MODBUS, TOTAL] {
                if let Ok(frame) = template.encode(&payload) {
                    prop_assert_eq!(template.decode(&frame), Ok(&payload[..]));
                }
            }
        }
    }
}
