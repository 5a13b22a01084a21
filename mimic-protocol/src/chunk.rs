//! Sensirion word chunking
//!
//! Sensirion I2C parts move data as 16-bit big-endian words, each followed
//! by its own CRC-8. The same framing is used in both directions: argument
//! words sent after a command opcode, and result words read back.

use heapless::Vec;

use crate::checksum::crc8;
use crate::frame::FrameError;

/// Bytes per chunk (2 data + 1 CRC)
pub const CHUNK_LEN: usize = 3;

/// Encode one word as a chunk
pub fn encode_word(word: u16) -> [u8; CHUNK_LEN] {
    let [hi, lo] = word.to_be_bytes();
    [hi, lo, crc8(&[hi, lo])]
}

/// Append words to an output buffer as chunks
///
/// Either every word fits or nothing is appended.
pub fn push_words<const N: usize>(out: &mut Vec<u8, N>, words: &[u16]) -> Result<(), FrameError> {
    if out.len() + words.len() * CHUNK_LEN > N {
        return Err(FrameError::BufferTooSmall);
    }

    for &word in words {
        out.extend_from_slice(&encode_word(word))
            .map_err(|_| FrameError::BufferTooSmall)?;
    }
    Ok(())
}

/// Decode a run of chunks, checking every CRC
///
/// A trailing partial chunk is [`FrameError::BadLength`]; a CRC mismatch
/// is [`FrameError::BadChecksum`].
pub fn decode_words<const N: usize>(bytes: &[u8]) -> Result<Vec<u16, N>, FrameError> {
    if bytes.len() % CHUNK_LEN != 0 {
        return Err(FrameError::BadLength);
    }

    let mut words = Vec::new();
    for chunk in bytes.chunks_exact(CHUNK_LEN) {
        let data = [chunk[0], chunk[1]];
        if crc8(&data) != chunk[2] {
            return Err(FrameError::BadChecksum);
        }
        words
            .push(u16::from_be_bytes(data))
            .map_err(|_| FrameError::BufferTooSmall)?;
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_word() {
        assert_eq!(encode_word(0xBEEF), [0xBE, 0xEF, 0x92]);
        assert_eq!(encode_word(0x0000), [0x00, 0x00, 0x81]);
    }

    #[test]
    fn test_push_words_all_or_nothing() {
        let mut out: Vec<u8, 8> = Vec::new();
        push_words(&mut out, &[0xAABB, 0xCCDD]).unwrap();
        assert_eq!(&out[..], &[0xAA, 0xBB, 0xC5, 0xCC, 0xDD, 0xD7]);

        assert_eq!(push_words(&mut out, &[0xEEFF]), Err(FrameError::BufferTooSmall));
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn test_decode_words() {
        let words: Vec<u16, 4> = decode_words(&[0x80, 0x00, 0xA2, 0x66, 0x66, 0x93]).unwrap();
        assert_eq!(&words[..], &[0x8000, 0x6666]);
    }

    #[test]
    fn test_decode_rejects_partial_chunk() {
        let result: Result<Vec<u16, 4>, _> = decode_words(&[0x80, 0x00]);
        assert_eq!(result, Err(FrameError::BadLength));
    }

    #[test]
    fn test_decode_rejects_bad_crc() {
        let result: Result<Vec<u16, 4>, _> = decode_words(&[0x80, 0x00, 0xA3]);
        assert_eq!(result, Err(FrameError::BadChecksum));
    }

    #[test]
    fn test_decode_empty() {
        let words: Vec<u16, 4> = decode_words(&[]).unwrap();
        assert!(words.is_empty());
    }
}
