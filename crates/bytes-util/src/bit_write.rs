use std::io;

/// A writer that packs bits MSB first into an owned byte buffer.
///
/// Used to build the decoder configuration records, which mix whole bytes
/// with short bit fields.
#[derive(Debug, Default)]
#[must_use]
pub struct BitWriter {
    buf: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    /// Creates an empty writer
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            bit_pos: 0,
        }
    }

    /// Creates an empty writer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            bit_pos: 0,
        }
    }

    /// Writes a single bit
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if self.bit_pos == 0 {
            self.buf.push(0);
        }

        if bit {
            if let Some(last) = self.buf.last_mut() {
                *last |= 1 << (7 - self.bit_pos);
            }
        }

        self.bit_pos = (self.bit_pos + 1) % 8;
        Ok(())
    }

    /// Writes the low `count` bits of `bits`, most significant first
    pub fn write_bits(&mut self, bits: u64, count: u8) -> io::Result<()> {
        let count = count.min(64);

        if count != 64 && bits > (1 << count as u64) - 1 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bits too large to write"));
        }

        for i in (0..count).rev() {
            self.write_bit((bits >> i) & 1 == 1)?;
        }

        Ok(())
    }

    /// Pads with zero bits up to the next byte boundary
    pub fn align(&mut self) {
        self.bit_pos = 0;
    }

    /// Aligns and returns the written bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.buf
    }

    /// Returns the bit position inside the current byte (0-7)
    #[inline(always)]
    #[must_use]
    pub const fn bit_pos(&self) -> u8 {
        self.bit_pos
    }

    /// Checks if the writer is aligned to the byte boundary
    #[inline(always)]
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Bytes written so far; a partial trailing byte is included zero padded
    #[inline(always)]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl io::Write for BitWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_aligned() {
            self.buf.extend_from_slice(buf);
            return Ok(buf.len());
        }

        for byte in buf {
            self.write_bits(*byte as u64, 8)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_bit_writer() {
        let mut bit_writer = BitWriter::new();

        bit_writer.write_bits(0b11111111, 8).unwrap();
        assert!(bit_writer.is_aligned());

        bit_writer.write_bits(0b0000, 4).unwrap();
        assert_eq!(bit_writer.bit_pos(), 4);
        bit_writer.align();
        assert!(bit_writer.is_aligned());

        bit_writer.write_bits(0b1010, 4).unwrap();
        bit_writer.write_bits(0b101010101010, 12).unwrap();
        assert!(bit_writer.is_aligned());

        bit_writer.write_bit(true).unwrap();
        assert_eq!(bit_writer.bit_pos(), 1);

        let err = bit_writer.write_bits(0b10000, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "bits too large to write");

        assert_eq!(
            bit_writer.finish(),
            vec![0b11111111, 0b00000000, 0b10101010, 0b10101010, 0b10000000]
        );
    }

    #[test]
    fn test_io_write_unaligned() {
        let mut bit_writer = BitWriter::with_capacity(8);

        bit_writer.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(bit_writer.as_slice(), &[1, 2, 3]);

        bit_writer.write_bit(true).unwrap();
        bit_writer.write_bits(0b1010, 4).unwrap();
        bit_writer.write_all(&[0b11111111, 0b00000000]).unwrap();

        assert_eq!(
            bit_writer.finish(),
            vec![1, 2, 3, 0b11010111, 0b11111000, 0b00000000]
        );
    }
}
