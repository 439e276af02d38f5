use std::io;

/// A cursor that reads individual bits (MSB first) from a borrowed slice.
///
/// Every read is bounds checked against the slice; running past the end
/// yields [`io::ErrorKind::UnexpectedEof`] and leaves the cursor untouched.
#[derive(Debug, Clone)]
#[must_use]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader positioned at the first bit of `data`
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    fn ensure(&self, count: usize) -> io::Result<()> {
        if count > self.bits_left() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("bit reader exhausted: need {count} bits, {} left", self.bits_left()),
            ));
        }

        Ok(())
    }

    /// Reads a single bit
    pub fn read_bit(&mut self) -> io::Result<bool> {
        self.ensure(1)?;
        let byte = self.data[self.bit_pos / 8];
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 32 bits as an unsigned big-endian value
    pub fn read_bits(&mut self, count: u8) -> io::Result<u32> {
        if count > 32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot read {count} bits into u32"),
            ));
        }

        Ok(self.read_bits_u64(count)? as u32)
    }

    /// Reads up to 64 bits, for the handful of 33/40/48-bit fields in the
    /// transport and splice syntax
    pub fn read_bits_u64(&mut self, count: u8) -> io::Result<u64> {
        if count > 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot read {count} bits into u64"),
            ));
        }
        self.ensure(count as usize)?;

        let mut value = 0u64;
        let mut remaining = count as usize;
        while remaining > 0 {
            let byte = self.data[self.bit_pos / 8];
            let offset = self.bit_pos % 8;
            let available = 8 - offset;
            let take = available.min(remaining);
            let shift = available - take;
            let bits = (byte >> shift) & (0xFF >> (8 - take));

            value = (value << take) | bits as u64;
            self.bit_pos += take;
            remaining -= take;
        }

        Ok(value)
    }

    /// Reads 8 bits, aligned or not
    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Skips `count` bits
    pub fn skip_bits(&mut self, count: usize) -> io::Result<()> {
        self.ensure(count)?;
        self.bit_pos += count;
        Ok(())
    }

    /// Aligns the reader to the next byte boundary
    #[inline(always)]
    pub fn align(&mut self) {
        self.bit_pos = self.bit_pos.div_ceil(8) * 8;
    }

    /// Returns the bit position inside the current byte (0-7)
    #[inline(always)]
    #[must_use]
    pub const fn bit_pos(&self) -> u8 {
        (self.bit_pos % 8) as u8
    }

    /// Returns the absolute position in bits from the start of the slice
    #[inline(always)]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.bit_pos
    }

    /// Returns the index of the byte the next bit is read from
    #[inline(always)]
    #[must_use]
    pub const fn byte_offset(&self) -> usize {
        self.bit_pos / 8
    }

    /// Checks if the reader is aligned to the byte boundary
    #[inline(always)]
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Number of unread bits
    #[inline(always)]
    #[must_use]
    pub const fn bits_left(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// The unread bytes, starting at the byte containing the next bit
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[(self.bit_pos / 8).min(self.data.len())..]
    }

    /// Returns the underlying slice
    #[inline(always)]
    #[must_use]
    pub const fn get_ref(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_bit_reader() {
        let binary = 0b10101010110011001111000101010101u32;
        let bytes = binary.to_be_bytes();

        let mut reader = BitReader::new(&bytes);
        for i in 0..32 {
            assert_eq!(
                reader.read_bit().unwrap(),
                (binary & (1 << (31 - i))) != 0,
                "bit {i} is not correct",
            );
        }

        assert!(reader.read_bit().is_err(), "there shouldnt be any bits left");
    }

    #[test]
    fn test_bit_reader_read_bits() {
        let bytes = 0b10101010110011001111000101010101u32.to_be_bytes();
        let mut reader = BitReader::new(&bytes);
        let cases = [
            (3, 0b101),
            (4, 0b0101),
            (3, 0b011),
            (3, 0b001),
            (3, 0b100),
            (3, 0b111),
            (5, 0b10001),
            (1, 0b0),
            (7, 0b1010101),
        ];

        for (i, (count, expected)) in cases.into_iter().enumerate() {
            assert_eq!(
                reader.read_bits(count).ok(),
                Some(expected),
                "reading {count} bits ({i}) are not correct",
            );
        }

        assert_eq!(reader.bits_left(), 0);
    }

    #[test]
    fn test_read_full_width() {
        let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0x80];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(32).unwrap(), 0xDEADBEEF);
        assert!(reader.read_bit().unwrap());

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits_u64(33).unwrap(), 0x1_BD5B_7DDF);
        assert!(reader.read_bits(33).is_err());
    }

    #[test]
    fn test_overrun_leaves_cursor() {
        let bytes = [0xFF];
        let mut reader = BitReader::new(&bytes);
        reader.read_bits(3).unwrap();

        let err = reader.read_bits(6).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.read_bits(5).unwrap(), 0b11111);
    }

    #[test]
    fn test_align_and_remaining() {
        let bytes = [0b1000_0000, 0x12, 0x34];
        let mut reader = BitReader::new(&bytes);

        assert!(reader.read_bit().unwrap());
        assert!(!reader.is_aligned());
        reader.align();
        assert!(reader.is_aligned());
        assert_eq!(reader.byte_offset(), 1);
        assert_eq!(reader.remaining(), &[0x12, 0x34]);
        assert_eq!(reader.read_u8().unwrap(), 0x12);

        reader.align();
        assert_eq!(reader.byte_offset(), 2);
        reader.skip_bits(8).unwrap();
        assert_eq!(reader.remaining(), &[] as &[u8]);
        assert!(reader.skip_bits(1).is_err());
    }
}
