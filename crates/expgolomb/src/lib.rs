//! Exp-Golomb (`ue(v)` / `se(v)`) coding on top of the [`BitReader`] and
//! [`BitWriter`] from the [`bytes-util`](bytes_util) crate.
//!
//! ```rust
//! # fn test() -> std::io::Result<()> {
//! use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};
//! use bytes_util::{BitReader, BitWriter};
//!
//! let mut bit_writer = BitWriter::new();
//! bit_writer.write_exp_golomb(0)?;
//! bit_writer.write_signed_exp_golomb(-2)?;
//!
//! let data = bit_writer.finish();
//! let mut bit_reader = BitReader::new(&data);
//!
//! assert_eq!(bit_reader.read_exp_golomb()?, 0);
//! assert_eq!(bit_reader.read_signed_exp_golomb()?, -2);
//! # Ok(())
//! # }
//! # test().expect("failed to run test");
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

use std::io;

use bytes_util::{BitReader, BitWriter};

/// Extension trait for reading Exp-Golomb encoded numbers from a bit reader
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitReaderExpGolombExt {
    /// Reads an unsigned Exp-Golomb encoded number (`ue(v)`)
    fn read_exp_golomb(&mut self) -> io::Result<u32>;

    /// Reads a signed Exp-Golomb encoded number (`se(v)`)
    fn read_signed_exp_golomb(&mut self) -> io::Result<i32> {
        let code = self.read_exp_golomb()? as i64;

        let value = if code % 2 == 0 { -(code / 2) } else { code / 2 + 1 };
        Ok(value as i32)
    }
}

impl BitReaderExpGolombExt for BitReader<'_> {
    fn read_exp_golomb(&mut self) -> io::Result<u32> {
        let mut leading_zeros = 0u8;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "exp-golomb code longer than 32 bits"));
            }
        }

        let suffix = self.read_bits(leading_zeros)? as u64;
        Ok(((1u64 << leading_zeros) - 1 + suffix) as u32)
    }
}

/// Extension trait for writing Exp-Golomb encoded numbers to a bit writer
pub trait BitWriterExpGolombExt {
    /// Writes an unsigned Exp-Golomb encoded number
    fn write_exp_golomb(&mut self, input: u32) -> io::Result<()>;

    /// Writes a signed Exp-Golomb encoded number
    fn write_signed_exp_golomb(&mut self, number: i32) -> io::Result<()> {
        let number = number as i64;
        let code = if number <= 0 { -number * 2 } else { number * 2 - 1 };

        self.write_exp_golomb(code as u32)
    }
}

impl BitWriterExpGolombExt for BitWriter {
    fn write_exp_golomb(&mut self, input: u32) -> io::Result<()> {
        let value = input as u64 + 1;
        let leading_zeros = (63 - value.leading_zeros()) as u8;

        self.write_bits(0, leading_zeros)?;
        self.write_bits(value, leading_zeros + 1)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::{BitReader, BitWriter};

    use crate::{BitReaderExpGolombExt, BitWriterExpGolombExt};

    #[test]
    fn test_exp_glob_decode() {
        let mut bit_writer = BitWriter::new();

        bit_writer.write_bits(0b1, 1).unwrap(); // 0
        bit_writer.write_bits(0b010, 3).unwrap(); // 1
        bit_writer.write_bits(0b011, 3).unwrap(); // 2
        bit_writer.write_bits(0b00100, 5).unwrap(); // 3
        bit_writer.write_bits(0b00111, 5).unwrap(); // 6

        let data = bit_writer.finish();
        let mut bit_reader = BitReader::new(&data);
        let total = bit_reader.bits_left();

        for (expected, consumed) in [(0, 1), (1, 4), (2, 7), (3, 12), (6, 17)] {
            assert_eq!(bit_reader.read_exp_golomb().unwrap(), expected);
            assert_eq!(bit_reader.bits_left(), total - consumed);
        }
    }

    #[test]
    fn test_signed_exp_glob_decode() {
        let mut bit_writer = BitWriter::new();

        bit_writer.write_bits(0b1, 1).unwrap(); // 0
        bit_writer.write_bits(0b010, 3).unwrap(); // 1
        bit_writer.write_bits(0b011, 3).unwrap(); // -1
        bit_writer.write_bits(0b00100, 5).unwrap(); // 2
        bit_writer.write_bits(0b00111, 5).unwrap(); // -3

        let data = bit_writer.finish();
        let mut bit_reader = BitReader::new(&data);

        for expected in [0, 1, -1, 2, -3] {
            assert_eq!(bit_reader.read_signed_exp_golomb().unwrap(), expected);
        }
    }

    #[test]
    fn test_write_then_read_extremes() {
        let mut bit_writer = BitWriter::new();
        bit_writer.write_exp_golomb(u32::MAX - 1).unwrap();
        bit_writer.write_signed_exp_golomb(i32::MIN + 1).unwrap();
        bit_writer.write_exp_golomb(5).unwrap();

        let data = bit_writer.finish();
        let mut bit_reader = BitReader::new(&data);
        assert_eq!(bit_reader.read_exp_golomb().unwrap(), u32::MAX - 1);
        assert_eq!(bit_reader.read_signed_exp_golomb().unwrap(), i32::MIN + 1);
        assert_eq!(bit_reader.read_exp_golomb().unwrap(), 5);
    }

    #[test]
    fn test_rejects_overlong_prefix() {
        let data = [0u8; 8];
        let mut bit_reader = BitReader::new(&data);
        assert_eq!(
            bit_reader.read_exp_golomb().unwrap_err().kind(),
            std::io::ErrorKind::InvalidData
        );
    }
}
