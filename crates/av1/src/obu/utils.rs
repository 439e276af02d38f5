use std::io;

use bytes_util::BitReader;

/// Read a little-endian variable-length integer.
/// AV1-Spec-2 - 4.10.5
pub(crate) fn read_leb128(reader: &mut BitReader<'_>) -> io::Result<u64> {
    let mut result = 0;
    for i in 0..8 {
        let byte = reader.read_bits(8)? as u64;
        result |= (byte & 0x7f) << (i * 7);
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok(result)
}

/// Appends `value` as leb128 using the fewest bytes.
pub(crate) fn write_leb128(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Read a variable-length unsigned integer.
/// AV1-Spec-2 - 4.10.3
pub(crate) fn read_uvlc(reader: &mut BitReader<'_>) -> io::Result<u64> {
    let mut leading_zeros = 0u8;
    while !reader.read_bit()? {
        leading_zeros += 1;
        if leading_zeros >= 32 {
            return Ok((1 << 32) - 1);
        }
    }

    let value = reader.read_bits(leading_zeros)? as u64;
    Ok(value + (1 << leading_zeros) - 1)
}
