use bytes::Bytes;

/// Strips emulation prevention bytes: every `0x03` that directly follows two
/// zero bytes of the source is dropped.
///
/// Returns the input untouched (no copy) when nothing needs removing.
pub fn ebsp_to_rbsp(data: &Bytes) -> Bytes {
    let needs_copy = data
        .windows(3)
        .any(|w| w[0] == 0x00 && w[1] == 0x00 && w[2] == 0x03);
    if !needs_copy {
        return data.clone();
    }

    let mut out = Vec::with_capacity(data.len());
    for (i, &byte) in data.iter().enumerate() {
        if i >= 2 && byte == 0x03 && data[i - 1] == 0x00 && data[i - 2] == 0x00 {
            continue;
        }
        out.push(byte);
    }

    Bytes::from(out)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_no_emulation_bytes_is_zero_copy() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x01, 0x03, 0x00]);
        let rbsp = ebsp_to_rbsp(&data);
        assert_eq!(rbsp, data);
        assert_eq!(rbsp.as_ptr(), data.as_ptr());
    }

    #[test]
    fn test_removes_emulation_bytes() {
        let data = Bytes::from_static(&[0x25, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03]);
        assert_eq!(
            ebsp_to_rbsp(&data).as_ref(),
            &[0x25, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_only_first_escape_after_zero_pair() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x03, 0x03]);
        assert_eq!(ebsp_to_rbsp(&data).as_ref(), &[0x00, 0x00, 0x03]);
    }
}
