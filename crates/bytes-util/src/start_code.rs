/// Location of an Annex-B start code inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCode {
    /// Offset of the first byte of the start code.
    pub offset: usize,
    /// Length of the start code, 3 (`00 00 01`) or 4 (`00 00 00 01`).
    pub len: usize,
}

impl StartCode {
    /// Offset of the first byte following the start code.
    #[inline]
    pub const fn payload_offset(&self) -> usize {
        self.offset + self.len
    }
}

/// Finds the next `00 00 01` or `00 00 00 01` at or after `from`.
pub fn find_start_code(data: &[u8], from: usize) -> Option<StartCode> {
    if from >= data.len() {
        return None;
    }

    let pos = from + memchr::memmem::find(&data[from..], &[0x00, 0x00, 0x01])?;
    if pos > from && data[pos - 1] == 0x00 {
        Some(StartCode { offset: pos - 1, len: 4 })
    } else {
        Some(StartCode { offset: pos, len: 3 })
    }
}
