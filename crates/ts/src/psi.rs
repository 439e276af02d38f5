use crate::{Result, TsError};

/// Bytes before `section_length` counts (table_id + the two length bytes)
pub const SECTION_HEADER_LEN: usize = 3;

/// Length of the trailing CRC_32 of long form sections
pub const CRC32_LEN: usize = 4;

/// The long form section header shared by PAT and PMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// table_id
    pub table_id: u8,
    /// section_syntax_indicator
    pub section_syntax_indicator: bool,
    /// section_length, counting the bytes after it including CRC_32
    pub section_length: u16,
    /// transport_stream_id for PAT, program_number for PMT
    pub table_id_extension: u16,
    /// version_number
    pub version_number: u8,
    /// current_next_indicator
    pub current_next_indicator: bool,
    /// section_number
    pub section_number: u8,
    /// last_section_number
    pub last_section_number: u8,
}

impl SectionHeader {
    /// Bytes in the long header
    pub const LEN: usize = 8;

    /// Parses the header of a section expected to carry `table_id`.
    pub fn parse(data: &[u8], table_id: u8) -> Result<Self> {
        if data.len() < Self::LEN {
            return Err(TsError::InsufficientData {
                expected: Self::LEN,
                actual: data.len(),
            });
        }

        if data[0] != table_id {
            return Err(TsError::InvalidTableId {
                expected: table_id,
                actual: data[0],
            });
        }

        let section_syntax_indicator = (data[1] & 0x80) != 0;
        let section_length = ((data[1] as u16 & 0x0F) << 8) | data[2] as u16;
        if (section_length as usize) < Self::LEN - SECTION_HEADER_LEN + CRC32_LEN {
            return Err(TsError::InvalidSectionLength(section_length));
        }

        if data.len() < SECTION_HEADER_LEN + section_length as usize {
            return Err(TsError::InsufficientData {
                expected: SECTION_HEADER_LEN + section_length as usize,
                actual: data.len(),
            });
        }

        Ok(Self {
            table_id: data[0],
            section_syntax_indicator,
            section_length,
            table_id_extension: ((data[3] as u16) << 8) | data[4] as u16,
            version_number: (data[5] >> 1) & 0x1F,
            current_next_indicator: (data[5] & 0x01) != 0,
            section_number: data[6],
            last_section_number: data[7],
        })
    }

    /// Offset one past the last body byte, excluding CRC_32
    pub fn body_end(&self) -> usize {
        SECTION_HEADER_LEN + self.section_length as usize - CRC32_LEN
    }

    /// True when the section may replace the active table
    pub fn is_applicable(&self) -> bool {
        self.current_next_indicator && self.section_number == 0
    }
}

/// Total byte length of the section starting at `data`, from its
/// section_length field. `None` until the first 3 bytes are available.
pub fn section_total_length(data: &[u8]) -> Option<usize> {
    if data.len() < SECTION_HEADER_LEN {
        return None;
    }
    Some(SECTION_HEADER_LEN + (((data[1] as usize & 0x0F) << 8) | data[2] as usize))
}
