use bytes::{Buf, Bytes};

use crate::descriptor::Descriptor;
use crate::psi::SectionHeader;
use crate::stream_type::{StreamKind, StreamType};
use crate::{Result, TsError};

/// PMT table_id
pub const PMT_TABLE_ID: u8 = 0x02;

/// Program Map Table (PMT) - Table ID 0x02
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pmt {
    /// Program number
    pub program_number: u16,
    /// Version number
    pub version_number: u8,
    /// Current/next indicator
    pub current_next_indicator: bool,
    /// Section number
    pub section_number: u8,
    /// Last section number
    pub last_section_number: u8,
    /// PCR PID
    pub pcr_pid: u16,
    /// Program info descriptors
    pub program_info: Vec<Descriptor>,
    /// Elementary streams
    pub streams: Vec<PmtStream>,
}

/// Elementary stream in PMT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmtStream {
    /// Stream type
    pub stream_type: StreamType,
    /// Elementary PID
    pub elementary_pid: u16,
    /// Raw ES info descriptor loop
    pub es_info: Bytes,
    /// ES info descriptors
    pub descriptors: Vec<Descriptor>,
    /// Handler resolved from stream type and descriptors
    pub kind: StreamKind,
}

impl Pmt {
    /// Parse PMT from PSI section data
    pub fn parse(data: Bytes) -> Result<Self> {
        let header = SectionHeader::parse(&data, PMT_TABLE_ID)?;
        let streams_end = header.body_end();
        if streams_end < SectionHeader::LEN + 4 {
            return Err(TsError::InvalidSectionLength(header.section_length));
        }

        let mut reader = &data[SectionHeader::LEN..streams_end];
        let pcr_pid = reader.get_u16() & 0x1FFF;
        let program_info_length = (reader.get_u16() & 0x0FFF) as usize;

        let mut offset = SectionHeader::LEN + 4;
        if offset + program_info_length > streams_end {
            return Err(TsError::InsufficientData {
                expected: offset + program_info_length,
                actual: streams_end,
            });
        }
        let program_info = Descriptor::parse_loop(data.slice(offset..offset + program_info_length))?;
        offset += program_info_length;

        let mut streams = Vec::new();
        while offset + 5 <= streams_end {
            let mut reader = &data[offset..offset + 5];
            let stream_type = StreamType::from(reader.get_u8());
            let elementary_pid = reader.get_u16() & 0x1FFF;
            let es_info_length = (reader.get_u16() & 0x0FFF) as usize;
            offset += 5;

            if offset + es_info_length > streams_end {
                return Err(TsError::InsufficientData {
                    expected: offset + es_info_length,
                    actual: streams_end,
                });
            }

            let es_info = data.slice(offset..offset + es_info_length);
            let descriptors = Descriptor::parse_loop(es_info.clone())?;
            offset += es_info_length;

            streams.push(PmtStream {
                stream_type,
                elementary_pid,
                es_info,
                kind: StreamKind::resolve(stream_type, &descriptors),
                descriptors,
            });
        }

        Ok(Pmt {
            program_number: header.table_id_extension,
            version_number: header.version_number,
            current_next_indicator: header.current_next_indicator,
            section_number: header.section_number,
            last_section_number: header.last_section_number,
            pcr_pid,
            program_info,
            streams,
        })
    }

    /// Get stream by PID
    pub fn get_stream(&self, pid: u16) -> Option<&PmtStream> {
        self.streams.iter().find(|s| s.elementary_pid == pid)
    }

    /// The first video stream
    pub fn video_stream(&self) -> Option<&PmtStream> {
        self.streams.iter().find(|s| s.kind.is_video())
    }

    /// The first audio stream
    pub fn audio_stream(&self) -> Option<&PmtStream> {
        self.streams.iter().find(|s| s.kind.is_audio())
    }

    /// True when the section may replace the active table
    pub fn is_applicable(&self) -> bool {
        self.current_next_indicator && self.section_number == 0
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use super::*;

    /// Serialises a PMT section for `(stream_type, pid, es_info)` entries.
    pub(crate) fn build_pmt(program_number: u16, version: u8, streams: &[(u8, u16, &[u8])]) -> Vec<u8> {
        let mut body = vec![
            (program_number >> 8) as u8,
            program_number as u8,
            0xC1 | (version << 1),
            0x00,
            0x00,
            0xE1,
            0x00, // PCR PID 0x100
            0xF0,
            0x00, // no program info
        ];
        for (stream_type, pid, es_info) in streams {
            body.push(*stream_type);
            body.push(0xE0 | (pid >> 8) as u8);
            body.push(*pid as u8);
            body.push(0xF0 | (es_info.len() >> 8) as u8);
            body.push(es_info.len() as u8);
            body.extend_from_slice(es_info);
        }
        // CRC32 (not verified)
        body.extend_from_slice(&[0, 0, 0, 0]);

        let mut section = vec![PMT_TABLE_ID, 0xB0 | (body.len() >> 8) as u8, body.len() as u8];
        section.extend(body);
        section
    }

    #[test]
    fn test_pmt_invalid_table_id() {
        let data = vec![0x01, 0x80, 0x0D, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(Pmt::parse(Bytes::from(data)), Err(TsError::InvalidTableId { .. })));
    }

    #[test]
    fn test_pmt_basic_parsing() {
        let data = build_pmt(
            1,
            3,
            &[
                (0x1B, 0x100, &[]),
                (0x0F, 0x101, &[0x0A, 0x04, b'e', b'n', b'g', 0x00]),
                (0x06, 0x102, &[0x05, 0x04, b'K', b'L', b'V', b'A']),
            ],
        );

        let pmt = Pmt::parse(Bytes::from(data)).unwrap();
        assert_eq!(pmt.program_number, 1);
        assert_eq!(pmt.version_number, 3);
        assert_eq!(pmt.pcr_pid, 0x100);
        assert!(pmt.is_applicable());
        assert_eq!(pmt.streams.len(), 3);
        assert_eq!(pmt.streams[0].stream_type, StreamType::H264);
        assert_eq!(pmt.video_stream().map(|s| s.elementary_pid), Some(0x100));
        assert_eq!(pmt.audio_stream().map(|s| s.elementary_pid), Some(0x101));
        assert_eq!(pmt.streams[1].descriptors[0].iso_639_language().as_deref(), Some("eng"));
        assert_eq!(pmt.get_stream(0x102).map(|s| &s.kind), Some(&StreamKind::AsynchronousKlv));
    }

    #[test]
    fn test_pmt_es_info_overrun() {
        let mut data = build_pmt(1, 0, &[(0x1B, 0x100, &[0x05, 0x00])]);
        // claim 16 bytes of es_info
        data[16] = 0x10;
        assert!(matches!(Pmt::parse(Bytes::from(data)), Err(TsError::InsufficientData { .. })));
    }
}
