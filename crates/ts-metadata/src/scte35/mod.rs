//! SCTE 35 (2019) splice information sections
//!
//! Decodes a complete `splice_info_section()` into its header, the typed
//! splice command and the splice descriptors. CRC_32 is carried, not checked.

use std::io;

use bytes::Bytes;
use bytes_util::BitReader;

mod command;
mod descriptor;

pub use command::{
    BreakDuration, InsertComponent, ScheduleComponent, ScheduleEvent, ScheduleEventDetail, SpliceCommand,
    SpliceEventTrailer, SpliceInsert, SpliceInsertDetail, SpliceTime,
};
pub use descriptor::{AudioComponent, DeliveryRestrictions, SegmentationComponent, SegmentationDetail, SpliceDescriptor};

/// `table_id` of a splice_info_section
pub const SCTE35_TABLE_ID: u8 = 0xFC;

/// `splice_command_length` value meaning the length is not given
const UNSPECIFIED_COMMAND_LENGTH: u16 = 0xFFF;

/// Bytes up to and including `splice_command_type`
const FIXED_HEADER_LEN: usize = 14;

const CRC32_LEN: usize = 4;

/// Timestamps wrap at 2^33
const PTS_MODULO: u64 = 1 << 33;

/// `splice_info_section()`, SCTE 35 2019 - 9.6
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceInfoSection {
    /// `table_id`
    pub table_id: u8,
    /// `section_syntax_indicator`
    pub section_syntax_indicator: bool,
    /// `private_indicator`
    pub private_indicator: bool,
    /// `sap_type`
    pub sap_type: u8,
    /// `section_length`
    pub section_length: u16,
    /// `protocol_version`
    pub protocol_version: u8,
    /// `encrypted_packet`
    pub encrypted_packet: bool,
    /// `encryption_algorithm`
    pub encryption_algorithm: u8,
    /// `pts_adjustment`
    pub pts_adjustment: u64,
    /// `cw_index`
    pub cw_index: u8,
    /// `tier`
    pub tier: u16,
    /// `splice_command_length`
    pub splice_command_length: u16,
    /// `splice_command_type`
    pub splice_command_type: u8,
    /// The decoded command
    pub splice_command: SpliceCommand,
    /// `descriptor_loop_length`
    pub descriptor_loop_length: u16,
    /// Decoded descriptors, empty for encrypted sections
    pub descriptors: Vec<SpliceDescriptor>,
    /// `E_CRC_32` of encrypted sections
    pub e_crc32: Option<u32>,
    /// `CRC_32`
    pub crc32: u32,
}

impl SpliceInfoSection {
    /// Decodes a complete section starting at `table_id`.
    pub fn parse(data: &Bytes) -> io::Result<Self> {
        let mut reader = BitReader::new(data);

        let table_id = reader.read_u8()?;
        if table_id != SCTE35_TABLE_ID {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("not a splice_info_section: table_id 0x{table_id:02x}"),
            ));
        }

        let section_syntax_indicator = reader.read_bit()?;
        let private_indicator = reader.read_bit()?;
        let sap_type = reader.read_bits(2)? as u8;
        let section_length = reader.read_bits(12)? as u16;
        let section_end = 3 + section_length as usize;
        if section_end > data.len() || section_end < FIXED_HEADER_LEN + 2 + CRC32_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("section_length {section_length} does not fit {} bytes", data.len()),
            ));
        }

        let protocol_version = reader.read_u8()?;
        let encrypted_packet = reader.read_bit()?;
        let encryption_algorithm = reader.read_bits(6)? as u8;
        let pts_adjustment = reader.read_bits_u64(33)?;
        let cw_index = reader.read_u8()?;
        let tier = reader.read_bits(12)? as u16;
        let splice_command_length = reader.read_bits(12)? as u16;
        let splice_command_type = reader.read_u8()?;

        let crc_start = section_end - CRC32_LEN;
        let command_end = if splice_command_length == UNSPECIFIED_COMMAND_LENGTH {
            crc_start
        } else {
            FIXED_HEADER_LEN + splice_command_length as usize
        };
        if command_end > crc_start {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "splice command overruns section"));
        }

        let command_data = data.slice(FIXED_HEADER_LEN..command_end);
        let (splice_command, used) = if encrypted_packet {
            (
                SpliceCommand::Unknown {
                    command_type: splice_command_type,
                    data: command_data.clone(),
                },
                command_data.len(),
            )
        } else {
            SpliceCommand::read(splice_command_type, &command_data)?
        };

        let loop_start = if splice_command_length == UNSPECIFIED_COMMAND_LENGTH {
            FIXED_HEADER_LEN + used
        } else {
            command_end
        };
        if loop_start + 2 > crc_start {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "missing descriptor_loop_length"));
        }

        let descriptor_loop_length = u16::from_be_bytes([data[loop_start], data[loop_start + 1]]);
        let loop_end = loop_start + 2 + descriptor_loop_length as usize;
        if loop_end > crc_start {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "descriptor loop overruns section"));
        }

        let descriptors = if encrypted_packet {
            Vec::new()
        } else {
            SpliceDescriptor::read_loop(data.slice(loop_start + 2..loop_end))?
        };

        let read_u32 = |at: usize| u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let e_crc32 = (encrypted_packet && crc_start >= loop_end + CRC32_LEN).then(|| read_u32(crc_start - CRC32_LEN));

        Ok(Self {
            table_id,
            section_syntax_indicator,
            private_indicator,
            sap_type,
            section_length,
            protocol_version,
            encrypted_packet,
            encryption_algorithm,
            pts_adjustment,
            cw_index,
            tier,
            splice_command_length,
            splice_command_type,
            splice_command,
            descriptor_loop_length,
            descriptors,
            e_crc32,
            crc32: read_u32(crc_start),
        })
    }

    /// Absolute splice pts: `(pts_adjustment + pts_time) mod 2^33`, when the
    /// command names an explicit program level time.
    pub fn splice_pts(&self) -> Option<u64> {
        self.splice_command
            .pts_time()
            .map(|pts_time| (self.pts_adjustment + pts_time) % PTS_MODULO)
    }
}

/// A decoded SCTE-35 section as delivered to the metadata consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scte35Data {
    /// PID the section arrived on
    pub pid: u16,
    /// `splice_command_type`
    pub splice_command_type: u8,
    /// Absolute splice time in 90 kHz units, when the command specifies one
    pub pts: Option<u64>,
    /// Most recent PES pts seen on the stream before this section
    pub nearest_pts: Option<u64>,
    /// `auto_return` of a splice_insert break
    pub auto_return: Option<bool>,
    /// `duration` of a splice_insert break in 90 kHz units
    pub duration: Option<u64>,
    /// The decoded section
    pub section: SpliceInfoSection,
    /// The raw section bytes
    pub data: Bytes,
}

impl Scte35Data {
    /// Decodes `data`, a complete section received on `pid`.
    pub fn decode(pid: u16, data: Bytes, nearest_pts: Option<u64>) -> io::Result<Self> {
        let section = SpliceInfoSection::parse(&data)?;
        let break_duration = section.splice_command.break_duration();

        Ok(Self {
            pid,
            splice_command_type: section.splice_command_type,
            pts: section.splice_pts(),
            nearest_pts,
            auto_return: break_duration.map(|b| b.auto_return),
            duration: break_duration.map(|b| b.duration),
            section,
            data,
        })
    }
}
