use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{Buf, Bytes};
use bytes_util::BitWriter;

use crate::SpsDetails;

/// The AVC (H.264) Decoder Configuration Record.
/// ISO/IEC 14496-15:2022(E) - 5.3.2.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct AVCDecoderConfigurationRecord {
    /// The `configuration_version` is set to 1 (as a u8) defined by the h264 spec until further notice.
    pub configuration_version: u8,

    /// The `profile_indication` (aka AVCProfileIndication) contains the `profile_idc` u8 from SPS.
    pub profile_indication: u8,

    /// The `profile_compatibility` is the constraint flag byte from SPS.
    pub profile_compatibility: u8,

    /// The `level_indication` (aka AVCLevelIndication) contains the `level_idc` u8 from SPS.
    pub level_indication: u8,

    /// The `length_size_minus_one` is the u8 length of the NALUnitLength minus one.
    pub length_size_minus_one: u8,

    /// The `sps` is a vec of SPS NAL units, header byte included.
    pub sps: Vec<Bytes>,

    /// The `pps` is a vec of PPS NAL units, header byte included.
    pub pps: Vec<Bytes>,

    /// An optional `AvccExtendedConfig`, present for every profile except
    /// Baseline (66), Main (77) and Extended (88).
    pub extended_config: Option<AvccExtendedConfig>,
}

/// The AVC (H.264) Extended Configuration.
/// ISO/IEC 14496-15:2022(E) - 5.3.2.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct AvccExtendedConfig {
    /// The `chroma_format_idc` as a u8.
    pub chroma_format_idc: u8,

    /// The bit depth of samples in the Luma arrays minus 8.
    pub bit_depth_luma_minus8: u8,

    /// The bit depth of the samples in the Chroma arrays minus 8.
    pub bit_depth_chroma_minus8: u8,

    /// Raw `sequenceParameterSetExtNALUnit`s.
    pub sequence_parameter_set_ext: Vec<Bytes>,
}

impl AVCDecoderConfigurationRecord {
    /// Builds the record for a single SPS/PPS pair.
    ///
    /// The profile, compatibility and level bytes are copied straight from the
    /// SPS (bytes 1..=3 of the NAL unit), the NAL length size is fixed at 4.
    pub fn from_parameter_sets(sps: Bytes, pps: Bytes, details: &SpsDetails) -> io::Result<Self> {
        if sps.len() < 4 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "sps too short for avcC"));
        }

        let profile_indication = sps[1];
        let extended_config = match profile_indication {
            66 | 77 | 88 => None,
            _ => Some(AvccExtendedConfig {
                chroma_format_idc: details.chroma_format_idc,
                bit_depth_luma_minus8: details.bit_depth.saturating_sub(8),
                bit_depth_chroma_minus8: details.bit_depth_chroma.saturating_sub(8),
                sequence_parameter_set_ext: Vec::new(),
            }),
        };

        Ok(Self {
            configuration_version: 1,
            profile_indication,
            profile_compatibility: sps[2],
            level_indication: sps[3],
            length_size_minus_one: 3,
            sps: vec![sps],
            pps: vec![pps],
            extended_config,
        })
    }

    /// Parses an AVCDecoderConfigurationRecord from a byte stream.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> io::Result<Self> {
        let configuration_version = reader.read_u8()?;
        let profile_indication = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_indication = reader.read_u8()?;
        let length_size_minus_one = reader.read_u8()? & 0b00000011;
        let num_of_sequence_parameter_sets = reader.read_u8()? & 0b00011111;

        let mut sps = Vec::with_capacity(num_of_sequence_parameter_sets as usize);
        for _ in 0..num_of_sequence_parameter_sets {
            sps.push(read_length_prefixed(reader)?);
        }

        let num_of_picture_parameter_sets = reader.read_u8()?;
        let mut pps = Vec::with_capacity(num_of_picture_parameter_sets as usize);
        for _ in 0..num_of_picture_parameter_sets {
            pps.push(read_length_prefixed(reader)?);
        }

        // Some muxers leave the extension out even for high profiles.
        let extended_config = match profile_indication {
            66 | 77 | 88 => None,
            _ if !reader.has_remaining() => None,
            _ => {
                let chroma_format_idc = reader.read_u8()? & 0b00000011;
                let bit_depth_luma_minus8 = reader.read_u8()? & 0b00000111;
                let bit_depth_chroma_minus8 = reader.read_u8()? & 0b00000111;
                let count = reader.read_u8()?;

                let mut sequence_parameter_set_ext = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    sequence_parameter_set_ext.push(read_length_prefixed(reader)?);
                }

                Some(AvccExtendedConfig {
                    chroma_format_idc,
                    bit_depth_luma_minus8,
                    bit_depth_chroma_minus8,
                    sequence_parameter_set_ext,
                })
            }
        };

        Ok(Self {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            length_size_minus_one,
            sps,
            pps,
            extended_config,
        })
    }

    /// Returns the total byte size of the AVCDecoderConfigurationRecord.
    pub fn size(&self) -> u64 {
        1 // configuration_version
        + 1 // avc_profile_indication
        + 1 // profile_compatibility
        + 1 // avc_level_indication
        + 1 // length_size_minus_one
        + 1 // num_of_sequence_parameter_sets
        + self.sps.iter().map(|sps| 2 + sps.len() as u64).sum::<u64>()
        + 1 // num_of_picture_parameter_sets
        + self.pps.iter().map(|pps| 2 + pps.len() as u64).sum::<u64>()
        + match &self.extended_config {
            Some(config) => {
                4 + config
                    .sequence_parameter_set_ext
                    .iter()
                    .map(|ext| 2 + ext.len() as u64)
                    .sum::<u64>()
            }
            None => 0,
        }
    }

    /// Builds the AVCDecoderConfigurationRecord into a byte stream.
    pub fn build<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut bit_writer = BitWriter::with_capacity(self.size() as usize);

        bit_writer.write_u8(self.configuration_version)?;
        bit_writer.write_u8(self.profile_indication)?;
        bit_writer.write_u8(self.profile_compatibility)?;
        bit_writer.write_u8(self.level_indication)?;
        bit_writer.write_bits(0b111111, 6)?;
        bit_writer.write_bits(self.length_size_minus_one as u64, 2)?;
        bit_writer.write_bits(0b111, 3)?;

        bit_writer.write_bits(self.sps.len() as u64, 5)?;
        for sps in &self.sps {
            bit_writer.write_u16::<BigEndian>(sps.len() as u16)?;
            bit_writer.write_all(sps)?;
        }

        bit_writer.write_u8(self.pps.len() as u8)?;
        for pps in &self.pps {
            bit_writer.write_u16::<BigEndian>(pps.len() as u16)?;
            bit_writer.write_all(pps)?;
        }

        if let Some(config) = &self.extended_config {
            bit_writer.write_bits(0b111111, 6)?;
            bit_writer.write_bits(config.chroma_format_idc as u64, 2)?;
            bit_writer.write_bits(0b11111, 5)?;
            bit_writer.write_bits(config.bit_depth_luma_minus8 as u64, 3)?;
            bit_writer.write_bits(0b11111, 5)?;
            bit_writer.write_bits(config.bit_depth_chroma_minus8 as u64, 3)?;

            bit_writer.write_u8(config.sequence_parameter_set_ext.len() as u8)?;
            for ext in &config.sequence_parameter_set_ext {
                bit_writer.write_u16::<BigEndian>(ext.len() as u16)?;
                bit_writer.write_all(ext)?;
            }
        }

        writer.write_all(&bit_writer.finish())
    }

    /// Builds the record into a fresh buffer.
    pub fn to_bytes(&self) -> io::Result<Bytes> {
        let mut buf = Vec::with_capacity(self.size() as usize);
        self.build(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

fn read_length_prefixed(reader: &mut io::Cursor<Bytes>) -> io::Result<Bytes> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    if reader.remaining() < len {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "parameter set exceeds record"));
    }

    let start = reader.position() as usize;
    let data = reader.get_ref().slice(start..start + len);
    reader.advance(len);
    Ok(data)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use bytes::Bytes;

    use crate::SpsDetails;
    use crate::config::AVCDecoderConfigurationRecord;
    use crate::sps::tests::baseline_sps;

    #[test]
    fn test_baseline_record_has_no_extension() {
        let sps = baseline_sps();
        let pps = Bytes::from_static(&[0x68, 0xCE, 0x3C, 0x80]);
        let details = SpsDetails::parse(&sps).unwrap();

        let config = AVCDecoderConfigurationRecord::from_parameter_sets(sps.clone(), pps.clone(), &details).unwrap();
        assert!(config.extended_config.is_none());

        let built = config.to_bytes().unwrap();
        assert_eq!(built[0], 0x01);
        assert_eq!(&built[1..4], &[66, 0xC0, 30]);
        assert_eq!(built[4], 0xFF);
        assert_eq!(built[5], 0xE1);
        assert_eq!(built.len(), 6 + 2 + sps.len() + 1 + 2 + pps.len());
        assert_eq!(&built[built.len() - 4..], &pps[..]);
        assert_eq!(config.size(), built.len() as u64);
    }

    #[test]
    fn test_high_profile_record_appends_extension() {
        let sps = Bytes::from_static(b"gd\0\x1f\xac\xd9A\xe0m\xf9\xe6\xa0  (\0\0\x03\0\x08\0\0\x03\x01\xe0x\xc1\x8c\xb0");
        let pps = Bytes::from_static(b"h\xeb\xe3\xcb\"\xc0");
        let details = SpsDetails::parse(&sps).unwrap();

        let config = AVCDecoderConfigurationRecord::from_parameter_sets(sps.clone(), pps, &details).unwrap();
        let built = config.to_bytes().unwrap();

        assert_eq!(&built[..6], &[0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE1]);
        assert_eq!(&built[built.len() - 4..], &[0xFD, 0xF8, 0xF8, 0x00]);

        let parsed = AVCDecoderConfigurationRecord::parse(&mut io::Cursor::new(built)).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_rejects_overlong_parameter_set() {
        let data = Bytes::from_static(&[0x01, 0x42, 0xC0, 0x1E, 0xFF, 0xE1, 0x00, 0x10, 0x67]);
        let err = AVCDecoderConfigurationRecord::parse(&mut io::Cursor::new(data)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
