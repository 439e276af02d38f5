use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use bytes_util::{BitReader, BitWriter};

use crate::{ConstantFrameRate, NALUnitType, ParallelismType, PpsDetails, ProfileCompatibilityFlags, SpsDetails, VpsDetails};

/// HEVC Decoder Configuration Record.
///
/// ISO/IEC 14496-15 - 8.3.2.1
#[derive(Debug, Clone, PartialEq)]
pub struct HEVCDecoderConfigurationRecord {
    /// `general_profile_space` from the SPS profile_tier_level.
    pub general_profile_space: u8,
    /// `general_tier_flag` from the SPS profile_tier_level.
    pub general_tier_flag: bool,
    /// `general_profile_idc` from the SPS profile_tier_level.
    pub general_profile_idc: u8,
    /// `general_profile_compatibility_flag[32]` from the SPS profile_tier_level.
    pub general_profile_compatibility_flags: ProfileCompatibilityFlags,
    /// This is stored as a 48-bit (6 bytes) unsigned integer.
    /// Therefore only the first 48 bits of this value are used.
    pub general_constraint_indicator_flags: u64,
    /// `general_level_idc` from the SPS profile_tier_level.
    pub general_level_idc: u8,
    /// `min_spatial_segmentation_idc` from the SPS VUI bitstream restriction.
    pub min_spatial_segmentation_idc: u16,
    /// See [`ParallelismType`] for more info.
    pub parallelism_type: ParallelismType,
    /// `chroma_format_idc` from the SPS.
    pub chroma_format_idc: u8,
    /// `bit_depth_luma_minus8` from the SPS.
    pub bit_depth_luma_minus8: u8,
    /// `bit_depth_chroma_minus8` from the SPS.
    pub bit_depth_chroma_minus8: u8,
    /// Gives the average frame rate in units of frames/(256 seconds), for the stream to
    /// which this configuration record applies.
    ///
    /// Value 0 indicates an unspecified average frame rate.
    pub avg_frame_rate: u16,
    /// See [`ConstantFrameRate`] for more info.
    pub constant_frame_rate: ConstantFrameRate,
    /// Count of temporal layers, 0 when unknown, 1 when not scalable.
    pub num_temporal_layers: u8,
    /// Equal to `true` indicates that all SPSs that are activated when the stream to which
    /// this configuration record applies is decoded have `sps_temporal_id_nesting_flag`
    /// equal to `true` and temporal sub-layer up-switching to any higher temporal layer
    /// can be performed at any sample.
    pub temporal_id_nested: bool,
    /// This value plus 1 indicates the length in bytes of the `NALUnitLength` field in an
    /// HEVC video sample in the stream to which this configuration record applies.
    ///
    /// The value of this field is one of 0, 1, or 3
    /// corresponding to a length encoded with 1, 2, or 4 bytes, respectively.
    pub length_size_minus_one: u8,
    /// [`NaluArray`]s in that are part of this configuration record.
    pub arrays: Vec<NaluArray>,
}

/// Nalu Array Structure
///
/// ISO/IEC 14496-15 - 8.3.2.1
#[derive(Debug, Clone, PartialEq)]
pub struct NaluArray {
    /// When equal to `true` indicates that all NAL units of the given type are in the
    /// following array and none are in the stream.
    pub array_completeness: bool,
    /// Type of the NAL units in the array: VPS, SPS, PPS, prefix SEI or suffix SEI.
    pub nal_unit_type: NALUnitType,
    /// The NAL units, two byte header included.
    pub nalus: Vec<Bytes>,
}

impl HEVCDecoderConfigurationRecord {
    /// Builds the record for a stream whose parameter sets are all carried
    /// in the record itself.
    pub fn from_parameter_sets(vps: Bytes, sps: Bytes, pps: Bytes) -> io::Result<Self> {
        let vps_details = VpsDetails::parse(&vps)?;
        let sps_details = SpsDetails::parse(&sps)?;
        let pps_details = PpsDetails::parse(&pps)?;

        let array = |nal_unit_type, nalu| NaluArray {
            array_completeness: true,
            nal_unit_type,
            nalus: vec![nalu],
        };

        Ok(Self {
            general_profile_space: sps_details.profile.profile_space,
            general_tier_flag: sps_details.profile.tier_flag,
            general_profile_idc: sps_details.profile.profile_idc,
            general_profile_compatibility_flags: sps_details.profile.compatibility_flags,
            general_constraint_indicator_flags: sps_details.profile.constraint_indicator_flags,
            general_level_idc: sps_details.profile.level_idc,
            min_spatial_segmentation_idc: sps_details.min_spatial_segmentation_idc,
            parallelism_type: pps_details.parallelism_type(),
            chroma_format_idc: sps_details.chroma_format_idc,
            bit_depth_luma_minus8: sps_details.bit_depth_luma - 8,
            bit_depth_chroma_minus8: sps_details.bit_depth_chroma - 8,
            avg_frame_rate: 0,
            constant_frame_rate: ConstantFrameRate::Unknown,
            num_temporal_layers: vps_details.num_temporal_layers,
            temporal_id_nested: vps_details.temporal_id_nested,
            length_size_minus_one: 3,
            arrays: vec![
                array(NALUnitType::VpsNut, vps),
                array(NALUnitType::SpsNut, sps),
                array(NALUnitType::PpsNut, pps),
            ],
        })
    }

    /// Parses an [`HEVCDecoderConfigurationRecord`] from an `hvcC` payload.
    pub fn parse(data: &Bytes) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(data);

        // This parser only supports version 1
        let configuration_version = bit_reader.read_u8()?;
        if configuration_version != 1 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid configuration version"));
        }

        let general_profile_space = bit_reader.read_bits(2)? as u8;
        let general_tier_flag = bit_reader.read_bit()?;
        let general_profile_idc = bit_reader.read_bits(5)? as u8;
        let general_profile_compatibility_flags = ProfileCompatibilityFlags::from_bits_retain(bit_reader.read_bits(32)?);
        let general_constraint_indicator_flags = bit_reader.read_bits_u64(48)?;
        let general_level_idc = bit_reader.read_u8()?;

        bit_reader.read_bits(4)?; // reserved_4bits
        let min_spatial_segmentation_idc = bit_reader.read_bits(12)? as u16;

        bit_reader.read_bits(6)?; // reserved_6bits
        let parallelism_type = bit_reader.read_bits(2)? as u8;

        bit_reader.read_bits(6)?; // reserved_6bits
        let chroma_format_idc = bit_reader.read_bits(2)? as u8;

        bit_reader.read_bits(5)?; // reserved_5bits
        let bit_depth_luma_minus8 = bit_reader.read_bits(3)? as u8;

        bit_reader.read_bits(5)?; // reserved_5bits
        let bit_depth_chroma_minus8 = bit_reader.read_bits(3)? as u8;

        let avg_frame_rate = bit_reader.read_bits(16)? as u16;
        let constant_frame_rate = bit_reader.read_bits(2)? as u8;
        let num_temporal_layers = bit_reader.read_bits(3)? as u8;
        let temporal_id_nested = bit_reader.read_bit()?;
        let length_size_minus_one = bit_reader.read_bits(2)? as u8;

        if length_size_minus_one == 2 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "length_size_minus_one must be 0, 1, or 3"));
        }

        let num_of_arrays = bit_reader.read_u8()?;

        let mut arrays = Vec::with_capacity(num_of_arrays as usize);

        for _ in 0..num_of_arrays {
            let array_completeness = bit_reader.read_bit()?;
            bit_reader.read_bits(1)?; // reserved

            let nal_unit_type = NALUnitType::from(bit_reader.read_bits(6)? as u8);
            if !matches!(
                nal_unit_type,
                NALUnitType::VpsNut | NALUnitType::SpsNut | NALUnitType::PpsNut | NALUnitType::PrefixSeiNut | NALUnitType::SuffixSeiNut
            ) {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid nal_unit_type"));
            }

            let num_nalus = bit_reader.read_bits(16)?;
            let mut nalus = Vec::with_capacity(num_nalus as usize);
            for _ in 0..num_nalus {
                let nal_unit_length = bit_reader.read_bits(16)? as usize;
                let start = bit_reader.byte_offset();
                bit_reader.skip_bits(nal_unit_length * 8)?;
                nalus.push(data.slice(start..start + nal_unit_length));
            }

            arrays.push(NaluArray {
                array_completeness,
                nal_unit_type,
                nalus,
            });
        }

        Ok(HEVCDecoderConfigurationRecord {
            general_profile_space,
            general_tier_flag,
            general_profile_idc,
            general_profile_compatibility_flags,
            general_constraint_indicator_flags,
            general_level_idc,
            min_spatial_segmentation_idc,
            parallelism_type: ParallelismType::from(parallelism_type),
            chroma_format_idc,
            bit_depth_luma_minus8,
            bit_depth_chroma_minus8,
            avg_frame_rate,
            constant_frame_rate: ConstantFrameRate::from(constant_frame_rate),
            num_temporal_layers,
            temporal_id_nested,
            length_size_minus_one,
            arrays,
        })
    }

    /// Returns the total byte size of the [`HEVCDecoderConfigurationRecord`].
    pub fn size(&self) -> u64 {
        1 // configuration_version
        + 1 // general_profile_space, general_tier_flag, general_profile_idc
        + 4 // general_profile_compatibility_flags
        + 6 // general_constraint_indicator_flags
        + 1 // general_level_idc
        + 2 // reserved_4bits, min_spatial_segmentation_idc
        + 1 // reserved_6bits, parallelism_type
        + 1 // reserved_6bits, chroma_format_idc
        + 1 // reserved_5bits, bit_depth_luma_minus8
        + 1 // reserved_5bits, bit_depth_chroma_minus8
        + 2 // avg_frame_rate
        + 1 // constant_frame_rate, num_temporal_layers, temporal_id_nested, length_size_minus_one
        + 1 // num_of_arrays
        + self.arrays.iter().map(|array| {
            1 // array_completeness, reserved, nal_unit_type
            + 2 // num_nalus
            + array.nalus.iter().map(|nalu| {
                2 // nal_unit_length
                + nalu.len() as u64 // nal_unit
            }).sum::<u64>()
        }).sum::<u64>()
    }

    /// Serializes the [`HEVCDecoderConfigurationRecord`] into `writer`.
    pub fn build<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut bit_writer = BitWriter::with_capacity(self.size() as usize);

        // This builder only supports version 1
        bit_writer.write_u8(1)?; // configuration_version
        bit_writer.write_bits(self.general_profile_space as u64, 2)?;
        bit_writer.write_bit(self.general_tier_flag)?;
        bit_writer.write_bits(self.general_profile_idc as u64, 5)?;
        bit_writer.write_u32::<BigEndian>(self.general_profile_compatibility_flags.bits())?;
        bit_writer.write_u48::<BigEndian>(self.general_constraint_indicator_flags)?;
        bit_writer.write_u8(self.general_level_idc)?;

        bit_writer.write_bits(0b1111, 4)?; // reserved_4bits
        bit_writer.write_bits(self.min_spatial_segmentation_idc as u64, 12)?;

        bit_writer.write_bits(0b111111, 6)?; // reserved_6bits
        bit_writer.write_bits(self.parallelism_type as u64, 2)?;

        bit_writer.write_bits(0b111111, 6)?; // reserved_6bits
        bit_writer.write_bits(self.chroma_format_idc as u64, 2)?;

        bit_writer.write_bits(0b11111, 5)?; // reserved_5bits
        bit_writer.write_bits(self.bit_depth_luma_minus8 as u64, 3)?;

        bit_writer.write_bits(0b11111, 5)?; // reserved_5bits
        bit_writer.write_bits(self.bit_depth_chroma_minus8 as u64, 3)?;

        bit_writer.write_u16::<BigEndian>(self.avg_frame_rate)?;
        bit_writer.write_bits(self.constant_frame_rate as u64, 2)?;

        bit_writer.write_bits(self.num_temporal_layers as u64, 3)?;
        bit_writer.write_bit(self.temporal_id_nested)?;
        bit_writer.write_bits(self.length_size_minus_one as u64, 2)?;

        bit_writer.write_u8(self.arrays.len() as u8)?;
        for array in &self.arrays {
            bit_writer.write_bit(array.array_completeness)?;
            bit_writer.write_bits(0b0, 1)?; // reserved
            bit_writer.write_bits(array.nal_unit_type.as_u8() as u64, 6)?;

            bit_writer.write_u16::<BigEndian>(array.nalus.len() as u16)?;

            for nalu in &array.nalus {
                bit_writer.write_u16::<BigEndian>(nalu.len() as u16)?;
                bit_writer.write_all(nalu)?;
            }
        }

        writer.write_all(&bit_writer.finish())
    }

    /// Serializes the record into a fresh buffer.
    pub fn to_bytes(&self) -> io::Result<Bytes> {
        let mut out = Vec::with_capacity(self.size() as usize);
        self.build(&mut out)?;
        Ok(Bytes::from(out))
    }
}
