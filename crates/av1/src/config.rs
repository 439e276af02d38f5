use std::io;

use bytes::Bytes;
use bytes_util::{BitReader, BitWriter};

use crate::seq::SequenceHeader;

#[derive(Debug, Clone, PartialEq)]
/// AV1 Codec Configuration Record
///
/// <https://aomediacodec.github.io/av1-isobmff/#av1codecconfigurationbox-syntax>
pub struct AV1CodecConfigurationRecord {
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf).
    ///
    /// 3 bits
    pub seq_profile: u8,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf).
    ///
    /// 5 bits
    pub seq_level_idx_0: u8,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf), when present.
    /// If they are not present, they will be coded using the value inferred by the semantics.
    ///
    /// 1 bit
    pub seq_tier_0: bool,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf).
    ///
    /// 1 bit
    pub high_bitdepth: bool,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf), when present.
    /// If they are not present, they will be coded using the value inferred by the semantics.
    ///
    /// 1 bit
    pub twelve_bit: bool,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf), when present.
    /// If they are not present, they will be coded using the value inferred by the semantics.
    ///
    /// 1 bit
    pub monochrome: bool,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf), when present.
    /// If they are not present, they will be coded using the value inferred by the semantics.
    ///
    /// 1 bit
    pub chroma_subsampling_x: bool,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf), when present.
    /// If they are not present, they will be coded using the value inferred by the semantics.
    ///
    /// 1 bit
    pub chroma_subsampling_y: bool,
    /// This field shall be coded according to the semantics defined in [AV1](https://aomediacodec.github.io/av1-spec/av1-spec.pdf), when present.
    /// If they are not present, they will be coded using the value inferred by the semantics.
    ///
    /// 2 bits
    pub chroma_sample_position: u8,
    /// The value of this syntax element indicates the presence or absence of high dynamic range (HDR) and/or
    /// wide color gamut (WCG) video components in the associated PID according to the table below.
    ///
    /// | HDR/WCG IDC | Description   |
    /// |-------------|---------------|
    /// | 0           | SDR           |
    /// | 1           | WCG only      |
    /// | 2           | HDR and WCG   |
    /// | 3           | No indication |
    ///
    /// 2 bits
    ///
    /// From a newer spec: <https://aomediacodec.github.io/av1-mpeg2-ts/#av1-video-descriptor>
    pub hdr_wcg_idc: u8,
    /// Ignored for [MPEG-2 TS](https://www.iso.org/standard/83239.html) use,
    /// included only to aid conversion to/from ISOBMFF.
    ///
    /// 4 bits
    pub initial_presentation_delay_minus_one: Option<u8>,
    /// Zero or more OBUs. Refer to the linked specification for details.
    ///
    /// 8 bits
    pub config_obu: Bytes,
}

impl AV1CodecConfigurationRecord {
    /// Builds the record from a parsed sequence header and the sequence
    /// header OBU itself (low overhead format, size field set), which is
    /// carried as `configOBUs`.
    pub fn from_sequence_header(seq: &SequenceHeader, seq_header_obu: Bytes) -> Self {
        let color = &seq.color;
        AV1CodecConfigurationRecord {
            seq_profile: seq.seq_profile,
            seq_level_idx_0: seq.seq_level_idx_0(),
            seq_tier_0: seq.seq_tier_0(),
            high_bitdepth: color.bit_depth > 8,
            twelve_bit: color.bit_depth == 12,
            monochrome: color.mono_chrome,
            chroma_subsampling_x: color.subsampling_x,
            chroma_subsampling_y: color.subsampling_y,
            chroma_sample_position: color.chroma_sample_position,
            hdr_wcg_idc: 0,
            initial_presentation_delay_minus_one: None,
            config_obu: seq_header_obu,
        }
    }

    /// Parses an `av1C` payload.
    pub fn parse(data: &Bytes) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(data);

        let marker = bit_reader.read_bit()?;
        if !marker {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "marker is not set"));
        }

        let version = bit_reader.read_bits(7)? as u8;
        if version != 1 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "version is not 1"));
        }

        let seq_profile = bit_reader.read_bits(3)? as u8;
        let seq_level_idx_0 = bit_reader.read_bits(5)? as u8;

        let seq_tier_0 = bit_reader.read_bit()?;
        let high_bitdepth = bit_reader.read_bit()?;
        let twelve_bit = bit_reader.read_bit()?;
        let monochrome = bit_reader.read_bit()?;
        let chroma_subsampling_x = bit_reader.read_bit()?;
        let chroma_subsampling_y = bit_reader.read_bit()?;
        let chroma_sample_position = bit_reader.read_bits(2)? as u8;

        // This is from the https://aomediacodec.github.io/av1-mpeg2-ts/#av1-video-descriptor spec
        // The spec from https://aomediacodec.github.io/av1-isobmff/#av1codecconfigurationbox-section is old and contains 3 bits reserved
        // The newer spec takes 2 of those reserved bits to represent the HDR WCG IDC
        // Leaving 1 bit for future use
        let hdr_wcg_idc = bit_reader.read_bits(2)? as u8;

        bit_reader.skip_bits(1)?; // reserved 1 bits

        let initial_presentation_delay_minus_one = if bit_reader.read_bit()? {
            Some(bit_reader.read_bits(4)? as u8)
        } else {
            bit_reader.skip_bits(4)?; // reserved 4 bits
            None
        };

        if !bit_reader.is_aligned() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Bit reader is not aligned"));
        }

        let config_obu = data.slice(bit_reader.byte_offset()..);

        Ok(AV1CodecConfigurationRecord {
            seq_profile,
            seq_level_idx_0,
            seq_tier_0,
            high_bitdepth,
            twelve_bit,
            monochrome,
            chroma_subsampling_x,
            chroma_subsampling_y,
            chroma_sample_position,
            hdr_wcg_idc,
            initial_presentation_delay_minus_one,
            config_obu,
        })
    }

    /// Returns the size of the AV1 Codec Configuration Record.
    pub fn size(&self) -> u64 {
        1 // marker, version
        + 1 // seq_profile, seq_level_idx_0
        + 1 // seq_tier_0, high_bitdepth, twelve_bit, monochrome, chroma_subsampling_x, chroma_subsampling_y, chroma_sample_position
        + 1 // reserved, initial_presentation_delay_present, initial_presentation_delay_minus_one/reserved
        + self.config_obu.len() as u64
    }

    /// Serializes the record into `writer`.
    pub fn build<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        let mut bit_writer = BitWriter::with_capacity(self.size() as usize);

        bit_writer.write_bit(true)?; // marker
        bit_writer.write_bits(1, 7)?; // version

        bit_writer.write_bits(self.seq_profile as u64, 3)?;
        bit_writer.write_bits(self.seq_level_idx_0 as u64, 5)?;

        bit_writer.write_bit(self.seq_tier_0)?;
        bit_writer.write_bit(self.high_bitdepth)?;
        bit_writer.write_bit(self.twelve_bit)?;
        bit_writer.write_bit(self.monochrome)?;
        bit_writer.write_bit(self.chroma_subsampling_x)?;
        bit_writer.write_bit(self.chroma_subsampling_y)?;
        bit_writer.write_bits(self.chroma_sample_position as u64, 2)?;

        bit_writer.write_bits(self.hdr_wcg_idc as u64, 2)?;
        bit_writer.write_bit(false)?; // reserved 1 bit

        if let Some(initial_presentation_delay_minus_one) = self.initial_presentation_delay_minus_one {
            bit_writer.write_bit(true)?;
            bit_writer.write_bits(initial_presentation_delay_minus_one as u64, 4)?;
        } else {
            bit_writer.write_bit(false)?;
            bit_writer.write_bits(0, 4)?; // reserved 4 bits
        }

        writer.write_all(&bit_writer.finish())?;
        writer.write_all(&self.config_obu)
    }

    /// Serializes the record into a fresh buffer.
    pub fn to_bytes(&self) -> io::Result<Bytes> {
        let mut out = Vec::with_capacity(self.size() as usize);
        self.build(&mut out)?;
        Ok(Bytes::from(out))
    }
}
