use std::io;

use bytes::Bytes;
use bytes_util::{BitReader, ebsp_to_rbsp};
use expgolomb::BitReaderExpGolombExt;

use crate::ParallelismType;

fn rbsp_reader_input(nalu: &Bytes, what: &'static str) -> io::Result<Bytes> {
    let rbsp = ebsp_to_rbsp(nalu);
    if rbsp.len() < 3 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, what));
    }
    Ok(rbsp.slice(2..))
}

/// Video Parameter Set fields used by the `hvcC` record.
///
/// ISO/IEC 23008-2 - 7.3.2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VpsDetails {
    /// `vps_max_sub_layers_minus1 + 1`
    pub num_temporal_layers: u8,
    /// `vps_temporal_id_nesting_flag`
    pub temporal_id_nested: bool,
}

impl VpsDetails {
    /// Parses a VPS NAL unit, header included.
    pub fn parse(nalu: &Bytes) -> io::Result<Self> {
        let rbsp = rbsp_reader_input(nalu, "vps too short")?;
        let mut reader = BitReader::new(&rbsp);

        reader.read_bits(4)?; // vps_video_parameter_set_id
        reader.read_bit()?; // vps_base_layer_internal_flag
        reader.read_bit()?; // vps_base_layer_available_flag
        reader.read_bits(6)?; // vps_max_layers_minus1
        let max_sub_layers_minus1 = reader.read_bits(3)? as u8;
        let temporal_id_nested = reader.read_bit()?;

        Ok(Self {
            num_temporal_layers: max_sub_layers_minus1 + 1,
            temporal_id_nested,
        })
    }
}

/// Picture Parameter Set tool flags that decide the parallelism type.
///
/// ISO/IEC 23008-2 - 7.3.2.3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpsDetails {
    /// `tiles_enabled_flag`
    pub tiles_enabled: bool,
    /// `entropy_coding_sync_enabled_flag`
    pub entropy_coding_sync_enabled: bool,
}

impl PpsDetails {
    /// Parses a PPS NAL unit, header included.
    pub fn parse(nalu: &Bytes) -> io::Result<Self> {
        let rbsp = rbsp_reader_input(nalu, "pps too short")?;
        let mut reader = BitReader::new(&rbsp);

        reader.read_exp_golomb()?; // pps_pic_parameter_set_id
        reader.read_exp_golomb()?; // pps_seq_parameter_set_id
        reader.read_bit()?; // dependent_slice_segments_enabled_flag
        reader.read_bit()?; // output_flag_present_flag
        reader.read_bits(3)?; // num_extra_slice_header_bits
        reader.read_bit()?; // sign_data_hiding_enabled_flag
        reader.read_bit()?; // cabac_init_present_flag
        reader.read_exp_golomb()?; // num_ref_idx_l0_default_active_minus1
        reader.read_exp_golomb()?; // num_ref_idx_l1_default_active_minus1
        reader.read_signed_exp_golomb()?; // init_qp_minus26
        reader.read_bit()?; // constrained_intra_pred_flag
        reader.read_bit()?; // transform_skip_enabled_flag
        if reader.read_bit()? {
            reader.read_exp_golomb()?; // diff_cu_qp_delta_depth
        }
        reader.read_signed_exp_golomb()?; // pps_cb_qp_offset
        reader.read_signed_exp_golomb()?; // pps_cr_qp_offset
        reader.read_bit()?; // pps_slice_chroma_qp_offsets_present_flag
        reader.read_bit()?; // weighted_pred_flag
        reader.read_bit()?; // weighted_bipred_flag
        reader.read_bit()?; // transquant_bypass_enabled_flag

        Ok(Self {
            tiles_enabled: reader.read_bit()?,
            entropy_coding_sync_enabled: reader.read_bit()?,
        })
    }

    /// Parallelism type advertised in `hvcC`.
    pub const fn parallelism_type(&self) -> ParallelismType {
        ParallelismType::from_pps_flags(self.tiles_enabled, self.entropy_coding_sync_enabled)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use super::*;

    pub(crate) const VPS: &[u8] = b"@\x01\x0c\x01\xff\xff\x01@\0\0\x03\0\x90\0\0\x03\0\0\x03\0\x99\x95@\x90";
    pub(crate) const PPS: &[u8] = b"D\x01\xc0\x93|\x0c\xc9";

    #[test]
    fn test_parse_vps() {
        let vps = VpsDetails::parse(&Bytes::from_static(VPS)).unwrap();
        assert_eq!(vps.num_temporal_layers, 1);
        assert!(vps.temporal_id_nested);
    }

    #[test]
    fn test_parse_pps() {
        let pps = PpsDetails::parse(&Bytes::from_static(PPS)).unwrap();
        assert!(!pps.tiles_enabled);
        assert!(!pps.entropy_coding_sync_enabled);
        assert_eq!(pps.parallelism_type(), ParallelismType::Slice);
    }

    #[test]
    fn test_parallelism_from_flags() {
        assert_eq!(ParallelismType::from_pps_flags(true, true), ParallelismType::MixedOrUnknown);
        assert_eq!(ParallelismType::from_pps_flags(false, true), ParallelismType::EntropyCodingSync);
        assert_eq!(ParallelismType::from_pps_flags(true, false), ParallelismType::Tile);
    }

    #[test]
    fn test_short_pps() {
        assert!(PpsDetails::parse(&Bytes::from_static(b"D\x01")).is_err());
    }
}
