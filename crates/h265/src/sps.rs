use std::io;

use bytes::Bytes;
use bytes_util::{BitReader, ebsp_to_rbsp};
use expgolomb::BitReaderExpGolombExt;

use crate::ProfileCompatibilityFlags;

/// `general_*` fields of `profile_tier_level()`.
///
/// ISO/IEC 23008-2 - 7.3.3
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralProfile {
    /// `general_profile_space`
    pub profile_space: u8,
    /// `general_tier_flag`
    pub tier_flag: bool,
    /// `general_profile_idc`
    pub profile_idc: u8,
    /// `general_profile_compatibility_flag[32]`
    pub compatibility_flags: ProfileCompatibilityFlags,
    /// The 48 bits following the compatibility flags.
    pub constraint_indicator_flags: u64,
    /// `general_level_idc`
    pub level_idc: u8,
}

impl GeneralProfile {
    fn parse(reader: &mut BitReader<'_>, max_sub_layers_minus1: u8) -> io::Result<Self> {
        let profile = Self {
            profile_space: reader.read_bits(2)? as u8,
            tier_flag: reader.read_bit()?,
            profile_idc: reader.read_bits(5)? as u8,
            compatibility_flags: ProfileCompatibilityFlags::from_bits_retain(reader.read_bits(32)?),
            constraint_indicator_flags: reader.read_bits_u64(48)?,
            level_idc: reader.read_u8()?,
        };

        let mut sub_layer_flags = Vec::with_capacity(max_sub_layers_minus1 as usize);
        for _ in 0..max_sub_layers_minus1 {
            let profile_present = reader.read_bit()?;
            let level_present = reader.read_bit()?;
            sub_layer_flags.push((profile_present, level_present));
        }
        if max_sub_layers_minus1 > 0 {
            reader.skip_bits(2 * (8 - max_sub_layers_minus1 as usize))?; // reserved_zero_2bits
        }
        for (profile_present, level_present) in sub_layer_flags {
            if profile_present {
                reader.skip_bits(88)?;
            }
            if level_present {
                reader.skip_bits(8)?;
            }
        }

        Ok(profile)
    }

    /// RFC 6381 / ISO/IEC 14496-15 E.3 codec string, e.g. `hvc1.1.6.L93.B0`.
    pub fn codec_string(&self) -> String {
        let space = match self.profile_space {
            1 => "A",
            2 => "B",
            3 => "C",
            _ => "",
        };
        let tier = if self.tier_flag { 'H' } else { 'L' };

        let mut out = format!(
            "hvc1.{space}{}.{:X}.{tier}{}",
            self.profile_idc,
            self.compatibility_flags.reversed_bits(),
            self.level_idc
        );

        let constraints = self.constraint_indicator_flags.to_be_bytes();
        let constraints = &constraints[2..];
        let used = constraints.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        for byte in &constraints[..used] {
            out.push_str(&format!(".{byte:X}"));
        }

        out
    }
}

/// The subset of a Sequence Parameter Set needed to describe a video track.
///
/// ISO/IEC 23008-2 - 7.3.2.2 and Annex E (VUI).
#[derive(Debug, Clone, PartialEq)]
pub struct SpsDetails {
    /// `sps_max_sub_layers_minus1`
    pub max_sub_layers_minus1: u8,
    /// `sps_temporal_id_nesting_flag`
    pub temporal_id_nesting: bool,
    /// General profile, tier and level.
    pub profile: GeneralProfile,
    /// `chroma_format_idc`
    pub chroma_format_idc: u8,
    /// `bit_depth_luma_minus8 + 8`
    pub bit_depth_luma: u8,
    /// `bit_depth_chroma_minus8 + 8`
    pub bit_depth_chroma: u8,
    /// Width after the conformance window.
    pub width: u32,
    /// Height after the conformance window.
    pub height: u32,
    /// Sample aspect ratio as `(width, height)`, 1:1 when absent.
    pub sar: (u32, u32),
    /// `(vui_time_scale, vui_num_units_in_tick)` when VUI timing info is present.
    pub frame_rate: Option<(u32, u32)>,
    /// `min_spatial_segmentation_idc` from the bitstream restriction, 0 when absent.
    pub min_spatial_segmentation_idc: u16,
}

/// Table E-1
const SAR_TABLE: [(u32, u32); 17] = [
    (1, 1),
    (1, 1),
    (12, 11),
    (10, 11),
    (16, 11),
    (40, 33),
    (24, 11),
    (20, 11),
    (32, 11),
    (80, 33),
    (18, 11),
    (15, 11),
    (64, 33),
    (160, 99),
    (4, 3),
    (3, 2),
    (2, 1),
];

const EXTENDED_SAR: u8 = 255;

impl SpsDetails {
    /// Parses an SPS NAL unit (two byte header included, emulation prevention
    /// bytes still in place).
    pub fn parse(nalu: &Bytes) -> io::Result<Self> {
        let rbsp = ebsp_to_rbsp(nalu);
        if rbsp.len() < 3 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "sps too short"));
        }

        let mut reader = BitReader::new(&rbsp[2..]);

        reader.read_bits(4)?; // sps_video_parameter_set_id
        let max_sub_layers_minus1 = reader.read_bits(3)? as u8;
        let temporal_id_nesting = reader.read_bit()?;
        let profile = GeneralProfile::parse(&mut reader, max_sub_layers_minus1)?;
        reader.read_exp_golomb()?; // sps_seq_parameter_set_id

        let chroma_format_idc = reader.read_exp_golomb()?;
        if chroma_format_idc > 3 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "chroma_format_idc out of range"));
        }
        let separate_colour_plane = chroma_format_idc == 3 && reader.read_bit()?;

        let pic_width = reader.read_exp_golomb()? as u64;
        let pic_height = reader.read_exp_golomb()? as u64;

        let (mut conf_left, mut conf_right, mut conf_top, mut conf_bottom) = (0u64, 0u64, 0u64, 0u64);
        if reader.read_bit()? {
            conf_left = reader.read_exp_golomb()? as u64;
            conf_right = reader.read_exp_golomb()? as u64;
            conf_top = reader.read_exp_golomb()? as u64;
            conf_bottom = reader.read_exp_golomb()? as u64;
        }

        let bit_depth_luma_minus8 = reader.read_exp_golomb()?;
        let bit_depth_chroma_minus8 = reader.read_exp_golomb()?;
        if bit_depth_luma_minus8 > 8 || bit_depth_chroma_minus8 > 8 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bit depth out of range"));
        }
        let log2_max_pic_order_cnt_lsb = reader.read_exp_golomb()? + 4;
        if log2_max_pic_order_cnt_lsb > 16 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "log2_max_pic_order_cnt_lsb out of range"));
        }

        let sub_layer_ordering_info_present = reader.read_bit()?;
        let first = if sub_layer_ordering_info_present { 0 } else { max_sub_layers_minus1 };
        for _ in first..=max_sub_layers_minus1 {
            reader.read_exp_golomb()?; // sps_max_dec_pic_buffering_minus1
            reader.read_exp_golomb()?; // sps_max_num_reorder_pics
            reader.read_exp_golomb()?; // sps_max_latency_increase_plus1
        }

        reader.read_exp_golomb()?; // log2_min_luma_coding_block_size_minus3
        reader.read_exp_golomb()?; // log2_diff_max_min_luma_coding_block_size
        reader.read_exp_golomb()?; // log2_min_luma_transform_block_size_minus2
        reader.read_exp_golomb()?; // log2_diff_max_min_luma_transform_block_size
        reader.read_exp_golomb()?; // max_transform_hierarchy_depth_inter
        reader.read_exp_golomb()?; // max_transform_hierarchy_depth_intra

        if reader.read_bit()? && reader.read_bit()? {
            skip_scaling_list_data(&mut reader)?;
        }

        reader.read_bit()?; // amp_enabled_flag
        reader.read_bit()?; // sample_adaptive_offset_enabled_flag
        if reader.read_bit()? {
            reader.read_bits(8)?; // pcm_sample_bit_depth_luma_minus1, pcm_sample_bit_depth_chroma_minus1
            reader.read_exp_golomb()?; // log2_min_pcm_luma_coding_block_size_minus3
            reader.read_exp_golomb()?; // log2_diff_max_min_pcm_luma_coding_block_size
            reader.read_bit()?; // pcm_loop_filter_disabled_flag
        }

        skip_short_term_ref_pic_sets(&mut reader)?;

        if reader.read_bit()? {
            let num_long_term_ref_pics = reader.read_exp_golomb()?;
            for _ in 0..num_long_term_ref_pics {
                reader.skip_bits(log2_max_pic_order_cnt_lsb as usize + 1)?; // lt_ref_pic_poc_lsb_sps, used_by_curr_pic_lt_sps_flag
            }
        }

        reader.read_bit()?; // sps_temporal_mvp_enabled_flag
        reader.read_bit()?; // strong_intra_smoothing_enabled_flag

        let mut sar = (1, 1);
        let mut frame_rate = None;
        let mut min_spatial_segmentation_idc = 0;

        if reader.read_bit()? {
            if reader.read_bit()? {
                let aspect_ratio_idc = reader.read_u8()?;
                if aspect_ratio_idc == EXTENDED_SAR {
                    sar = (reader.read_bits(16)?, reader.read_bits(16)?);
                } else if let Some(&entry) = SAR_TABLE.get(aspect_ratio_idc as usize) {
                    sar = entry;
                }
            }

            if reader.read_bit()? {
                reader.read_bit()?; // overscan_appropriate_flag
            }

            if reader.read_bit()? {
                reader.read_bits(4)?; // video_format, video_full_range_flag
                if reader.read_bit()? {
                    reader.read_bits(24)?; // colour_primaries, transfer_characteristics, matrix_coeffs
                }
            }

            if reader.read_bit()? {
                reader.read_exp_golomb()?; // chroma_sample_loc_type_top_field
                reader.read_exp_golomb()?; // chroma_sample_loc_type_bottom_field
            }

            reader.read_bits(3)?; // neutral_chroma_indication_flag, field_seq_flag, frame_field_info_present_flag

            if reader.read_bit()? {
                reader.read_exp_golomb()?; // def_disp_win_left_offset
                reader.read_exp_golomb()?; // def_disp_win_right_offset
                reader.read_exp_golomb()?; // def_disp_win_top_offset
                reader.read_exp_golomb()?; // def_disp_win_bottom_offset
            }

            if reader.read_bit()? {
                let num_units_in_tick = reader.read_bits(32)?;
                let time_scale = reader.read_bits(32)?;
                if num_units_in_tick > 0 && time_scale > 0 {
                    frame_rate = Some((time_scale, num_units_in_tick));
                }
                if reader.read_bit()? {
                    reader.read_exp_golomb()?; // vui_num_ticks_poc_diff_one_minus1
                }
                if reader.read_bit()? {
                    skip_hrd_parameters(&mut reader, max_sub_layers_minus1)?;
                }
            }

            if reader.read_bit()? {
                reader.read_bits(3)?; // tiles_fixed_structure_flag, motion_vectors_over_pic_boundaries_flag, restricted_ref_pic_lists_flag
                min_spatial_segmentation_idc = reader.read_exp_golomb()?.min(0x0FFF) as u16;
            }
        }

        if sar.0 == 0 || sar.1 == 0 {
            sar = (1, 1);
        }

        let (sub_width, sub_height) = match (chroma_format_idc, separate_colour_plane) {
            (1, false) => (2, 2),
            (2, false) => (2, 1),
            _ => (1, 1),
        };

        Ok(Self {
            max_sub_layers_minus1,
            temporal_id_nesting,
            profile,
            chroma_format_idc: chroma_format_idc as u8,
            bit_depth_luma: bit_depth_luma_minus8 as u8 + 8,
            bit_depth_chroma: bit_depth_chroma_minus8 as u8 + 8,
            width: pic_width.saturating_sub((conf_left + conf_right) * sub_width) as u32,
            height: pic_height.saturating_sub((conf_top + conf_bottom) * sub_height) as u32,
            sar,
            frame_rate,
            min_spatial_segmentation_idc,
        })
    }

    /// Frames per second derived from the VUI timing info.
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.map(|(time_scale, num_units)| time_scale as f64 / num_units as f64)
    }

    /// Display width after applying the sample aspect ratio.
    pub fn present_width(&self) -> u32 {
        let (num, den) = self.sar;
        ((self.width as u64 * num as u64).div_ceil(den as u64)) as u32
    }

    /// RFC 6381 codec string.
    pub fn codec_string(&self) -> String {
        self.profile.codec_string()
    }
}

/// 7.3.4
fn skip_scaling_list_data(reader: &mut BitReader<'_>) -> io::Result<()> {
    for size_id in 0..4 {
        let step = if size_id == 3 { 3 } else { 1 };
        let mut matrix_id = 0;
        while matrix_id < 6 {
            if !reader.read_bit()? {
                reader.read_exp_golomb()?; // scaling_list_pred_matrix_id_delta
            } else {
                let coef_num = 64.min(1 << (4 + (size_id << 1)));
                if size_id > 1 {
                    reader.read_signed_exp_golomb()?; // scaling_list_dc_coef_minus8
                }
                for _ in 0..coef_num {
                    reader.read_signed_exp_golomb()?; // scaling_list_delta_coef
                }
            }
            matrix_id += step;
        }
    }
    Ok(())
}

/// 7.3.7, only tracking the delta count each set contributes to inter prediction.
fn skip_short_term_ref_pic_sets(reader: &mut BitReader<'_>) -> io::Result<()> {
    let num_short_term_ref_pic_sets = reader.read_exp_golomb()?;
    if num_short_term_ref_pic_sets > 64 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "num_short_term_ref_pic_sets out of range"));
    }

    let mut num_delta_pocs: Vec<u32> = Vec::with_capacity(num_short_term_ref_pic_sets as usize);
    for idx in 0..num_short_term_ref_pic_sets as usize {
        let inter_ref_pic_set_prediction = idx != 0 && reader.read_bit()?;
        if inter_ref_pic_set_prediction {
            reader.read_bit()?; // delta_rps_sign
            reader.read_exp_golomb()?; // abs_delta_rps_minus1
            let ref_deltas = num_delta_pocs[idx - 1];
            let mut count = 0;
            for _ in 0..=ref_deltas {
                let used_by_curr_pic = reader.read_bit()?;
                let use_delta = used_by_curr_pic || reader.read_bit()?;
                if use_delta {
                    count += 1;
                }
            }
            num_delta_pocs.push(count);
        } else {
            let num_negative_pics = reader.read_exp_golomb()?;
            let num_positive_pics = reader.read_exp_golomb()?;
            if num_negative_pics > 16 || num_positive_pics > 16 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "short term ref pic set too large"));
            }
            for _ in 0..num_negative_pics + num_positive_pics {
                reader.read_exp_golomb()?; // delta_poc_s*_minus1
                reader.read_bit()?; // used_by_curr_pic_s*_flag
            }
            num_delta_pocs.push(num_negative_pics + num_positive_pics);
        }
    }
    Ok(())
}

/// E.2.2
fn skip_hrd_parameters(reader: &mut BitReader<'_>, max_sub_layers_minus1: u8) -> io::Result<()> {
    let nal_hrd = reader.read_bit()?;
    let vcl_hrd = reader.read_bit()?;
    let mut sub_pic_hrd_params_present = false;

    if nal_hrd || vcl_hrd {
        sub_pic_hrd_params_present = reader.read_bit()?;
        if sub_pic_hrd_params_present {
            reader.read_bits(8)?; // tick_divisor_minus2
            reader.read_bits(5)?; // du_cpb_removal_delay_increment_length_minus1
            reader.read_bit()?; // sub_pic_cpb_params_in_pic_timing_sei_flag
            reader.read_bits(5)?; // dpb_output_delay_du_length_minus1
        }
        reader.read_bits(8)?; // bit_rate_scale, cpb_size_scale
        if sub_pic_hrd_params_present {
            reader.read_bits(4)?; // cpb_size_du_scale
        }
        reader.read_bits(15)?; // initial/au cpb removal delay and dpb output delay lengths
    }

    for _ in 0..=max_sub_layers_minus1 {
        let fixed_pic_rate_general = reader.read_bit()?;
        let fixed_pic_rate_within_cvs = fixed_pic_rate_general || reader.read_bit()?;
        let mut low_delay_hrd = false;
        if fixed_pic_rate_within_cvs {
            reader.read_exp_golomb()?; // elemental_duration_in_tc_minus1
        } else {
            low_delay_hrd = reader.read_bit()?;
        }
        let cpb_cnt = if low_delay_hrd { 1 } else { reader.read_exp_golomb()? + 1 };
        if cpb_cnt > 32 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "cpb_cnt out of range"));
        }

        let hrd_count = nal_hrd as u8 + vcl_hrd as u8;
        for _ in 0..hrd_count {
            for _ in 0..cpb_cnt {
                reader.read_exp_golomb()?; // bit_rate_value_minus1
                reader.read_exp_golomb()?; // cpb_size_value_minus1
                if sub_pic_hrd_params_present {
                    reader.read_exp_golomb()?; // cpb_size_du_value_minus1
                    reader.read_exp_golomb()?; // bit_rate_du_value_minus1
                }
                reader.read_bit()?; // cbr_flag
            }
        }
    }
    Ok(())
}
