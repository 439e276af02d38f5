use std::io;

use bytes::Bytes;
use bytes_util::{BitReader, ebsp_to_rbsp};
use expgolomb::BitReaderExpGolombExt;

/// The subset of a Sequence Parameter Set needed to describe a video track.
///
/// ISO/IEC 14496-10 - 7.3.2.1.1 and Annex E (VUI).
#[derive(Debug, Clone, PartialEq)]
pub struct SpsDetails {
    /// `profile_idc`
    pub profile_idc: u8,
    /// The `constraint_set*_flag` byte.
    pub constraint_flags: u8,
    /// `level_idc`
    pub level_idc: u8,
    /// `chroma_format_idc`, 1 (4:2:0) when the profile does not carry it.
    pub chroma_format_idc: u8,
    /// Luma bit depth.
    pub bit_depth: u8,
    /// Chroma bit depth.
    pub bit_depth_chroma: u8,
    /// `max_num_ref_frames`
    pub ref_frames: u32,
    /// Decoded width after the cropping window.
    pub width: u32,
    /// Decoded height after the cropping window.
    pub height: u32,
    /// Sample aspect ratio as `(width, height)`, 1:1 when absent.
    pub sar: (u32, u32),
    /// `(time_scale, 2 * num_units_in_tick)` when VUI timing info is present.
    pub frame_rate: Option<(u32, u32)>,
    /// `fixed_frame_rate_flag`
    pub fixed_frame_rate: bool,
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
    /// Parses an SPS NAL unit (header byte included, emulation prevention
    /// bytes still in place).
    pub fn parse(nalu: &Bytes) -> io::Result<Self> {
        let rbsp = ebsp_to_rbsp(nalu);
        if rbsp.len() < 4 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "sps too short"));
        }

        let mut reader = BitReader::new(&rbsp[1..]);

        let profile_idc = reader.read_u8()?;
        let constraint_flags = reader.read_u8()?;
        let level_idc = reader.read_u8()?;
        reader.read_exp_golomb()?; // seq_parameter_set_id

        let mut chroma_format_idc = 1;
        let mut separate_colour_plane = false;
        let mut bit_depth_luma_minus8 = 0;
        let mut bit_depth_chroma_minus8 = 0;

        if matches!(profile_idc, 100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134 | 135) {
            chroma_format_idc = reader.read_exp_golomb()?;
            if chroma_format_idc == 3 {
                separate_colour_plane = reader.read_bit()?;
            }
            bit_depth_luma_minus8 = reader.read_exp_golomb()?;
            bit_depth_chroma_minus8 = reader.read_exp_golomb()?;
            reader.read_bit()?; // qpprime_y_zero_transform_bypass_flag

            if reader.read_bit()? {
                let lists = if chroma_format_idc == 3 { 12 } else { 8 };
                for i in 0..lists {
                    if reader.read_bit()? {
                        skip_scaling_list(&mut reader, if i < 6 { 16 } else { 64 })?;
                    }
                }
            }
        }

        if chroma_format_idc > 3 || bit_depth_luma_minus8 > 6 || bit_depth_chroma_minus8 > 6 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "sps chroma/bit depth out of range"));
        }

        reader.read_exp_golomb()?; // log2_max_frame_num_minus4
        match reader.read_exp_golomb()? {
            0 => {
                reader.read_exp_golomb()?; // log2_max_pic_order_cnt_lsb_minus4
            }
            1 => {
                reader.read_bit()?; // delta_pic_order_always_zero_flag
                reader.read_signed_exp_golomb()?; // offset_for_non_ref_pic
                reader.read_signed_exp_golomb()?; // offset_for_top_to_bottom_field
                let cycle = reader.read_exp_golomb()?;
                for _ in 0..cycle {
                    reader.read_signed_exp_golomb()?;
                }
            }
            _ => {}
        }

        let ref_frames = reader.read_exp_golomb()?;
        reader.read_bit()?; // gaps_in_frame_num_value_allowed_flag

        let pic_width_in_mbs = reader.read_exp_golomb()? as u64 + 1;
        let pic_height_in_map_units = reader.read_exp_golomb()? as u64 + 1;
        let frame_mbs_only = reader.read_bit()?;
        if !frame_mbs_only {
            reader.read_bit()?; // mb_adaptive_frame_field_flag
        }
        reader.read_bit()?; // direct_8x8_inference_flag

        let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0u64, 0u64, 0u64, 0u64);
        if reader.read_bit()? {
            crop_left = reader.read_exp_golomb()? as u64;
            crop_right = reader.read_exp_golomb()? as u64;
            crop_top = reader.read_exp_golomb()? as u64;
            crop_bottom = reader.read_exp_golomb()? as u64;
        }

        let mut sar = (1, 1);
        let mut frame_rate = None;
        let mut fixed_frame_rate = false;

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
                    reader.read_bits(24)?; // colour_primaries, transfer_characteristics, matrix_coefficients
                }
            }

            if reader.read_bit()? {
                reader.read_exp_golomb()?; // chroma_sample_loc_type_top_field
                reader.read_exp_golomb()?; // chroma_sample_loc_type_bottom_field
            }

            if reader.read_bit()? {
                let num_units_in_tick = reader.read_bits(32)?;
                let time_scale = reader.read_bits(32)?;
                fixed_frame_rate = reader.read_bit()?;
                if num_units_in_tick > 0 && time_scale > 0 {
                    frame_rate = Some((time_scale, num_units_in_tick.saturating_mul(2)));
                }
            }
        }

        if sar.0 == 0 || sar.1 == 0 {
            sar = (1, 1);
        }

        let (crop_unit_x, crop_unit_y) = if chroma_format_idc == 0 || separate_colour_plane {
            (1, if frame_mbs_only { 1 } else { 2 })
        } else {
            let sub_width = if chroma_format_idc == 3 { 1 } else { 2 };
            let sub_height = if chroma_format_idc == 1 { 2 } else { 1 };
            (sub_width, sub_height * if frame_mbs_only { 1 } else { 2 })
        };

        let frame_height_factor = if frame_mbs_only { 1 } else { 2 };
        let width = (pic_width_in_mbs * 16).saturating_sub((crop_left + crop_right) * crop_unit_x);
        let height = (frame_height_factor * pic_height_in_map_units * 16).saturating_sub((crop_top + crop_bottom) * crop_unit_y);

        Ok(Self {
            profile_idc,
            constraint_flags,
            level_idc,
            chroma_format_idc: chroma_format_idc as u8,
            bit_depth: bit_depth_luma_minus8 as u8 + 8,
            bit_depth_chroma: bit_depth_chroma_minus8 as u8 + 8,
            ref_frames,
            width: width as u32,
            height: height as u32,
            sar,
            frame_rate,
            fixed_frame_rate,
        })
    }

    /// Profile name as shown in media info.
    pub fn profile_name(&self) -> &'static str {
        match self.profile_idc {
            66 => "Baseline",
            77 => "Main",
            88 => "Extended",
            100 => "High",
            110 => "High10",
            122 => "High422",
            244 => "High444",
            _ => "Unknown",
        }
    }

    /// Level formatted as `major.minor`, e.g. `3.1`.
    pub fn level_string(&self) -> String {
        format!("{}.{}", self.level_idc / 10, self.level_idc % 10)
    }

    /// RFC 6381 codec string, `avc1.PPCCLL`.
    pub fn codec_string(&self) -> String {
        format!(
            "avc1.{:02x}{:02x}{:02x}",
            self.profile_idc, self.constraint_flags, self.level_idc
        )
    }

    /// Frames per second when the VUI carries timing info.
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.map(|(num, den)| num as f64 / den as f64)
    }

    /// Display width once the sample aspect ratio is applied.
    pub fn present_width(&self) -> u32 {
        (self.width as u64 * self.sar.0 as u64).div_ceil(self.sar.1 as u64) as u32
    }
}

/// ISO/IEC 14496-10 - 7.3.2.1.1.1
fn skip_scaling_list(reader: &mut BitReader<'_>, size: usize) -> io::Result<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;
    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = reader.read_signed_exp_golomb()?;
            next_scale = (last_scale + delta_scale).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
pub(crate) mod tests {
    use bytes::Bytes;
    use bytes_util::BitWriter;
    use expgolomb::BitWriterExpGolombExt;

    use super::*;

    /// Baseline 320x240 @ 25 fps, 4:3 pixels stretched with SAR 4:3.
    pub(crate) fn baseline_sps() -> Bytes {
        let mut writer = BitWriter::new();
        writer.write_bits(0x67, 8).unwrap();
        writer.write_bits(66, 8).unwrap(); // profile_idc
        writer.write_bits(0xC0, 8).unwrap(); // constraint flags
        writer.write_bits(30, 8).unwrap(); // level_idc
        writer.write_exp_golomb(0).unwrap(); // sps id
        writer.write_exp_golomb(0).unwrap(); // log2_max_frame_num_minus4
        writer.write_exp_golomb(2).unwrap(); // poc type
        writer.write_exp_golomb(1).unwrap(); // max_num_ref_frames
        writer.write_bit(false).unwrap();
        writer.write_exp_golomb(19).unwrap(); // 320
        writer.write_exp_golomb(14).unwrap(); // 240
        writer.write_bit(true).unwrap(); // frame_mbs_only
        writer.write_bit(true).unwrap(); // direct_8x8
        writer.write_bit(false).unwrap(); // cropping
        writer.write_bit(true).unwrap(); // vui
        writer.write_bit(true).unwrap(); // aspect_ratio_info
        writer.write_bits(14, 8).unwrap(); // 4:3
        writer.write_bit(false).unwrap();
        writer.write_bit(false).unwrap();
        writer.write_bit(false).unwrap();
        writer.write_bit(true).unwrap(); // timing info
        writer.write_bits(1, 32).unwrap();
        writer.write_bits(50, 32).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_bits(0, 5).unwrap(); // hrd, pic_struct, restriction flags
        writer.write_bit(true).unwrap(); // rbsp stop bit
        Bytes::from(writer.finish())
    }

    #[test]
    fn test_parse_high_profile_sps() {
        let sps = Bytes::from_static(b"gd\0\x1f\xac\xd9A\xe0m\xf9\xe6\xa0  (\0\0\x03\0\x08\0\0\x03\x01\xe0x\xc1\x8c\xb0");
        let details = SpsDetails::parse(&sps).unwrap();

        insta::assert_debug_snapshot!(details, @r"
        SpsDetails {
            profile_idc: 100,
            constraint_flags: 0,
            level_idc: 31,
            chroma_format_idc: 1,
            bit_depth: 8,
            bit_depth_chroma: 8,
            ref_frames: 4,
            width: 480,
            height: 852,
            sar: (
                1,
                1,
            ),
            frame_rate: Some(
                (
                    60,
                    2,
                ),
            ),
            fixed_frame_rate: false,
        }
        ");
        assert_eq!(details.codec_string(), "avc1.64001f");
        assert_eq!(details.profile_name(), "High");
        assert_eq!(details.level_string(), "3.1");
        assert_eq!(details.fps(), Some(30.0));
    }

    #[test]
    fn test_parse_baseline_sps_with_sar() {
        let details = SpsDetails::parse(&baseline_sps()).unwrap();

        assert_eq!(details.profile_idc, 66);
        assert_eq!(details.constraint_flags, 0xC0);
        assert_eq!((details.width, details.height), (320, 240));
        assert_eq!(details.sar, (4, 3));
        assert_eq!(details.present_width(), 427);
        assert_eq!(details.fps(), Some(25.0));
        assert!(details.fixed_frame_rate);
        assert_eq!(details.ref_frames, 1);
        assert_eq!(details.codec_string(), "avc1.42c01e");
    }

    #[test]
    fn test_truncated_sps() {
        let sps = Bytes::from_static(&[0x67, 0x64, 0x00, 0x1F, 0xAC]);
        assert!(SpsDetails::parse(&sps).is_err());
        assert!(SpsDetails::parse(&Bytes::from_static(&[0x67, 0x42])).is_err());
    }
}
