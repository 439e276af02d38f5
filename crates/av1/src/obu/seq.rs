//! Sequence header, decoded as far as the `av1C` record, the codec string
//! and the frame header walk need it.
//!
//! AV1-Spec-2 - 5.5

use std::io;

use bytes_util::BitReader;

use super::ObuHeader;
use crate::obu::utils::read_uvlc;

const CP_BT_709: u8 = 1;
const CP_UNSPECIFIED: u8 = 2;
const TC_UNSPECIFIED: u8 = 2;
const TC_SRGB: u8 = 13;
const MC_IDENTITY: u8 = 0;
const MC_UNSPECIFIED: u8 = 2;

/// A parsed `sequence_header_obu()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    /// The OBU header that carried the sequence header
    pub header: ObuHeader,
    /// `seq_profile`
    pub seq_profile: u8,
    /// `still_picture`
    pub still_picture: bool,
    /// `reduced_still_picture_header`
    pub reduced_still_picture_header: bool,
    /// `timing_info()`, when present
    pub timing: Option<Timing>,
    /// `decoder_model_info()`, when present
    pub decoder_model: Option<DecoderModel>,
    /// One entry per operating point, at least one
    pub operating_points: Vec<OperatingPoint>,
    /// `frame_width_bits_minus_1 + 1`
    pub frame_width_bits: u8,
    /// `frame_height_bits_minus_1 + 1`
    pub frame_height_bits: u8,
    /// `max_frame_width_minus_1 + 1`
    pub max_frame_width: u32,
    /// `max_frame_height_minus_1 + 1`
    pub max_frame_height: u32,
    /// `idLen` of the frame header, 0 without frame ids
    pub frame_id_length: u8,
    /// `OrderHintBits`, 0 when order hints are disabled
    pub order_hint_bits: u8,
    /// `seq_force_screen_content_tools`
    pub screen_content_tools: ToolSelect,
    /// `seq_force_integer_mv`
    pub integer_mv: ToolSelect,
    /// `enable_superres`
    pub enable_superres: bool,
    /// `color_config()`
    pub color: Color,
}

/// A sequence level tool switch that may defer to each frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSelect {
    /// Forced off
    Off,
    /// Forced on
    On,
    /// `SELECT_*`: every frame header carries its own flag
    PerFrame,
}

impl ToolSelect {
    /// `seq_choose_*`, then `seq_force_*` when the choice is not deferred.
    fn read(reader: &mut BitReader<'_>) -> io::Result<Self> {
        if reader.read_bit()? {
            Ok(ToolSelect::PerFrame)
        } else if reader.read_bit()? {
            Ok(ToolSelect::On)
        } else {
            Ok(ToolSelect::Off)
        }
    }
}

/// `timing_info()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// `num_units_in_display_tick`
    pub num_units_in_display_tick: u32,
    /// `time_scale`
    pub time_scale: u32,
    /// `num_ticks_per_picture_minus_1 + 1`, present with `equal_picture_interval`
    pub ticks_per_picture: Option<u64>,
}

/// The lengths from `decoder_model_info()` that later syntax depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderModel {
    /// `buffer_delay_length_minus_1 + 1`
    pub buffer_delay_length: u8,
    /// `buffer_removal_time_length_minus_1 + 1`
    pub buffer_removal_time_length: u8,
    /// `frame_presentation_time_length_minus_1 + 1`
    pub frame_presentation_time_length: u8,
}

/// One operating point of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingPoint {
    /// `operating_point_idc`
    pub idc: u16,
    /// `seq_level_idx`
    pub seq_level_idx: u8,
    /// `seq_tier`, false below level 4.0
    pub seq_tier: bool,
    /// `decoder_model_present_for_this_op`
    pub decoder_model_present: bool,
    /// `initial_display_delay_minus_1 + 1`, when signalled for this point
    pub initial_display_delay: Option<u8>,
}

/// `color_config()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// `BitDepth`: 8, 10 or 12
    pub bit_depth: u8,
    /// `mono_chrome`
    pub mono_chrome: bool,
    /// `color_primaries`
    pub color_primaries: u8,
    /// `transfer_characteristics`
    pub transfer_characteristics: u8,
    /// `matrix_coefficients`
    pub matrix_coefficients: u8,
    /// `color_range`
    pub full_range: bool,
    /// `subsampling_x`
    pub subsampling_x: bool,
    /// `subsampling_y`
    pub subsampling_y: bool,
    /// `chroma_sample_position`, 0 unless 4:2:0
    pub chroma_sample_position: u8,
}

impl SequenceHeader {
    /// Parses the payload that follows the OBU header.
    pub fn parse(header: ObuHeader, payload: &[u8]) -> io::Result<Self> {
        let mut reader = BitReader::new(payload);

        let seq_profile = reader.read_bits(3)? as u8;
        let still_picture = reader.read_bit()?;
        let reduced_still_picture_header = reader.read_bit()?;
        if reduced_still_picture_header && !still_picture {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "reduced_still_picture_header requires still_picture",
            ));
        }

        let (timing, decoder_model, operating_points) = if reduced_still_picture_header {
            let point = OperatingPoint {
                idc: 0,
                seq_level_idx: reader.read_bits(5)? as u8,
                seq_tier: false,
                decoder_model_present: false,
                initial_display_delay: None,
            };
            (None, None, vec![point])
        } else {
            read_operating_points(&mut reader)?
        };

        let frame_width_bits = reader.read_bits(4)? as u8 + 1;
        let frame_height_bits = reader.read_bits(4)? as u8 + 1;
        let max_frame_width = reader.read_bits(frame_width_bits)? + 1;
        let max_frame_height = reader.read_bits(frame_height_bits)? + 1;

        let frame_id_length = if !reduced_still_picture_header && reader.read_bit()? {
            let delta_frame_id_length = reader.read_bits(4)? as u8 + 2;
            let additional_frame_id_length = reader.read_bits(3)? as u8 + 1;
            delta_frame_id_length + additional_frame_id_length
        } else {
            0
        };

        // use_128x128_superblock, enable_filter_intra, enable_intra_edge_filter
        reader.skip_bits(3)?;

        let (order_hint_bits, screen_content_tools, integer_mv) = if reduced_still_picture_header {
            (0, ToolSelect::PerFrame, ToolSelect::PerFrame)
        } else {
            // interintra compound, masked compound, warped motion, dual filter
            reader.skip_bits(4)?;
            let enable_order_hint = reader.read_bit()?;
            if enable_order_hint {
                // enable_jnt_comp, enable_ref_frame_mvs
                reader.skip_bits(2)?;
            }

            let screen_content_tools = ToolSelect::read(&mut reader)?;
            let integer_mv = match screen_content_tools {
                ToolSelect::Off => ToolSelect::PerFrame,
                _ => ToolSelect::read(&mut reader)?,
            };

            let order_hint_bits = if enable_order_hint { reader.read_bits(3)? as u8 + 1 } else { 0 };
            (order_hint_bits, screen_content_tools, integer_mv)
        };

        let enable_superres = reader.read_bit()?;
        // enable_cdef, enable_restoration
        reader.skip_bits(2)?;

        let color = Color::parse(seq_profile, &mut reader)?;

        Ok(Self {
            header,
            seq_profile,
            still_picture,
            reduced_still_picture_header,
            timing,
            decoder_model,
            operating_points,
            frame_width_bits,
            frame_height_bits,
            max_frame_width,
            max_frame_height,
            frame_id_length,
            order_hint_bits,
            screen_content_tools,
            integer_mv,
            enable_superres,
            color,
        })
    }

    /// `seq_level_idx[0]`
    pub fn seq_level_idx_0(&self) -> u8 {
        self.operating_points.first().map_or(0, |op| op.seq_level_idx)
    }

    /// `seq_tier[0]`
    pub fn seq_tier_0(&self) -> bool {
        self.operating_points.first().is_some_and(|op| op.seq_tier)
    }

    /// `equal_picture_interval`. Frame headers then omit `temporal_point_info`.
    pub fn equal_picture_interval(&self) -> bool {
        self.timing.is_some_and(|timing| timing.ticks_per_picture.is_some())
    }

    /// `(time_scale, num_units_in_display_tick * ticks_per_picture)`, only
    /// for sequences with an equal picture interval.
    pub fn frame_rate(&self) -> Option<(u32, u64)> {
        let timing = self.timing?;
        let ticks = timing.ticks_per_picture?;
        (timing.time_scale != 0 && timing.num_units_in_display_tick != 0)
            .then(|| (timing.time_scale, timing.num_units_in_display_tick as u64 * ticks))
    }

    /// Chroma layout as a chroma_format_idc: 0 mono, 1 4:2:0, 2 4:2:2, 3 4:4:4.
    pub fn chroma_format_idc(&self) -> u8 {
        match (self.color.mono_chrome, self.color.subsampling_x, self.color.subsampling_y) {
            (true, _, _) => 0,
            (false, true, true) => 1,
            (false, true, false) => 2,
            (false, false, _) => 3,
        }
    }

    /// `av01.P.LLT.DD`, e.g. `av01.0.13M.08`.
    pub fn codec_string(&self) -> String {
        let tier = if self.seq_tier_0() { 'H' } else { 'M' };
        format!(
            "av01.{}.{:02}{tier}.{:02}",
            self.seq_profile,
            self.seq_level_idx_0(),
            self.color.bit_depth
        )
    }
}

fn read_operating_points(
    reader: &mut BitReader<'_>,
) -> io::Result<(Option<Timing>, Option<DecoderModel>, Vec<OperatingPoint>)> {
    let mut decoder_model = None;
    let timing = if reader.read_bit()? {
        let num_units_in_display_tick = reader.read_bits(32)?;
        let time_scale = reader.read_bits(32)?;
        let ticks_per_picture = if reader.read_bit()? {
            Some(read_uvlc(reader)? + 1)
        } else {
            None
        };

        if reader.read_bit()? {
            let buffer_delay_length = reader.read_bits(5)? as u8 + 1;
            reader.skip_bits(32)?; // num_units_in_decoding_tick
            decoder_model = Some(DecoderModel {
                buffer_delay_length,
                buffer_removal_time_length: reader.read_bits(5)? as u8 + 1,
                frame_presentation_time_length: reader.read_bits(5)? as u8 + 1,
            });
        }

        Some(Timing {
            num_units_in_display_tick,
            time_scale,
            ticks_per_picture,
        })
    } else {
        None
    };

    let initial_display_delay_present = reader.read_bit()?;
    let count = reader.read_bits(5)? as usize + 1;
    let mut operating_points = Vec::with_capacity(count);

    for _ in 0..count {
        let idc = reader.read_bits(12)? as u16;
        let seq_level_idx = reader.read_bits(5)? as u8;
        let seq_tier = seq_level_idx > 7 && reader.read_bit()?;

        let mut decoder_model_present = false;
        if let Some(model) = decoder_model {
            decoder_model_present = reader.read_bit()?;
            if decoder_model_present {
                // decoder_buffer_delay, encoder_buffer_delay, low_delay_mode_flag
                reader.skip_bits(2 * model.buffer_delay_length as usize + 1)?;
            }
        }

        let initial_display_delay = if initial_display_delay_present && reader.read_bit()? {
            Some(reader.read_bits(4)? as u8 + 1)
        } else {
            None
        };

        operating_points.push(OperatingPoint {
            idc,
            seq_level_idx,
            seq_tier,
            decoder_model_present,
            initial_display_delay,
        });
    }

    Ok((timing, decoder_model, operating_points))
}

impl Color {
    fn parse(seq_profile: u8, reader: &mut BitReader<'_>) -> io::Result<Self> {
        let high_bitdepth = reader.read_bit()?;
        let bit_depth = match (seq_profile, high_bitdepth) {
            (2, true) if reader.read_bit()? => 12,
            (_, true) => 10,
            (_, false) => 8,
        };

        let mono_chrome = seq_profile != 1 && reader.read_bit()?;

        let (color_primaries, transfer_characteristics, matrix_coefficients) = if reader.read_bit()? {
            (reader.read_u8()?, reader.read_u8()?, reader.read_u8()?)
        } else {
            (CP_UNSPECIFIED, TC_UNSPECIFIED, MC_UNSPECIFIED)
        };

        let mut color = Color {
            bit_depth,
            mono_chrome,
            color_primaries,
            transfer_characteristics,
            matrix_coefficients,
            full_range: false,
            subsampling_x: true,
            subsampling_y: true,
            chroma_sample_position: 0,
        };

        if mono_chrome {
            color.full_range = reader.read_bit()?;
            return Ok(color);
        }

        let srgb = color_primaries == CP_BT_709 && transfer_characteristics == TC_SRGB && matrix_coefficients == MC_IDENTITY;
        if srgb {
            color.full_range = true;
            color.subsampling_x = false;
            color.subsampling_y = false;
        } else {
            color.full_range = reader.read_bit()?;
            (color.subsampling_x, color.subsampling_y) = match seq_profile {
                0 => (true, true),
                1 => (false, false),
                _ if bit_depth == 12 => {
                    let x = reader.read_bit()?;
                    (x, x && reader.read_bit()?)
                }
                _ => (true, false),
            };
        }

        if color.subsampling_x && color.subsampling_y {
            color.chroma_sample_position = reader.read_bits(2)? as u8;
        }
        reader.skip_bits(1)?; // separate_uv_delta_q

        Ok(color)
    }
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
pub(crate) mod tests {
    use bytes_util::BitWriter;

    use super::*;
    use crate::ObuType;

    pub(crate) const SEQ_HEADER_4K: &[u8] = b"\0\0\0j\xef\xbf\xe1\xbc\x02\x19\x90\x10\x10\x10@";

    pub(crate) fn seq_obu_header() -> ObuHeader {
        ObuHeader {
            obu_type: ObuType::SequenceHeader,
            size: None,
            extension_header: None,
        }
    }

    #[test]
    fn test_parse_4k_main_profile() {
        let seq = SequenceHeader::parse(seq_obu_header(), SEQ_HEADER_4K).unwrap();

        insta::assert_debug_snapshot!(seq, @r"
        SequenceHeader {
            header: ObuHeader {
                obu_type: SequenceHeader,
                size: None,
                extension_header: None,
            },
            seq_profile: 0,
            still_picture: false,
            reduced_still_picture_header: false,
            timing: None,
            decoder_model: None,
            operating_points: [
                OperatingPoint {
                    idc: 0,
                    seq_level_idx: 13,
                    seq_tier: false,
                    decoder_model_present: false,
                    initial_display_delay: None,
                },
            ],
            frame_width_bits: 12,
            frame_height_bits: 12,
            max_frame_width: 3840,
            max_frame_height: 2160,
            frame_id_length: 0,
            order_hint_bits: 7,
            screen_content_tools: Off,
            integer_mv: PerFrame,
            enable_superres: false,
            color: Color {
                bit_depth: 8,
                mono_chrome: false,
                color_primaries: 1,
                transfer_characteristics: 1,
                matrix_coefficients: 1,
                full_range: false,
                subsampling_x: true,
                subsampling_y: true,
                chroma_sample_position: 0,
            },
        }
        ");

        assert_eq!(seq.codec_string(), "av01.0.13M.08");
        assert_eq!(seq.chroma_format_idc(), 1);
        assert_eq!(seq.frame_rate(), None);
    }

    #[test]
    fn test_parse_reduced_still_picture() {
        let mut bits = BitWriter::new();

        bits.write_bits(2, 3).unwrap(); // seq_profile
        bits.write_bit(true).unwrap(); // still_picture
        bits.write_bit(true).unwrap(); // reduced_still_picture_header
        bits.write_bits(11, 5).unwrap(); // seq_level_idx[0]

        bits.write_bits(15, 4).unwrap();
        bits.write_bits(15, 4).unwrap();
        bits.write_bits(1919, 16).unwrap();
        bits.write_bits(1079, 16).unwrap();

        bits.write_bits(0, 3).unwrap(); // superblock, filter intra, intra edge
        bits.write_bits(0, 3).unwrap(); // superres, cdef, restoration

        bits.write_bit(true).unwrap(); // high_bitdepth
        bits.write_bit(true).unwrap(); // twelve_bit
        bits.write_bit(true).unwrap(); // mono_chrome
        bits.write_bit(false).unwrap(); // color_description_present_flag
        bits.write_bit(true).unwrap(); // color_range
        bits.write_bit(false).unwrap(); // film_grain_params_present

        let seq = SequenceHeader::parse(seq_obu_header(), &bits.finish()).unwrap();

        assert_eq!(seq.seq_level_idx_0(), 11);
        assert_eq!((seq.max_frame_width, seq.max_frame_height), (1920, 1080));
        assert_eq!(seq.screen_content_tools, ToolSelect::PerFrame);
        assert_eq!(seq.color.bit_depth, 12);
        assert!(seq.color.full_range);
        assert_eq!(seq.chroma_format_idc(), 0);
        assert_eq!(seq.codec_string(), "av01.2.11M.12");
    }

    #[test]
    fn test_parse_timing_and_decoder_model() {
        let mut bits = BitWriter::new();

        bits.write_bits(0, 3).unwrap(); // seq_profile
        bits.write_bit(false).unwrap(); // still_picture
        bits.write_bit(false).unwrap(); // reduced_still_picture_header
        bits.write_bit(true).unwrap(); // timing_info_present_flag
        bits.write_bits(1001, 32).unwrap(); // num_units_in_display_tick
        bits.write_bits(60000, 32).unwrap(); // time_scale
        bits.write_bit(true).unwrap(); // equal_picture_interval
        bits.write_bit(true).unwrap(); // num_ticks_per_picture_minus_1 = 0
        bits.write_bit(true).unwrap(); // decoder_model_info_present_flag
        bits.write_bits(9, 5).unwrap(); // buffer_delay_length_minus_1
        bits.write_bits(90000, 32).unwrap(); // num_units_in_decoding_tick
        bits.write_bits(4, 5).unwrap(); // buffer_removal_time_length_minus_1
        bits.write_bits(6, 5).unwrap(); // frame_presentation_time_length_minus_1
        bits.write_bit(true).unwrap(); // initial_display_delay_present_flag
        bits.write_bits(0, 5).unwrap(); // operating_points_cnt_minus_1
        bits.write_bits(0x101, 12).unwrap(); // operating_point_idc
        bits.write_bits(9, 5).unwrap(); // seq_level_idx
        bits.write_bit(true).unwrap(); // seq_tier
        bits.write_bit(true).unwrap(); // decoder_model_present_for_this_op
        bits.write_bits(0, 10).unwrap(); // decoder_buffer_delay
        bits.write_bits(0, 10).unwrap(); // encoder_buffer_delay
        bits.write_bit(false).unwrap(); // low_delay_mode_flag
        bits.write_bit(true).unwrap(); // initial_display_delay_present_for_this_op
        bits.write_bits(3, 4).unwrap(); // initial_display_delay_minus_1

        bits.write_bits(10, 4).unwrap(); // frame_width_bits_minus_1
        bits.write_bits(10, 4).unwrap(); // frame_height_bits_minus_1
        bits.write_bits(1279, 11).unwrap();
        bits.write_bits(719, 11).unwrap();
        bits.write_bit(true).unwrap(); // frame_id_numbers_present_flag
        bits.write_bits(5, 4).unwrap(); // delta_frame_id_length_minus_2
        bits.write_bits(2, 3).unwrap(); // additional_frame_id_length_minus_1

        bits.write_bits(0, 3).unwrap(); // superblock, filter intra, intra edge
        bits.write_bits(0, 4).unwrap(); // interintra, masked, warped, dual filter
        bits.write_bit(false).unwrap(); // enable_order_hint
        bits.write_bit(false).unwrap(); // seq_choose_screen_content_tools
        bits.write_bit(true).unwrap(); // seq_force_screen_content_tools
        bits.write_bit(false).unwrap(); // seq_choose_integer_mv
        bits.write_bit(true).unwrap(); // seq_force_integer_mv
        bits.write_bit(true).unwrap(); // enable_superres
        bits.write_bits(0, 2).unwrap(); // cdef, restoration

        bits.write_bit(true).unwrap(); // high_bitdepth
        bits.write_bit(false).unwrap(); // mono_chrome
        bits.write_bit(false).unwrap(); // color_description_present_flag
        bits.write_bit(false).unwrap(); // color_range
        bits.write_bits(2, 2).unwrap(); // chroma_sample_position
        bits.write_bit(false).unwrap(); // separate_uv_delta_q
        bits.write_bit(false).unwrap(); // film_grain_params_present

        let seq = SequenceHeader::parse(seq_obu_header(), &bits.finish()).unwrap();

        assert!(seq.equal_picture_interval());
        assert_eq!(seq.frame_rate(), Some((60000, 1001)));
        assert_eq!(
            seq.decoder_model,
            Some(DecoderModel {
                buffer_delay_length: 10,
                buffer_removal_time_length: 5,
                frame_presentation_time_length: 7,
            })
        );
        assert_eq!(
            seq.operating_points,
            [OperatingPoint {
                idc: 0x101,
                seq_level_idx: 9,
                seq_tier: true,
                decoder_model_present: true,
                initial_display_delay: Some(4),
            }]
        );
        assert_eq!(seq.frame_id_length, 10);
        assert_eq!(seq.order_hint_bits, 0);
        assert_eq!((seq.screen_content_tools, seq.integer_mv), (ToolSelect::On, ToolSelect::On));
        assert!(seq.enable_superres);
        assert_eq!(seq.color.chroma_sample_position, 2);
        assert_eq!(seq.codec_string(), "av01.0.09H.10");
    }

    #[test]
    fn test_srgb_profile_one_is_full_range_444() {
        let mut bits = BitWriter::new();

        bits.write_bits(1, 3).unwrap(); // seq_profile
        bits.write_bit(true).unwrap(); // still_picture
        bits.write_bit(true).unwrap(); // reduced_still_picture_header
        bits.write_bits(4, 5).unwrap(); // seq_level_idx[0]
        bits.write_bits(7, 4).unwrap();
        bits.write_bits(7, 4).unwrap();
        bits.write_bits(255, 8).unwrap();
        bits.write_bits(255, 8).unwrap();
        bits.write_bits(0, 6).unwrap(); // tool flags, superres, cdef, restoration

        bits.write_bit(false).unwrap(); // high_bitdepth
        bits.write_bit(true).unwrap(); // color_description_present_flag
        bits.write_bits(CP_BT_709 as u64, 8).unwrap();
        bits.write_bits(TC_SRGB as u64, 8).unwrap();
        bits.write_bits(MC_IDENTITY as u64, 8).unwrap();
        bits.write_bit(false).unwrap(); // separate_uv_delta_q
        bits.write_bit(false).unwrap(); // film_grain_params_present

        let seq = SequenceHeader::parse(seq_obu_header(), &bits.finish()).unwrap();

        assert!(seq.color.full_range);
        assert_eq!(seq.chroma_format_idc(), 3);
        assert_eq!(seq.codec_string(), "av01.1.04M.08");
    }

    #[test]
    fn test_reduced_header_without_still_picture() {
        let err = SequenceHeader::parse(seq_obu_header(), &[0b0000_1000]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_header() {
        let err = SequenceHeader::parse(seq_obu_header(), &SEQ_HEADER_4K[..6]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
