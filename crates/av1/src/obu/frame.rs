//! Frame header, decoded far enough to learn the frame type and, for key
//! frames, the coded and render sizes.

use std::io;

use bytes_util::BitReader;

use super::ObuHeader;
use super::seq::{SequenceHeader, ToolSelect};

/// `frame_type`
///
/// AV1-Spec-2 - 6.8.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// `KEY_FRAME`
    Key,
    /// `INTER_FRAME`
    Inter,
    /// `INTRA_ONLY_FRAME`
    IntraOnly,
    /// `SWITCH_FRAME`
    Switch,
}

impl From<u8> for FrameType {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => FrameType::Key,
            1 => FrameType::Inter,
            2 => FrameType::IntraOnly,
            _ => FrameType::Switch,
        }
    }
}

/// Sizes signalled by a key frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// `FrameWidth`, after super-resolution downscaling
    pub frame_width: u32,
    /// `FrameHeight`
    pub frame_height: u32,
    /// `UpscaledWidth`
    pub upscaled_width: u32,
    /// `SuperresDenom`, 8 when super-resolution is off
    pub superres_denom: u8,
    /// `RenderWidth`
    pub render_width: u32,
    /// `RenderHeight`
    pub render_height: u32,
}

/// The leading part of `uncompressed_header()`.
///
/// AV1-Spec-2 - 5.9.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHeader {
    /// `show_existing_frame` was set.
    ShowExisting {
        /// `frame_to_show_map_idx`
        frame_to_show_map_idx: u8,
    },
    /// A newly coded frame.
    Coded {
        /// `frame_type`
        frame_type: FrameType,
        /// `show_frame`
        show_frame: bool,
        /// Frame and render size, decoded for key frames only.
        size: Option<FrameSize>,
    },
}

const NUM_REF_FRAMES: usize = 8;
const ALL_FRAMES: u32 = (1 << NUM_REF_FRAMES) - 1;
const SUPERRES_NUM: u32 = 8;
const SUPERRES_DENOM_MIN: u8 = 9;
const SUPERRES_DENOM_BITS: u8 = 3;

impl FrameHeader {
    /// Parses the frame header carried by a `OBU_FRAME` or `OBU_FRAME_HEADER`
    /// payload, using the active sequence header.
    pub fn parse(obu: &ObuHeader, payload: &[u8], seq: &SequenceHeader) -> io::Result<Self> {
        let mut reader = BitReader::new(payload);

        let (frame_type, show_frame, error_resilient_mode) = if seq.reduced_still_picture_header {
            (FrameType::Key, true, true)
        } else {
            if reader.read_bit()? {
                // show_existing_frame
                return Ok(FrameHeader::ShowExisting {
                    frame_to_show_map_idx: reader.read_bits(3)? as u8,
                });
            }

            let frame_type = FrameType::from(reader.read_bits(2)? as u8);
            let show_frame = reader.read_bit()?;
            if show_frame && !seq.equal_picture_interval() {
                if let Some(model) = seq.decoder_model {
                    reader.skip_bits(model.frame_presentation_time_length as usize)?; // temporal_point_info
                }
            }
            if !show_frame {
                reader.read_bit()?; // showable_frame
            }

            let error_resilient_mode =
                frame_type == FrameType::Switch || (frame_type == FrameType::Key && show_frame) || reader.read_bit()?;
            (frame_type, show_frame, error_resilient_mode)
        };

        if frame_type != FrameType::Key {
            return Ok(FrameHeader::Coded {
                frame_type,
                show_frame,
                size: None,
            });
        }

        reader.read_bit()?; // disable_cdf_update
        let allow_screen_content_tools = match seq.screen_content_tools {
            ToolSelect::PerFrame => reader.read_bit()?,
            ToolSelect::On => true,
            ToolSelect::Off => false,
        };
        if allow_screen_content_tools && seq.integer_mv == ToolSelect::PerFrame {
            reader.read_bit()?; // force_integer_mv
        }
        reader.skip_bits(seq.frame_id_length as usize)?; // current_frame_id

        let frame_size_override = !seq.reduced_still_picture_header && reader.read_bit()?;
        reader.skip_bits(seq.order_hint_bits as usize)?; // order_hint

        if let Some(model) = seq.decoder_model {
            if reader.read_bit()? {
                // buffer_removal_time_present_flag
                for op in &seq.operating_points {
                    if !op.decoder_model_present {
                        continue;
                    }
                    let in_temporal_layer = (op.idc >> obu.temporal_id()) & 1 == 1;
                    let in_spatial_layer = (op.idc >> (obu.spatial_id() + 8)) & 1 == 1;
                    if op.idc == 0 || (in_temporal_layer && in_spatial_layer) {
                        reader.skip_bits(model.buffer_removal_time_length as usize)?;
                    }
                }
            }
        }

        if !show_frame {
            let refresh_frame_flags = reader.read_bits(8)?;
            if refresh_frame_flags != ALL_FRAMES && error_resilient_mode && seq.order_hint_bits > 0 {
                reader.skip_bits(NUM_REF_FRAMES * seq.order_hint_bits as usize)?; // ref_order_hint[i]
            }
        }

        let (frame_width, frame_height) = if frame_size_override {
            (
                reader.read_bits(seq.frame_width_bits)? + 1,
                reader.read_bits(seq.frame_height_bits)? + 1,
            )
        } else {
            (seq.max_frame_width, seq.max_frame_height)
        };

        let superres_denom = if seq.enable_superres && reader.read_bit()? {
            reader.read_bits(SUPERRES_DENOM_BITS)? as u8 + SUPERRES_DENOM_MIN
        } else {
            SUPERRES_NUM as u8
        };
        let upscaled_width = frame_width;
        let frame_width = (upscaled_width * SUPERRES_NUM + superres_denom as u32 / 2) / superres_denom as u32;

        let (render_width, render_height) = if reader.read_bit()? {
            (reader.read_bits(16)? + 1, reader.read_bits(16)? + 1)
        } else {
            (upscaled_width, frame_height)
        };

        Ok(FrameHeader::Coded {
            frame_type,
            show_frame,
            size: Some(FrameSize {
                frame_width,
                frame_height,
                upscaled_width,
                superres_denom,
                render_width,
                render_height,
            }),
        })
    }

    /// True for a shown or hidden `KEY_FRAME`.
    pub fn is_key_frame(&self) -> bool {
        matches!(
            self,
            FrameHeader::Coded {
                frame_type: FrameType::Key,
                ..
            }
        )
    }
}
