use std::io;

use bytes::Bytes;
use bytes_util::BitReader;

/// A `segmentation_descriptor()` component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationComponent {
    /// `component_tag`
    pub component_tag: u8,
    /// `pts_offset`
    pub pts_offset: u64,
}

/// Delivery restriction flags, present when `delivery_not_restricted_flag`
/// is clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryRestrictions {
    /// `web_delivery_allowed_flag`
    pub web_delivery_allowed: bool,
    /// `no_regional_blackout_flag`
    pub no_regional_blackout: bool,
    /// `archive_allowed_flag`
    pub archive_allowed: bool,
    /// `device_restrictions`
    pub device_restrictions: u8,
}

/// Body of a segmentation descriptor that is not cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationDetail {
    /// `None` when `delivery_not_restricted_flag` is set
    pub delivery_restrictions: Option<DeliveryRestrictions>,
    /// Components of a component level segmentation
    pub components: Vec<SegmentationComponent>,
    /// `segmentation_duration` in 90 kHz units
    pub segmentation_duration: Option<u64>,
    /// `segmentation_upid_type`
    pub upid_type: u8,
    /// `segmentation_upid()`
    pub upid: Bytes,
    /// `segmentation_type_id`
    pub segmentation_type_id: u8,
    /// `segment_num`
    pub segment_num: u8,
    /// `segments_expected`
    pub segments_expected: u8,
    /// `sub_segment_num` and `sub_segments_expected` for the placement
    /// opportunity types that carry them
    pub sub_segments: Option<(u8, u8)>,
}

/// One `audio_descriptor()` channel entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioComponent {
    /// `component_tag`
    pub component_tag: u8,
    /// `ISO_code`
    pub iso_code: String,
    /// `Bit_Stream_Mode`
    pub bit_stream_mode: u8,
    /// `Num_Channels`
    pub num_channels: u8,
    /// `Full_Srvc_Audio`
    pub full_service_audio: bool,
}

/// `splice_descriptor()` variants, SCTE 35 2019 - 10
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceDescriptor {
    /// `avail_descriptor()` (0x00)
    Avail {
        /// `identifier`
        identifier: u32,
        /// `provider_avail_id`
        provider_avail_id: u32,
    },
    /// `DTMF_descriptor()` (0x01)
    Dtmf {
        /// `identifier`
        identifier: u32,
        /// `preroll` in tenths of a second
        preroll: u8,
        /// `DTMF_char`s
        dtmf_chars: String,
    },
    /// `segmentation_descriptor()` (0x02)
    Segmentation {
        /// `identifier`
        identifier: u32,
        /// `segmentation_event_id`
        segmentation_event_id: u32,
        /// `None` when `segmentation_event_cancel_indicator` is set
        detail: Option<SegmentationDetail>,
    },
    /// `time_descriptor()` (0x03)
    Time {
        /// `identifier`
        identifier: u32,
        /// `TAI_seconds`
        tai_seconds: u64,
        /// `TAI_ns`
        tai_ns: u32,
        /// `UTC_offset`
        utc_offset: u16,
    },
    /// `audio_descriptor()` (0x04)
    Audio {
        /// `identifier`
        identifier: u32,
        /// One entry per audio component
        components: Vec<AudioComponent>,
    },
    /// Any other tag, skipped by its length
    Unknown {
        /// `splice_descriptor_tag`
        tag: u8,
        /// Bytes after `descriptor_length`
        data: Bytes,
    },
}

/// Segmentation types followed by sub segment fields
const SUB_SEGMENT_TYPES: [u8; 6] = [0x34, 0x36, 0x38, 0x3A, 0x44, 0x46];

impl SpliceDescriptor {
    /// `splice_descriptor_tag` of this descriptor
    pub fn tag(&self) -> u8 {
        match self {
            SpliceDescriptor::Avail { .. } => 0x00,
            SpliceDescriptor::Dtmf { .. } => 0x01,
            SpliceDescriptor::Segmentation { .. } => 0x02,
            SpliceDescriptor::Time { .. } => 0x03,
            SpliceDescriptor::Audio { .. } => 0x04,
            SpliceDescriptor::Unknown { tag, .. } => *tag,
        }
    }

    /// Splits a descriptor loop. Each descriptor is bounded by its own
    /// `descriptor_length`.
    pub(crate) fn read_loop(mut data: Bytes) -> io::Result<Vec<SpliceDescriptor>> {
        let mut descriptors = Vec::new();

        while data.len() >= 2 {
            let tag = data[0];
            let length = data[1] as usize;
            if data.len() < 2 + length {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "splice descriptor overruns descriptor loop",
                ));
            }

            let body = data.slice(2..2 + length);
            data = data.split_off(2 + length);
            descriptors.push(Self::read(tag, body)?);
        }

        Ok(descriptors)
    }

    fn read(tag: u8, body: Bytes) -> io::Result<Self> {
        if tag > 0x04 {
            return Ok(SpliceDescriptor::Unknown { tag, data: body });
        }

        let mut reader = BitReader::new(&body);
        let identifier = reader.read_bits(32)?;

        Ok(match tag {
            0x00 => SpliceDescriptor::Avail {
                identifier,
                provider_avail_id: reader.read_bits(32)?,
            },
            0x01 => {
                let preroll = reader.read_u8()?;
                let dtmf_count = reader.read_bits(3)?;
                reader.skip_bits(5)?;
                let mut dtmf_chars = String::with_capacity(dtmf_count as usize);
                for _ in 0..dtmf_count {
                    dtmf_chars.push(reader.read_u8()? as char);
                }
                SpliceDescriptor::Dtmf {
                    identifier,
                    preroll,
                    dtmf_chars,
                }
            }
            0x02 => read_segmentation(identifier, &mut reader, &body)?,
            0x03 => SpliceDescriptor::Time {
                identifier,
                tai_seconds: reader.read_bits_u64(48)?,
                tai_ns: reader.read_bits(32)?,
                utc_offset: reader.read_bits(16)? as u16,
            },
            _ => {
                let audio_count = reader.read_bits(4)?;
                reader.skip_bits(4)?;
                let mut components = Vec::with_capacity(audio_count as usize);
                for _ in 0..audio_count {
                    let component_tag = reader.read_u8()?;
                    let iso_code = [reader.read_u8()?, reader.read_u8()?, reader.read_u8()?];
                    components.push(AudioComponent {
                        component_tag,
                        iso_code: String::from_utf8_lossy(&iso_code).into_owned(),
                        bit_stream_mode: reader.read_bits(3)? as u8,
                        num_channels: reader.read_bits(4)? as u8,
                        full_service_audio: reader.read_bit()?,
                    });
                }
                SpliceDescriptor::Audio { identifier, components }
            }
        })
    }
}

fn read_segmentation(identifier: u32, reader: &mut BitReader<'_>, body: &Bytes) -> io::Result<SpliceDescriptor> {
    let segmentation_event_id = reader.read_bits(32)?;
    let cancel = reader.read_bit()?;
    reader.skip_bits(7)?;
    if cancel {
        return Ok(SpliceDescriptor::Segmentation {
            identifier,
            segmentation_event_id,
            detail: None,
        });
    }

    let program_segmentation = reader.read_bit()?;
    let duration_flag = reader.read_bit()?;
    let delivery_not_restricted = reader.read_bit()?;
    let delivery_restrictions = if delivery_not_restricted {
        reader.skip_bits(5)?;
        None
    } else {
        Some(DeliveryRestrictions {
            web_delivery_allowed: reader.read_bit()?,
            no_regional_blackout: reader.read_bit()?,
            archive_allowed: reader.read_bit()?,
            device_restrictions: reader.read_bits(2)? as u8,
        })
    };

    let mut components = Vec::new();
    if !program_segmentation {
        let component_count = reader.read_u8()?;
        for _ in 0..component_count {
            let component_tag = reader.read_u8()?;
            reader.skip_bits(7)?;
            components.push(SegmentationComponent {
                component_tag,
                pts_offset: reader.read_bits_u64(33)?,
            });
        }
    }

    let segmentation_duration = duration_flag.then(|| reader.read_bits_u64(40)).transpose()?;
    let upid_type = reader.read_u8()?;
    let upid_length = reader.read_u8()? as usize;
    let upid_start = reader.byte_offset();
    reader.skip_bits(upid_length * 8)?;
    let upid = body.slice(upid_start..upid_start + upid_length);

    let segmentation_type_id = reader.read_u8()?;
    let segment_num = reader.read_u8()?;
    let segments_expected = reader.read_u8()?;
    let sub_segments = if SUB_SEGMENT_TYPES.contains(&segmentation_type_id) && reader.bits_left() >= 16 {
        Some((reader.read_u8()?, reader.read_u8()?))
    } else {
        None
    };

    Ok(SpliceDescriptor::Segmentation {
        identifier,
        segmentation_event_id,
        detail: Some(SegmentationDetail {
            delivery_restrictions,
            components,
            segmentation_duration,
            upid_type,
            upid,
            segmentation_type_id,
            segment_num,
            segments_expected,
            sub_segments,
        }),
    })
}
