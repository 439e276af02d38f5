use bytes::Bytes;
use tracing::trace;

use crate::{AacFrame, AacFrameHeader, AudioObjectType, SampleFrequencyIndex};

const ADTS_HEADER_LEN: usize = 7;
const ADTS_CRC_LEN: usize = 2;

/// Scans a buffer of ADTS framed AAC.
///
/// ISO/IEC 14496-3:2019(E) - 1.A.2.2
#[derive(Debug)]
pub struct AdtsParser {
    data: Bytes,
    offset: usize,
    sync_offset: usize,
    eof: bool,
    has_incomplete_data: bool,
}

impl AdtsParser {
    /// Creates a parser over `data`.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            sync_offset: 0,
            eof: false,
            has_incomplete_data: false,
        }
    }

    /// Returns the next complete frame, or `None` once no further complete
    /// frame exists. A frame cut short by the end of the buffer is never
    /// returned; see [`AdtsParser::incomplete_data`].
    pub fn read_next_frame(&mut self) -> Option<AacFrame> {
        let data = &self.data;

        while !self.eof && self.offset + 1 < data.len() {
            let offset = self.offset;
            let syncword = ((data[offset] as u16) << 4) | (data[offset + 1] as u16 >> 4);
            if syncword != 0xFFF {
                self.offset += 1;
                continue;
            }

            self.sync_offset = offset;
            let protection_absent = data[offset + 1] & 0x01 == 1;
            let header_len = if protection_absent {
                ADTS_HEADER_LEN
            } else {
                ADTS_HEADER_LEN + ADTS_CRC_LEN
            };

            if offset + header_len > data.len() {
                self.eof = true;
                self.has_incomplete_data = true;
                break;
            }

            let profile = data[offset + 2] >> 6;
            let sampling_frequency_index = SampleFrequencyIndex::from_index((data[offset + 2] >> 2) & 0x0F);
            let channel_config = ((data[offset + 2] & 0x01) << 2) | (data[offset + 3] >> 6);
            let aac_frame_length = (((data[offset + 3] & 0x03) as usize) << 11)
                | ((data[offset + 4] as usize) << 3)
                | ((data[offset + 5] & 0xE0) as usize >> 5);

            let Some(sampling_frequency) = sampling_frequency_index.to_freq() else {
                trace!("adts sync at {offset} has reserved sampling frequency index, rescanning");
                self.offset += 1;
                continue;
            };
            if aac_frame_length < header_len {
                trace!("adts sync at {offset} has frame length {aac_frame_length} shorter than its header, rescanning");
                self.offset += 1;
                continue;
            }

            if offset + aac_frame_length > data.len() {
                self.eof = true;
                self.has_incomplete_data = true;
                break;
            }

            self.offset = offset + aac_frame_length;
            return Some(AacFrame::Adts {
                header: AacFrameHeader {
                    audio_object_type: AudioObjectType::from((profile + 1) as u16),
                    sampling_frequency_index,
                    sampling_frequency,
                    channel_config,
                },
                data: data.slice(offset + header_len..offset + aac_frame_length),
            });
        }

        if !self.has_incomplete_data && self.offset + 1 == data.len() && data[self.offset] == 0xFF {
            // a lone first sync byte
            self.sync_offset = self.offset;
            self.has_incomplete_data = true;
        }
        self.eof = true;
        None
    }

    /// True once the scan stopped at a frame cut short by the buffer end.
    pub fn has_incomplete_data(&self) -> bool {
        self.has_incomplete_data
    }

    /// The unconsumed suffix starting at the truncated frame's sync word.
    pub fn incomplete_data(&self) -> Option<Bytes> {
        self.has_incomplete_data.then(|| self.data.slice(self.sync_offset..))
    }
}

impl Iterator for AdtsParser {
    type Item = AacFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_frame()
    }
}
