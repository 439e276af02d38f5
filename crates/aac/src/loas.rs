use std::io;

use bytes::Bytes;
use bytes_util::BitReader;
use tracing::{trace, warn};

use crate::{AacFrame, AacFrameHeader, AudioObjectType, PartialAudioSpecificConfig};

const LOAS_HEADER_LEN: usize = 3;

/// The parts of a LATM `StreamMuxConfig` needed to extract payloads of
/// subsequent frames that set `useSameStreamMux`.
///
/// ISO/IEC 14496-3:2019(E) - 1.7.3.1 (Table 1.42)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMuxConfig {
    /// Codec parameters from the embedded AudioSpecificConfig
    pub header: AacFrameHeader,
    /// `audioMuxVersion`
    pub audio_mux_version: u8,
    /// `allStreamsSameTimeFraming`
    pub all_streams_same_time_framing: bool,
    /// `otherDataPresent`
    pub other_data_present: bool,
    /// `otherDataLenBits`
    pub other_data_len_bits: u32,
}

/// Result of decoding the body of one AudioMuxElement.
enum MuxElement {
    Frame(AacFrame),
    Unsupported(&'static str),
}

/// Scans a buffer of LOAS (`AudioSyncStream`) framed AAC.
///
/// Only the single program, single layer, single sub frame layout with
/// `frameLengthType == 0` is supported. Anything else skips the unit.
#[derive(Debug)]
pub struct LoasParser {
    data: Bytes,
    offset: usize,
    sync_offset: usize,
    eof: bool,
    has_incomplete_data: bool,
}

impl LoasParser {
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

    /// Returns the next complete frame.
    ///
    /// `previous` is the mux config of the frame before this one. It is used
    /// when the unit sets `useSameStreamMux` and may be `None` for the very
    /// first frame of a stream.
    pub fn read_next_frame(&mut self, previous: Option<&StreamMuxConfig>) -> Option<AacFrame> {
        while !self.eof && self.offset + 1 < self.data.len() {
            let offset = self.offset;
            let data = &self.data;
            if data[offset] != 0x56 || data[offset + 1] & 0xE0 != 0xE0 {
                self.offset += 1;
                continue;
            }

            self.sync_offset = offset;
            if offset + LOAS_HEADER_LEN > data.len() {
                self.eof = true;
                self.has_incomplete_data = true;
                break;
            }

            let mux_length = (((data[offset + 1] & 0x1F) as usize) << 8) | data[offset + 2] as usize;
            let end = offset + LOAS_HEADER_LEN + mux_length;
            if end > data.len() {
                self.eof = true;
                self.has_incomplete_data = true;
                break;
            }

            let element = self.data.slice(offset + LOAS_HEADER_LEN..end);
            self.offset = end;

            match parse_audio_mux_element(&element, previous) {
                Ok(MuxElement::Frame(frame)) => return Some(frame),
                Ok(MuxElement::Unsupported(reason)) => {
                    warn!("skipping LOAS unit at {offset}: {reason}");
                }
                Err(err) => {
                    trace!("skipping malformed LOAS unit at {offset}: {err}");
                }
            }
        }

        if !self.has_incomplete_data && self.offset + 1 == self.data.len() && self.data[self.offset] == 0x56 {
            self.sync_offset = self.offset;
            self.has_incomplete_data = true;
        }
        self.eof = true;
        None
    }

    /// True once the scan stopped at a unit cut short by the buffer end.
    pub fn has_incomplete_data(&self) -> bool {
        self.has_incomplete_data
    }

    /// The unconsumed suffix starting at the truncated unit's sync word.
    pub fn incomplete_data(&self) -> Option<Bytes> {
        self.has_incomplete_data.then(|| self.data.slice(self.sync_offset..))
    }
}

/// `LatmGetValue()`, ISO/IEC 14496-3:2019(E) - 1.7.3.1 (Table 1.43)
fn latm_get_value(reader: &mut BitReader<'_>) -> io::Result<u32> {
    let bytes_for_value = reader.read_bits(2)?;
    let mut value = 0;
    for _ in 0..=bytes_for_value {
        value = (value << 8) | reader.read_bits(8)?;
    }
    Ok(value)
}

/// Skips the `GASpecificConfig` and `epConfig` that follow the leading ASC
/// fields so the reader lands on `frameLengthType`.
fn skip_asc_tail(reader: &mut BitReader<'_>, audio_object_type: u16, channel_config: u8) -> io::Result<()> {
    match audio_object_type {
        1..=4 | 6 | 7 | 17 | 19..=23 => {
            // frameLengthFlag
            reader.skip_bits(1)?;
            if reader.read_bit()? {
                // coreCoderDelay
                reader.skip_bits(14)?;
            }
            let extension_flag = reader.read_bit()?;
            if channel_config == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "program_config_element in LATM config",
                ));
            }
            if matches!(audio_object_type, 6 | 20) {
                // layerNr
                reader.skip_bits(3)?;
            }
            if extension_flag {
                if audio_object_type == 22 {
                    // numOfSubFrame, layer_length
                    reader.skip_bits(16)?;
                }
                if matches!(audio_object_type, 17 | 19 | 20 | 23) {
                    reader.skip_bits(3)?;
                }
                // extensionFlag3
                reader.skip_bits(1)?;
            }
        }
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported audio object type {audio_object_type} in LATM config"),
            ));
        }
    }

    if matches!(audio_object_type, 17 | 19..=27 | 39) {
        // epConfig
        reader.skip_bits(2)?;
    }

    Ok(())
}

/// Reads an AudioSpecificConfig, resolving explicit SBR/PS signalling down to
/// the core object type and core sampling frequency.
fn read_audio_specific_config(reader: &mut BitReader<'_>) -> io::Result<AacFrameHeader> {
    let asc = PartialAudioSpecificConfig::read(reader)?;
    let mut core_object_type = asc.audio_object_type.as_u16();

    if matches!(asc.audio_object_type, AudioObjectType::Sbr | AudioObjectType::Unknown(29)) {
        // extensionSamplingFrequencyIndex
        if reader.read_bits(4)? == 0x0F {
            reader.skip_bits(24)?;
        }
        core_object_type = reader.read_bits(5)? as u16;
        if core_object_type == 31 {
            core_object_type = 32 + reader.read_bits(6)? as u16;
        }
    }

    skip_asc_tail(reader, core_object_type, asc.channel_configuration)?;

    Ok(AacFrameHeader {
        audio_object_type: asc.audio_object_type,
        sampling_frequency_index: asc.sampling_frequency_index,
        sampling_frequency: asc.sampling_frequency,
        channel_config: asc.channel_configuration,
    })
}

/// `StreamMuxConfig()`. The inner `Err` names a layout this parser does not
/// handle.
fn read_stream_mux_config(reader: &mut BitReader<'_>) -> io::Result<Result<StreamMuxConfig, &'static str>> {
    let audio_mux_version = reader.read_bit()? as u8;
    let audio_mux_version_a = if audio_mux_version == 1 { reader.read_bit()? } else { false };
    if audio_mux_version_a {
        return Ok(Err("audioMuxVersionA is not supported"));
    }

    if audio_mux_version == 1 {
        // taraBufferFullness
        latm_get_value(reader)?;
    }

    let all_streams_same_time_framing = reader.read_bit()?;
    let num_sub_frames = reader.read_bits(6)?;
    let num_program = reader.read_bits(4)?;
    let num_layer = reader.read_bits(3)?;
    if num_sub_frames != 0 || num_program != 0 || num_layer != 0 {
        return Ok(Err("multiple sub frames, programs or layers are not supported"));
    }

    let header = if audio_mux_version == 0 {
        read_audio_specific_config(reader)?
    } else {
        let asc_len = latm_get_value(reader)? as usize;
        let start = reader.position();
        let header = read_audio_specific_config(reader)?;
        let used = reader.position() - start;
        if used > asc_len {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "AudioSpecificConfig overruns ascLen"));
        }
        // fillBits
        reader.skip_bits(asc_len - used)?;
        header
    };

    let frame_length_type = reader.read_bits(3)?;
    if frame_length_type != 0 {
        return Ok(Err("frameLengthType other than 0 is not supported"));
    }
    // latmBufferFullness
    reader.skip_bits(8)?;

    let other_data_present = reader.read_bit()?;
    let mut other_data_len_bits = 0;
    if other_data_present {
        if audio_mux_version == 1 {
            other_data_len_bits = latm_get_value(reader)?;
        } else {
            loop {
                let esc = reader.read_bit()?;
                other_data_len_bits = (other_data_len_bits << 8) + reader.read_bits(8)?;
                if !esc {
                    break;
                }
            }
        }
    }

    if reader.read_bit()? {
        // crcCheckSum
        reader.skip_bits(8)?;
    }

    Ok(Ok(StreamMuxConfig {
        header,
        audio_mux_version,
        all_streams_same_time_framing,
        other_data_present,
        other_data_len_bits,
    }))
}

/// `AudioMuxElement(muxConfigPresent = 1)` with a single `PayloadMux`.
fn parse_audio_mux_element(element: &Bytes, previous: Option<&StreamMuxConfig>) -> io::Result<MuxElement> {
    let mut reader = BitReader::new(element);

    let use_same_stream_mux = reader.read_bit()?;
    let mux_config = if use_same_stream_mux {
        match previous {
            Some(config) => *config,
            None => return Ok(MuxElement::Unsupported("useSameStreamMux set without a previous StreamMuxConfig")),
        }
    } else {
        match read_stream_mux_config(&mut reader)? {
            Ok(config) => config,
            Err(reason) => return Ok(MuxElement::Unsupported(reason)),
        }
    };

    // PayloadLengthInfo()
    let mut length = 0usize;
    loop {
        let tmp = reader.read_bits(8)? as usize;
        length += tmp;
        if tmp != 255 {
            break;
        }
    }

    if reader.bits_left() < length * 8 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "PayloadMux overruns the AudioMuxElement"));
    }

    let data = if reader.is_aligned() {
        let start = reader.byte_offset();
        element.slice(start..start + length)
    } else {
        let mut payload = Vec::with_capacity(length);
        for _ in 0..length {
            payload.push(reader.read_u8()?);
        }
        Bytes::from(payload)
    };

    Ok(MuxElement::Frame(AacFrame::Loas { mux_config, data }))
}
