//! Splits audio PES payloads into frames.
//!
//! The first frame of a PES takes the PES pts, the following ones are
//! extrapolated by the codec's samples per frame. A PES without pts
//! continues from the frame before it. Bytes of a frame cut by the end of
//! the PES are copied and prepended to the next PES.

use aac::{AAC_SAMPLES_PER_FRAME, AacFrame, AacProfilePreference, AdtsParser, AudioSpecificConfig, LoasParser, StreamMuxConfig};
use ac3::{AC3_SAMPLES_PER_FRAME, Ac3Config, Ac3Parser};
use bytes::{Bytes, BytesMut};
use tracing::trace;
use ts::StreamKind;

use crate::media_info::{AudioCodec, AudioMetadata};
use crate::track::{AudioSample, ticks_to_ms};

const PTS_CLOCK: u64 = 90_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AudioFormat {
    Adts,
    Loas,
    Ac3,
}

impl AudioFormat {
    pub(crate) fn for_kind(kind: &StreamKind) -> Option<Self> {
        match kind {
            StreamKind::AdtsAac => Some(AudioFormat::Adts),
            StreamKind::LoasAac => Some(AudioFormat::Loas),
            StreamKind::Ac3 => Some(AudioFormat::Ac3),
            _ => None,
        }
    }

    fn kind(&self) -> StreamKind {
        match self {
            AudioFormat::Adts => StreamKind::AdtsAac,
            AudioFormat::Loas => StreamKind::LoasAac,
            AudioFormat::Ac3 => StreamKind::Ac3,
        }
    }

    fn samples_per_frame(&self) -> u32 {
        match self {
            AudioFormat::Adts | AudioFormat::Loas => AAC_SAMPLES_PER_FRAME,
            AudioFormat::Ac3 => AC3_SAMPLES_PER_FRAME,
        }
    }
}

/// Output of one PES, in stream order. A `Metadata` event applies to the
/// samples after it.
#[derive(Debug)]
pub(crate) enum AudioEvent {
    Metadata(AudioMetadata),
    Sample(AudioSample),
}

/// A decoded frame before timing is applied
struct RawFrame {
    data: Bytes,
    metadata: AudioMetadata,
}

#[derive(Debug)]
pub(crate) struct AudioState {
    format: AudioFormat,
    preference: AacProfilePreference,
    tail: Option<Bytes>,
    next_pts: Option<u64>,
    mux_config: Option<StreamMuxConfig>,
    metadata: Option<AudioMetadata>,
}

impl AudioState {
    pub(crate) fn new(format: AudioFormat, preference: AacProfilePreference) -> Self {
        Self {
            format,
            preference,
            tail: None,
            next_pts: None,
            mux_config: None,
            metadata: None,
        }
    }

    pub(crate) fn kind(&self) -> StreamKind {
        self.format.kind()
    }

    pub(crate) fn process(&mut self, payload: Bytes, pts: Option<u64>) -> Vec<AudioEvent> {
        let data = match self.tail.take() {
            Some(tail) => {
                let mut joined = BytesMut::with_capacity(tail.len() + payload.len());
                joined.extend_from_slice(&tail);
                joined.extend_from_slice(&payload);
                joined.freeze()
            }
            None => payload,
        };

        let (frames, incomplete) = self.split_frames(data);
        if let Some(incomplete) = incomplete {
            trace!("carrying {} bytes of a cut audio frame", incomplete.len());
            self.tail = Some(Bytes::copy_from_slice(&incomplete));
        }

        let Some(base_pts) = pts.or(self.next_pts) else {
            if !frames.is_empty() {
                trace!("dropping {} audio frames without timing", frames.len());
            }
            return Vec::new();
        };

        let samples_per_frame = self.format.samples_per_frame() as u64;
        let mut events = Vec::with_capacity(frames.len() + 1);
        let mut frame_pts = base_pts;
        for frame in frames {
            if self.metadata.as_ref() != Some(&frame.metadata) {
                self.metadata = Some(frame.metadata.clone());
                events.push(AudioEvent::Metadata(frame.metadata.clone()));
            }

            let time = ticks_to_ms(frame_pts);
            events.push(AudioEvent::Sample(AudioSample {
                data: frame.data,
                dts: time,
                pts: time,
            }));
            frame_pts += samples_per_frame * PTS_CLOCK / frame.metadata.sample_rate.max(1) as u64;
        }
        self.next_pts = Some(frame_pts);

        events
    }

    fn split_frames(&mut self, data: Bytes) -> (Vec<RawFrame>, Option<Bytes>) {
        let mut frames = Vec::new();
        match self.format {
            AudioFormat::Adts => {
                let mut parser = AdtsParser::new(data);
                while let Some(frame) = parser.read_next_frame() {
                    frames.push(self.aac_frame(frame));
                }
                (frames, parser.incomplete_data())
            }
            AudioFormat::Loas => {
                let mut parser = LoasParser::new(data);
                while let Some(frame) = parser.read_next_frame(self.mux_config.as_ref()) {
                    if let AacFrame::Loas { mux_config, .. } = &frame {
                        self.mux_config = Some(*mux_config);
                    }
                    frames.push(self.aac_frame(frame));
                }
                (frames, parser.incomplete_data())
            }
            AudioFormat::Ac3 => {
                let mut parser = Ac3Parser::new(data);
                while let Some(frame) = parser.read_next_frame() {
                    let config = Ac3Config::new(&frame.header);
                    frames.push(RawFrame {
                        data: frame.data,
                        metadata: AudioMetadata::new(
                            AudioCodec::Ac3,
                            config.codec_string().to_string(),
                            config.codec_string().to_string(),
                            config.sampling_frequency,
                            config.channel_count,
                            config.config,
                            AC3_SAMPLES_PER_FRAME,
                        ),
                    });
                }
                (frames, parser.incomplete_data())
            }
        }
    }

    fn aac_frame(&self, frame: AacFrame) -> RawFrame {
        let config = AudioSpecificConfig::new(frame.header(), self.preference);
        RawFrame {
            data: frame.data().clone(),
            metadata: AudioMetadata::new(
                AudioCodec::Aac,
                config.codec_string(),
                config.original_codec_string(),
                config.sampling_frequency,
                config.channel_count,
                config.config,
                AAC_SAMPLES_PER_FRAME,
            ),
        }
    }
}
