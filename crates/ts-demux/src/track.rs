use bytes::Bytes;

/// Track id of the video track
pub const VIDEO_TRACK_ID: u32 = 1;
/// Track id of the audio track
pub const AUDIO_TRACK_ID: u32 = 2;

/// Samples are timed in milliseconds
pub const TIMESCALE: u32 = 1000;

const TICKS_PER_MS: u64 = 90;

/// Converts a 90 kHz timestamp into sample time.
pub(crate) fn ticks_to_ms(ticks: u64) -> i64 {
    (ticks / TICKS_PER_MS) as i64
}

/// One video access unit, NAL units length prefixed or OBUs in low
/// overhead format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSample {
    /// Sample payload
    pub data: Bytes,
    /// Decode time in milliseconds
    pub dts: i64,
    /// Presentation time in milliseconds
    pub pts: i64,
    /// `pts - dts`
    pub cts: i64,
    /// Sync sample
    pub is_keyframe: bool,
    /// Stream offset of the packet that started the PES
    pub file_position: u64,
}

/// One audio frame without transport framing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSample {
    /// Raw frame
    pub data: Bytes,
    /// Decode time in milliseconds
    pub dts: i64,
    /// Presentation time in milliseconds
    pub pts: i64,
}

/// Samples of one track waiting for the consumer.
///
/// The handler drains `samples` in `on_data_available`; anything it leaves
/// behind is delivered again with the next batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track<S> {
    /// [`VIDEO_TRACK_ID`] or [`AUDIO_TRACK_ID`]
    pub id: u32,
    /// Number of batches handed out so far
    pub sequence_number: u64,
    /// Pending samples, in arrival order
    pub samples: Vec<S>,
    /// Payload bytes of `samples`
    pub length: usize,
}

/// Pending video samples
pub type VideoTrack = Track<VideoSample>;
/// Pending audio samples
pub type AudioTrack = Track<AudioSample>;

impl<S> Track<S> {
    /// Creates an empty track
    pub fn new(id: u32) -> Self {
        Self {
            id,
            sequence_number: 0,
            samples: Vec::new(),
            length: 0,
        }
    }

    /// True when samples are waiting
    pub fn has_samples(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Takes every pending sample
    pub fn take_samples(&mut self) -> Vec<S> {
        self.length = 0;
        std::mem::take(&mut self.samples)
    }
}

impl VideoTrack {
    pub(crate) fn push(&mut self, sample: VideoSample) {
        self.length += sample.data.len();
        self.samples.push(sample);
    }
}

impl AudioTrack {
    pub(crate) fn push(&mut self, sample: AudioSample) {
        self.length += sample.data.len();
        self.samples.push(sample);
    }
}
