use bytes::Bytes;

use crate::track::{AUDIO_TRACK_ID, TIMESCALE};

/// Video codec family of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// H.264, `avcC` config
    Avc,
    /// H.265, `hvcC` config
    Hevc,
    /// AV1, `av1C` config
    Av1,
}

/// Audio codec family of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// AAC from ADTS or LOAS, AudioSpecificConfig
    Aac,
    /// AC-3, `dac3` style config
    Ac3,
}

/// Frame rate announced by the bitstream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    /// Frames are evenly spaced
    pub fixed: bool,
    /// `fps_num / fps_den`
    pub fps: f64,
    /// Numerator
    pub fps_num: u32,
    /// Denominator
    pub fps_den: u32,
}

impl FrameRate {
    pub(crate) fn new(fixed: bool, fps_num: u32, fps_den: u32) -> Option<Self> {
        (fps_num != 0 && fps_den != 0).then(|| Self {
            fixed,
            fps: fps_num as f64 / fps_den as f64,
            fps_num,
            fps_den,
        })
    }
}

/// Initialization data for the video track
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Always [`crate::VIDEO_TRACK_ID`]
    pub id: u32,
    /// Always [`TIMESCALE`]
    pub timescale: u32,
    /// Codec family
    pub codec: VideoCodec,
    /// RFC 6381 codec string
    pub codec_string: String,
    /// Coded width after cropping
    pub codec_width: u32,
    /// Coded height after cropping
    pub codec_height: u32,
    /// Width once the sample aspect ratio is applied
    pub present_width: u32,
    /// Display height
    pub present_height: u32,
    /// Profile name or number
    pub profile: String,
    /// Level
    pub level: String,
    /// Luma bit depth
    pub bit_depth: u8,
    /// `chroma_format_idc`: 0 mono, 1 4:2:0, 2 4:2:2, 3 4:4:4
    pub chroma_format: u8,
    /// Sample aspect ratio `(width, height)`
    pub sar: (u32, u32),
    /// Frame rate, when the bitstream announces one
    pub frame_rate: Option<FrameRate>,
    /// Reference frames, when the bitstream announces them
    pub ref_frames: Option<u32>,
    /// Decoder configuration record (`avcC`, `hvcC` or `av1C` payload)
    pub config: Bytes,
}

/// Initialization data for the audio track
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMetadata {
    /// Always [`AUDIO_TRACK_ID`]
    pub id: u32,
    /// Always [`TIMESCALE`]
    pub timescale: u32,
    /// Codec family
    pub codec: AudioCodec,
    /// Codec string advertised to decoders
    pub codec_string: String,
    /// Codec string signalled by the source
    pub original_codec_string: String,
    /// Sampling frequency in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channel_count: u8,
    /// AudioSpecificConfig or AC-3 config bytes
    pub config: Bytes,
    /// Duration of one frame in milliseconds
    pub ref_sample_duration: f64,
}

impl AudioMetadata {
    pub(crate) fn new(
        codec: AudioCodec,
        codec_string: String,
        original_codec_string: String,
        sample_rate: u32,
        channel_count: u8,
        config: Bytes,
        samples_per_frame: u32,
    ) -> Self {
        Self {
            id: AUDIO_TRACK_ID,
            timescale: TIMESCALE,
            codec,
            codec_string,
            original_codec_string,
            sample_rate,
            channel_count,
            config,
            ref_sample_duration: samples_per_frame as f64 * TIMESCALE as f64 / sample_rate.max(1) as f64,
        }
    }
}

/// Metadata announced through `on_track_metadata`
#[derive(Debug, Clone, PartialEq)]
pub enum TrackMetadata {
    /// Video track initialization
    Video(VideoMetadata),
    /// Audio track initialization
    Audio(AudioMetadata),
}

/// Summary of the tracked program once every announced track is known
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfo {
    /// `video/mp2t; codecs="..."`
    pub mime_type: String,
    /// The program announces a video stream
    pub has_video: bool,
    /// The program announces an audio stream
    pub has_audio: bool,
    /// Video codec string
    pub video_codec: Option<String>,
    /// Audio codec string
    pub audio_codec: Option<String>,
    /// Coded width
    pub width: Option<u32>,
    /// Coded height
    pub height: Option<u32>,
    /// Frame rate
    pub fps: Option<f64>,
    /// Video profile
    pub profile: Option<String>,
    /// Video level
    pub level: Option<String>,
    /// Video chroma format
    pub chroma_format: Option<u8>,
    /// Sample aspect ratio
    pub sar: Option<(u32, u32)>,
    /// Audio sampling frequency
    pub audio_sample_rate: Option<u32>,
    /// Audio channel count
    pub audio_channel_count: Option<u8>,
}

impl MediaInfo {
    /// Combines the track metadata of a program.
    pub fn new(has_video: bool, has_audio: bool, video: Option<&VideoMetadata>, audio: Option<&AudioMetadata>) -> Self {
        let codecs: Vec<&str> = [
            video.map(|v| v.codec_string.as_str()),
            audio.map(|a| a.codec_string.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mime_type = if codecs.is_empty() {
            "video/mp2t".to_string()
        } else {
            format!("video/mp2t; codecs=\"{}\"", codecs.join(","))
        };

        Self {
            mime_type,
            has_video,
            has_audio,
            video_codec: video.map(|v| v.codec_string.clone()),
            audio_codec: audio.map(|a| a.codec_string.clone()),
            width: video.map(|v| v.codec_width),
            height: video.map(|v| v.codec_height),
            fps: video.and_then(|v| v.frame_rate).map(|rate| rate.fps),
            profile: video.map(|v| v.profile.clone()),
            level: video.map(|v| v.level.clone()),
            chroma_format: video.map(|v| v.chroma_format),
            sar: video.map(|v| v.sar),
            audio_sample_rate: audio.map(|a| a.sample_rate),
            audio_channel_count: audio.map(|a| a.channel_count),
        }
    }
}
