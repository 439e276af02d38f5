//! # ts-demux
//!
//! A streaming MPEG-2 transport stream demuxer. It follows one program
//! through its PAT and PMT and turns the elementary streams into codec
//! ready samples, track metadata and timed metadata records.
//!
//! ## Features
//!
//! - 188 byte TS and 192 byte BDAV/M2TS packets, found by probing
//! - H.264, H.265 and AV1 video with `avcC`/`hvcC`/`av1C` configuration
//! - ADTS and LOAS AAC, AC-3 audio
//! - Timed ID3, KLV, SMPTE 2038, SCTE-35, PGS and private PES records
//! - Incremental input: every call reports how many bytes it consumed
//!
//! ```
//! use bytes::Bytes;
//! use ts_demux::{AudioTrack, DemuxerConfig, DemuxerHandler, ErrorKind, MediaInfo, TrackMetadata, TsDemuxer, VideoTrack};
//!
//! #[derive(Default)]
//! struct Counter {
//!     samples: usize,
//! }
//!
//! impl DemuxerHandler for Counter {
//!     fn on_error(&mut self, _kind: ErrorKind, _info: &str) {}
//!     fn on_media_info(&mut self, _info: &MediaInfo) {}
//!     fn on_track_metadata(&mut self, _metadata: &TrackMetadata) {}
//!     fn on_data_available(&mut self, audio: &mut AudioTrack, video: &mut VideoTrack) {
//!         self.samples += audio.take_samples().len() + video.take_samples().len();
//!     }
//! }
//!
//! // four null packets
//! let mut stream = Vec::new();
//! for _ in 0..4 {
//!     let mut packet = vec![0xFF; 188];
//!     packet[..4].copy_from_slice(&[0x47, 0x1F, 0xFF, 0x10]);
//!     stream.extend(packet);
//! }
//!
//! let mut demuxer = TsDemuxer::new(DemuxerConfig::default());
//! assert!(demuxer.probe(&stream).is_match());
//!
//! let mut handler = Counter::default();
//! let consumed = demuxer.parse_chunks(Bytes::from(stream), 0, &mut handler).unwrap();
//! assert_eq!(consumed, 4 * 188);
//! assert_eq!(handler.samples, 0);
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

mod audio;
pub mod config;
pub mod demuxer;
pub mod error;
pub mod handler;
pub mod media_info;
#[cfg(test)]
mod test_utils;
pub mod track;
mod video;

pub use config::{DemuxerConfig, DemuxerConfigBuilder};
pub use demuxer::TsDemuxer;
pub use error::{DemuxError, ErrorKind, Result};
pub use handler::DemuxerHandler;
pub use media_info::{AudioCodec, AudioMetadata, FrameRate, MediaInfo, TrackMetadata, VideoCodec, VideoMetadata};
pub use track::{AUDIO_TRACK_ID, AudioSample, AudioTrack, TIMESCALE, Track, VIDEO_TRACK_ID, VideoSample, VideoTrack};
pub use ts::ProbeResult;
pub use ts_metadata;
