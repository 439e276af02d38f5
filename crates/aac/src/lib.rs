//! AAC elementary stream handling for MPEG-TS demuxing.
//!
//! Splits ADTS and LOAS/LATM framed AAC into raw access units and builds
//! the MPEG-4 AudioSpecificConfig a fragmented container expects.
//!
//! ## Example
//!
//! ```rust
//! use aac::{AacProfilePreference, AdtsParser, AudioSpecificConfig};
//! use bytes::Bytes;
//!
//! // LC, 44.1 kHz, stereo, 2 byte payload
//! let data = Bytes::from_static(&[0xFF, 0xF1, 0x50, 0x80, 0x01, 0x3F, 0xFC, 0xDE, 0xAD]);
//! let mut parser = AdtsParser::new(data);
//! let frame = parser.read_next_frame().unwrap();
//! assert_eq!(frame.data().as_ref(), &[0xDE, 0xAD]);
//!
//! let config = AudioSpecificConfig::new(frame.header(), AacProfilePreference::Lc);
//! assert_eq!(config.config.as_ref(), &[0x12, 0x10]);
//! assert_eq!(config.codec_string(), "mp4a.40.2");
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod adts;
mod config;
mod frame;
mod loas;

pub use adts::AdtsParser;
pub use config::{AacProfilePreference, AudioObjectType, AudioSpecificConfig, PartialAudioSpecificConfig, SampleFrequencyIndex};
pub use frame::{AAC_SAMPLES_PER_FRAME, AacFrame, AacFrameHeader};
pub use loas::{LoasParser, StreamMuxConfig};
