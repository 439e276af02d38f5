//! H.264 elementary stream handling for transport stream demuxing.
//!
//! - [`AnnexBParser`] walks an Annex-B byte stream (one PES payload) and
//!   yields [`H264Nalu`]s, dropping units whose forbidden bit is set and
//!   reserved unit types.
//! - [`H264Nalu::to_avc1`] rewrites a unit to the 4-byte length prefixed form
//!   used by box based containers.
//! - [`SpsDetails`] decodes the fields of a sequence parameter set a remuxer
//!   needs (profile, level, size, sample aspect ratio, frame rate).
//! - [`AVCDecoderConfigurationRecord`] builds the `avcC` payload.
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use h264::{AnnexBParser, NALUnitType};
//!
//! let stream = Bytes::from_static(&[0, 0, 0, 1, 0x09, 0xF0, 0, 0, 1, 0x65, 0x88, 0x84]);
//! let units: Vec<_> = AnnexBParser::new(stream).collect();
//!
//! assert_eq!(units.len(), 2);
//! assert_eq!(units[0].nal_unit_type, NALUnitType::AccessUnitDelimiter);
//! assert_eq!(units[1].nal_unit_type, NALUnitType::IDRSliceLayerWithoutPartitioning);
//! assert_eq!(&units[1].to_avc1()[..], &[0, 0, 0, 3, 0x65, 0x88, 0x84]);
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod enums;
mod nal;
mod sps;

pub use enums::*;
pub use nal::{AnnexBParser, H264Nalu};
pub use sps::SpsDetails;

pub use self::config::{AVCDecoderConfigurationRecord, AvccExtendedConfig};
