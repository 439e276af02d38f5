//! AV1 video headers as carried in MPEG-2 transport streams.
//!
//! - [`StartCodeObuParser`] lifts start code delimited OBUs out of a PES
//!   payload and undoes emulation prevention.
//! - [`seq::SequenceHeader`] and [`FrameHeader`] decode the headers a
//!   remuxer needs: profile, level, tier, bit depth, chroma format, frame
//!   rate and per key frame size including super-resolution.
//! - [`AV1CodecConfigurationRecord`] parses and builds `av1C`.
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

mod config;
mod obu;
mod start_code;

pub use config::AV1CodecConfigurationRecord;
pub use obu::frame::{FrameHeader, FrameSize, FrameType};
pub use obu::{ObuExtensionHeader, ObuHeader, ObuType, seq};
pub use start_code::{Av1Obu, StartCodeObuParser, to_sample};
