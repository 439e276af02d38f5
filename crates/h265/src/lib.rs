//! H.265/HEVC elementary stream handling for transport stream demuxing.
//!
//! This crate started life as a fork of [scuffle_h265](https://crates.io/crates/scuffle_h265).
//! Credits goes to [scuffle](https://github.com/ScuffleCloud/scuffle)
//!
//! - [`AnnexBParser`] splits a PES payload into [`H265Nalu`]s.
//! - [`SpsDetails`], [`VpsDetails`] and [`PpsDetails`] decode the parameter
//!   set fields that end up in the track metadata and the `hvcC` record.
//! - [`HEVCDecoderConfigurationRecord`] parses and builds `hvcC`.
//!
//! ## Examples
//!
//! ```
//! use bytes::Bytes;
//! use h265::SpsDetails;
//!
//! # fn test() -> std::io::Result<()> {
//! let data = Bytes::from_static(b"\x42\x01\x01\x01\x40\x00\x00\x03\x00\x90\x00\x00\x03\x00\x00\x03\x00\x78\xa0\x03\xc0\x80\x11\x07\xcb\x96\xb4\xa4\x25\x92\xe3\x01\x6a\x02\x02\x02\x08\x00\x00\x03\x00\x08\x00\x00\x03\x00\xf3\x00\x2e\xf2\x88\x00\x02\x62\x5a\x00\x00\x13\x12\xd0\x20");
//! let sps = SpsDetails::parse(&data)?;
//! println!("{}x{} {}", sps.width, sps.height, sps.codec_string());
//! # Ok(())
//! # }
//! # test().unwrap();
//! ```
//!
//! ## License
//!
//! This project is licensed under the MIT or Apache-2.0 license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

mod config;
mod enums;
mod nal;
mod params;
mod sps;

pub use config::{HEVCDecoderConfigurationRecord, NaluArray};
pub use enums::*;
pub use nal::{AnnexBParser, H265Nalu};
pub use params::{PpsDetails, VpsDetails};
pub use sps::{GeneralProfile, SpsDetails};
