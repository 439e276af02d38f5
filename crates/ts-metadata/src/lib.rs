//! Decoders for the timed metadata carried next to audio and video in a
//! transport stream.
//!
//! - [`scte35`]: splice information sections with typed commands and descriptors.
//! - [`KlvData`]: metadata access unit cells of KLV streams.
//! - [`Smpte2038Data`]: SMPTE 2038 ancillary data packets.
//! - [`PesPrivateData`], [`PgsData`], [`TimedId3Data`]: payloads handed on untouched.
//!
//! All decoders are stateless and keep their payloads as views into the
//! input [`bytes::Bytes`].
//!
//! ```
//! use bytes::Bytes;
//! use ts_metadata::KlvData;
//!
//! let payload = Bytes::from_static(&[0x00, 0x01, 0x00, 0x00, 0x02, 0x06, 0x0E]);
//! let klv = KlvData::new(0x100, 0xFC, Some(900), None, payload);
//! assert_eq!(klv.access_units[0].data.as_ref(), &[0x06, 0x0E]);
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

mod klv;
mod records;
pub mod scte35;
mod smpte2038;

pub use klv::{KlvAccessUnit, KlvData};
pub use records::{PesPrivateData, PesPrivateDataDescriptor, PgsData, TimedId3Data};
pub use scte35::{Scte35Data, SpliceCommand, SpliceDescriptor, SpliceInfoSection};
pub use smpte2038::{Ancillary, Smpte2038Data};
