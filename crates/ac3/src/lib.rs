//! AC-3 (ATSC A/52) sync frame parsing.
//!
//! Splits an AC-3 elementary stream into sync frames, decodes the fields of
//! the bit stream information a remuxer needs and packs them into the
//! `dac3` configuration block.
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
mod frame;
mod parser;

pub use config::Ac3Config;
pub use frame::{AC3_SAMPLES_PER_FRAME, Ac3Frame, Ac3FrameHeader};
pub use parser::Ac3Parser;
