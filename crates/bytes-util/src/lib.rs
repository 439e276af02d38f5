//! Bit and byte level helpers shared by the elementary stream parsers.
//!
//! - [`BitReader`]: MSB-first cursor over a borrowed slice that never reads past its end.
//! - [`BitWriter`]: MSB-first writer used by the configuration record builders.
//! - [`ebsp_to_rbsp`]: emulation prevention removal (`00 00 03` -> `00 00`).
//! - [`find_start_code`]: Annex-B style `00 00 01` / `00 00 00 01` search.
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

mod bit_read;
mod bit_write;
mod emulation;
mod start_code;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
pub use emulation::ebsp_to_rbsp;
pub use start_code::{StartCode, find_start_code};
