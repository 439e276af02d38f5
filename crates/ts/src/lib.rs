//! MPEG-2 Transport Stream (ISO/IEC 13818-1) transport layer
//!
//! This crate frames a byte stream into transport packets, reassembles PES
//! packets and PSI sections per PID and tracks the PAT -> PMT mapping of a
//! single program. Elementary stream contents are left to the codec crates.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod descriptor;
pub mod error;
pub mod packet;
pub mod pat;
pub mod pes;
pub mod pmt;
pub mod probe;
pub mod psi;
pub mod queue;
pub mod stream_type;
pub mod tracker;

pub use descriptor::Descriptor;
pub use error::TsError;
pub use packet::{BDAV_PACKET_SIZE, PID_NULL, PID_PAT, SYNC_BYTE, TS_PACKET_SIZE, TsPacket};
pub use pat::{Pat, PatProgram};
pub use pes::{PesPacket, TIMESTAMP_MASK};
pub use pmt::{Pmt, PmtStream};
pub use probe::{ProbeResult, probe};
pub use queue::{PidQueue, QueuedUnit, UnitFraming};
pub use stream_type::{StreamKind, StreamType};
pub use tracker::{PatUpdate, PmtUpdate, ProgramTracker};

/// Result type for TS parsing operations
pub type Result<T> = std::result::Result<T, TsError>;

