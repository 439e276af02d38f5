use std::fmt;

use thiserror::Error;
use ts::TsError;

/// Errors returned by [`crate::TsDemuxer`].
///
/// Malformed stream content is never returned from `parse_chunks`; it is
/// logged and, where a consumer can act on it, reported through
/// [`crate::DemuxerHandler::on_error`].
#[derive(Error, Debug)]
pub enum DemuxError {
    /// `parse_chunks` was called before a successful probe
    #[error("Transport stream layout unknown, probe the stream first")]
    NotProbed,
    /// The probed bytes are not a transport stream
    #[error("Not a transport stream: no 188 or 192 byte packet cadence found")]
    NotTransportStream,
    /// Transport layer parse failure
    #[error("Transport stream error: {0}")]
    Ts(#[from] TsError),
    /// Elementary stream or metadata decode failure
    #[error("Decode error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for demuxer operations
pub type Result<T> = std::result::Result<T, DemuxError>;

/// Category of a problem reported through `on_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The program carries a codec the demuxer does not handle
    CodecUnsupported,
    /// A codec configuration could not be decoded
    FormatError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CodecUnsupported => f.write_str("CodecUnsupported"),
            ErrorKind::FormatError => f.write_str("FormatError"),
        }
    }
}
