use std::path::PathBuf;

use aac::AacProfilePreference;
use clap::Parser;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Demux an MPEG-2 transport stream and report what it carries",
    long_about = "Probes the packet layout of a transport stream file, feeds it to the demuxer\n\
                  in fixed-size chunks and logs track metadata, media info, sample batches and\n\
                  timed metadata as they are produced."
)]
pub struct CliArgs {
    /// Transport stream file to read
    #[arg(required = true, help = "Path to a .ts or .m2ts file")]
    pub input: PathBuf,

    /// Bytes read per parse call
    #[arg(
        short,
        long,
        default_value_t = 64 * 1024,
        help = "Number of bytes handed to the demuxer per call"
    )]
    pub chunk_size: usize,

    /// Program to follow
    #[arg(short, long, help = "Program number to demux (default: first program in the PAT)")]
    pub program: Option<u16>,

    /// AudioSpecificConfig object type policy
    #[arg(
        short,
        long,
        default_value = "auto",
        help = "AAC object type announced in the audio config: auto, lc or he"
    )]
    pub aac_profile: AacProfilePreference,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
