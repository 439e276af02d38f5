#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

use std::fs::File;
use std::io::Read;

use anyhow::{Context, Result, bail};
use bytes::BytesMut;
use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use ts_demux::{DemuxerConfig, ProbeResult, TsDemuxer};

mod cli;
mod report;

use cli::CliArgs;
use report::Report;

fn main() {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn run(args: &CliArgs) -> Result<()> {
    if args.chunk_size == 0 {
        bail!("--chunk-size must be greater than zero");
    }

    let mut builder = DemuxerConfig::builder().aac_profile(args.aac_profile);
    if let Some(program) = args.program {
        builder = builder.program_number(program);
    }
    let config = builder.build();
    info!("{config}");

    let mut file = File::open(&args.input).with_context(|| format!("Failed to open {}", args.input.display()))?;
    let mut demuxer = TsDemuxer::new(config);
    let mut report = Report::default();

    let mut pending = BytesMut::with_capacity(args.chunk_size * 2);
    let mut read_buf = vec![0u8; args.chunk_size];
    let mut position = 0u64;
    let mut probed = false;

    loop {
        let read = file.read(&mut read_buf).context("Failed to read input")?;
        let eof = read == 0;
        pending.extend_from_slice(&read_buf[..read]);

        if !probed {
            match demuxer.probe(&pending) {
                ProbeResult::Match {
                    packet_size,
                    sync_offset,
                } => {
                    info!("Detected {packet_size} byte packets, first packet at offset {sync_offset}");
                    probed = true;
                }
                ProbeResult::NeedMoreData if !eof => continue,
                ProbeResult::NeedMoreData | ProbeResult::NoMatch => {
                    bail!("{} is not an MPEG-2 transport stream", args.input.display())
                }
            }
        }

        let chunk = pending.split().freeze();
        let consumed = demuxer.parse_chunks(chunk.clone(), position, &mut report)?;
        debug!("Consumed {consumed} of {} bytes at offset {position}", chunk.len());
        pending.extend_from_slice(&chunk[consumed..]);
        position += consumed as u64;

        if consumed == 0 && demuxer.packet_size().is_some_and(|size| pending.len() >= size) {
            bail!("Lost packet sync at offset {position}");
        }

        if eof {
            if !pending.is_empty() {
                warn!("{} trailing bytes do not form a whole packet", pending.len());
            }
            break;
        }
    }

    demuxer.flush(&mut report);
    report.print_summary();
    Ok(())
}
