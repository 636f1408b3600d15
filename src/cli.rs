use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

pub mod inspect;

use crate::config::SnapshotConfig;
use crate::util::parse_u64_auto;

#[derive(Parser, Debug)]
#[command(
    name = "dartsnap",
    version,
    about = "Dart VM snapshot inspector (header, clusters, reference table)",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Parse a VM snapshot (and optionally an isolate snapshot on top of it) and print a summary.
    Summary {
        #[arg(long)]
        vm: PathBuf,
        #[arg(long)]
        isolate: Option<PathBuf>,
        /// Instructions image offset (dec or 0x hex)
        #[arg(long, value_parser = parse_offset)]
        instructions_offset: Option<u64>,
        /// Fail on object-count mismatches instead of warning
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        json: bool,
        /// Append process parse counters to the output
        #[arg(long)]
        metrics: bool,
    },
    /// Parse only the header of a snapshot file.
    Header {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Dump a window of the reference table.
    Refs {
        #[arg(long)]
        vm: PathBuf,
        #[arg(long)]
        isolate: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        from: usize,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Append process parse counters to the output
        #[arg(long)]
        metrics: bool,
    },
}

fn parse_offset(s: &str) -> std::result::Result<u64, String> {
    parse_u64_auto(s)
}

pub fn run() -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(Cli::parse(), &mut out)
}

/// Parse `args` (argv[0] included) and write the command output into `out`.
pub fn run_from<I, T, W>(args: I, out: &mut W) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    let cli = Cli::try_parse_from(args)?;
    execute(cli, out)
}

fn execute<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match cli.cmd {
        Cmd::Summary {
            vm,
            isolate,
            instructions_offset,
            strict,
            json,
            metrics,
        } => {
            let mut cfg = SnapshotConfig::from_env();
            if instructions_offset.is_some() {
                cfg = cfg.with_instructions_offset(instructions_offset);
            }
            if strict {
                cfg = cfg.with_strict_counts(true);
            }
            inspect::cmd_summary(out, vm, isolate, &cfg.build(), json, metrics)?;
        }
        Cmd::Header { path, json } => {
            inspect::cmd_header(out, path, json)?;
        }
        Cmd::Refs {
            vm,
            isolate,
            from,
            limit,
            metrics,
        } => {
            let cfg = SnapshotConfig::from_env();
            inspect::cmd_refs(out, vm, isolate, &cfg, from, limit, metrics)?;
        }
    }
    out.flush()?;
    Ok(())
}
