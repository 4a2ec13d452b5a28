use std::sync::Arc;

use clap::Parser;
use mavlib::Dialect;

mod common;
mod info;
mod pack;
mod parsedump;
mod unpack;

pub(crate) trait ToolRun {
    fn run(&self, dialect: Arc<Dialect>) -> anyhow::Result<()>;
}

#[derive(Parser, Debug)]
#[command(name = "mavtool", about = "Inspect and build MAVLink frames")]
struct ToolOptions {
    /// Load a generator-produced dialect JSON instead of the bundled
    /// common subset.
    #[arg(long, global = true)]
    dialect: Option<std::path::PathBuf>,

    /// More logging per repeat (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: ToolCommand,
}

#[derive(clap::Subcommand, Debug)]
enum ToolCommand {
    /// Parse a raw capture of link bytes and print every message.
    ParseDump(parsedump::ParseDumpOpts),
    /// Serialize a JSON message description into frame bytes.
    Pack(pack::PackOpts),
    /// Parse frames from a binary file and print them as JSON.
    Unpack(unpack::UnpackOpts),
    /// Show the active dialect catalog.
    Info(info::InfoOpts),
}

impl ToolRun for ToolCommand {
    fn run(&self, dialect: Arc<Dialect>) -> anyhow::Result<()> {
        use ToolCommand::*;
        match self {
            ParseDump(o) => o.run(dialect),
            Pack(o) => o.run(dialect),
            Unpack(o) => o.run(dialect),
            Info(o) => o.run(dialect),
        }
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::filter::LevelFilter;

    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let opts = ToolOptions::parse();
    init_logging(opts.verbose);

    let dialect = common::load_dialect(opts.dialect.as_deref())?;
    opts.command.run(dialect)
}
