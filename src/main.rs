//! UCI engine binary: logs to stderr, speaks the protocol on stdin/stdout.

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use env_logger::{Env, Target, WriteStyle};

use plum_search::engines::engine_options::EngineOptions;
use plum_search::uci::uci_top::run_stdio_loop;

const DEFAULT_FILTER_ENV: &str = "PLUM_SEARCH_LOG";

#[derive(Parser, Debug)]
#[command(name = "plum_search", version, about = "UCI chess search engine")]
struct Args {
    /// Start with debug logging enabled (same as `debug on`)
    #[arg(short, long)]
    debug: bool,

    /// Log level when neither --debug nor PLUM_SEARCH_LOG is set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Plies of capture search below the nominal depth
    #[arg(long)]
    quiescence_depth: Option<u32>,

    /// Milliseconds subtracted from the clock for transmission lag
    #[arg(long)]
    move_overhead_ms: Option<u64>,
}

fn init_logging(args: &Args) {
    let level = if args.debug { "debug" } else { args.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().filter_or(DEFAULT_FILTER_ENV, level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .write_style(WriteStyle::Never)
        .target(Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut options = EngineOptions {
        debug_log: args.debug,
        ..EngineOptions::default()
    };
    if let Some(depth) = args.quiescence_depth {
        options.set("QuiescenceDepth", &depth.to_string())?;
    }
    if let Some(ms) = args.move_overhead_ms {
        options.set("MoveOverheadMs", &ms.to_string())?;
    }

    log::info!("plum_search {} starting", env!("CARGO_PKG_VERSION"));
    run_stdio_loop(options)?;
    log::info!("plum_search exiting");
    Ok(())
}
