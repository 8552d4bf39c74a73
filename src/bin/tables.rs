//! Offline generator for the 2+2 state-machine table.
//!
//! Enumerates every canonical card state, fills the transition array,
//! and writes the populated prefix to disk. Takes a few minutes and
//! about 600 MB of working memory; the output is around 130 MB.

use clap::Parser;
use equipoker::evaluation::generator::Generator;
use equipoker::evaluation::machine::HAND_RANKS_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "generate the 2+2 hand-rank transition table")]
struct Args {
    /// output path for the table
    #[arg(long, default_value = HAND_RANKS_FILE)]
    out: PathBuf,
}

fn main() {
    equipoker::log();
    let args = Args::parse();

    let mut generator = Generator::new();
    let states = generator.enumerate();
    log::info!("{} canonical states", states);
    generator.fill();
    if let Err(e) = generator.write(&args.out) {
        log::error!("write {}: {}", args.out.display(), e);
        std::process::exit(1);
    }
    log::info!("wrote {}", args.out.display());
}
