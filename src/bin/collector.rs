//! Telemetry collector
//!
//! Sibling reader process for one equity job. Polls the job's shared
//! segment through the seqlock reader, logs progress, exits once the
//! writer reports a terminal status, and unlinks the segment on the
//! way out so stale names cannot be re-opened.

use clap::Parser;
use equipoker::telemetry::layout::STATUS_COMPLETED;
use equipoker::telemetry::layout::STATUS_FAILED;
use equipoker::telemetry::reader::TelemetryReader;

#[derive(Parser)]
#[command(about = "stream telemetry from a running equity job")]
struct Args {
    /// job id whose segment to watch
    job_id: String,
    /// poll interval in milliseconds
    #[arg(long, default_value_t = 250)]
    interval: u64,
}

fn main() {
    equipoker::log();
    let args = Args::parse();

    let reader = match TelemetryReader::open(&args.job_id) {
        Ok(reader) => reader,
        Err(e) => {
            log::error!("cannot attach to job {}: {}", args.job_id, e);
            std::process::exit(1);
        }
    };

    let code = watch(&reader, args.interval);
    reader.unlink();
    std::process::exit(code);
}

fn watch(reader: &TelemetryReader, interval: u64) -> i32 {
    loop {
        let snapshot = match reader.header() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // retry budget exhausted: the writer is presumed dead
                log::error!("telemetry reader: {}", e);
                return 1;
            }
        };
        let entries = match reader.results() {
            Ok(rows) => rows.len(),
            Err(e) => {
                log::error!("telemetry reader: {}", e);
                return 1;
            }
        };
        log::info!(
            "hands_processed={} entries={} status={}",
            snapshot.hands_processed,
            entries,
            snapshot.status,
        );
        match snapshot.status {
            STATUS_COMPLETED => {
                log::info!("job completed");
                return 0;
            }
            STATUS_FAILED => {
                log::warn!("job failed");
                return 0;
            }
            _ => std::thread::sleep(std::time::Duration::from_millis(interval)),
        }
    }
}
