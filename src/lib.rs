pub mod api;
pub mod cards;
pub mod error;
pub mod evaluation;
pub mod simulation;
pub mod telemetry;

pub const PROGRESS_STYLE: &str = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan}";

/// progress bar for offline generation work
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_secs(1);
    let style = indicatif::ProgressStyle::with_template(PROGRESS_STYLE).unwrap();
    let progress = indicatif::ProgressBar::new(n as u64);
    progress.set_style(style);
    progress.enable_steady_tick(tick);
    progress
}

/// spinner for work of unknown length
pub fn spinner(message: &str) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_millis(200);
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(tick);
    spinner
}

/// initialize logging to terminal and a timestamped file under logs/
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
