pub mod cancellation;
pub mod concurrency;
pub mod config;
pub mod distributions;
pub mod error;
pub mod evaluator;
pub mod lec;
pub mod provenance;
pub mod sampler;
pub mod seed;
pub mod tree;
pub mod vector;

pub use cancellation::CancellationToken;
pub use error::{CoreError, CoreResult};

/// dimensional analysis types
pub type Loss = u64;
pub type Probability = f64;

/// progress bar for a long-running simulation run.
#[cfg(feature = "cli")]
pub fn progress(n: u64) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_millis(500);
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan} {pos}/{len} trials";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let progress = indicatif::ProgressBar::new(n);
    progress.set_style(style);
    progress.enable_steady_tick(tick);
    progress
}

/// initialize logging to stderr + a timestamped file under `logs/`.
#[cfg(feature = "cli")]
pub fn init() {
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
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
