use env_logger::{Env, TimestampPrecision};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "healer-manager", about = "Run and supervise fuzzer instances.")]
struct Settings {
    /// Path to config file.
    #[structopt(long, short = "c")]
    config: PathBuf,
    /// Verbosity, 0 for info, 1 for debug, 2 and above for trace.
    #[structopt(short = "v", default_value = "0")]
    verbosity: u32,
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_args();

    let level = match settings.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_env = Env::new()
        .filter_or("HEALER_LOG", level)
        .default_write_style_or("auto");
    env_logger::Builder::from_env(log_env)
        .format_timestamp(Some(TimestampPrecision::Seconds))
        .init();

    healer_manager::boot(&settings.config)
}
