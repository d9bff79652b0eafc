//! Log setup for the command-line binary

use env_logger::{Env, Target};
use log::LevelFilter;

/// Default filter for a given number of `-v` flags.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Route logs to stderr so stdout stays free for the summary.
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init(verbose: u8) {
    let default_filter = level_for_verbosity(verbose).to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Debug);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(0);
        init(2);
    }
}
