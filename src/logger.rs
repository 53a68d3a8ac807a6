//! Logger setup for the `cmdbind` binary.

use anyhow::{bail, Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Configure `env_logger` from the `-v` count.
///
/// No flag logs warnings only, `-v` adds debug output and `-vv` traces
/// every option scan. `RUST_LOG` is still honored for anything not set here.
pub fn config_logger(verbose_level: u8) -> Result<()> {
    let level = match verbose_level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        2 => LevelFilter::Trace,
        _ => bail!("maximum allowed verbosity level is '-vv'"),
    };

    Builder::from_default_env()
        .target(Target::Stderr)
        .format_module_path(false)
        .format_timestamp(None)
        .filter(None, level)
        .try_init()
        .context("unable to set up the logger")
}
