//! Command-line arguments.

use crate::config::ENV_CONFIG_FILE;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Host health check server")]
pub struct Args {
    /// Path to the config file
    #[arg(short, long, env = ENV_CONFIG_FILE, default_value = "config.yaml")]
    pub config: PathBuf,
}

impl Args {
    /// Parse arguments, accepting the single-dash `-config` spelling too
    pub fn parse_with_legacy<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(legacy_flags(args))
    }
}

/// Rewrite `-config` / `-config=<path>` to their `--config` forms.
pub fn legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some("-config") => OsString::from("--config"),
            Some(s) if s.starts_with("-config=") => OsString::from(format!("-{}", s)),
            _ => arg,
        })
        .collect()
}
