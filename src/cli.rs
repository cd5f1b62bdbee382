use std::ffi::OsString;

use clap::Parser;

use crate::config::Overrides;

// Flags that are also accepted with a single leading dash, e.g. `-err 30`
const SINGLE_DASH_FLAGS: [&str; 4] = ["err", "warn", "verify", "ca"];

#[derive(Parser, Debug)]
#[command(
    name = "check-certs",
    version,
    about = "Report TLS certificates that are expired or about to expire",
    override_usage = "check-certs ([--err DAYS] [--warn DAYS] | --verify [--ca GLOB]) <GLOBS>..."
)]
pub struct Cli {
    #[arg(
        long = "err",
        value_name = "DAYS",
        help = "Number of days before expiry to generate an ERROR message (0 disables)"
    )]
    pub error_days: Option<u32>,
    #[arg(
        long = "warn",
        value_name = "DAYS",
        help = "Number of days before expiry to generate a WARNING message (0 disables)"
    )]
    pub warn_days: Option<u32>,
    #[arg(long, help = "Verify the certificate chain against the trusted roots")]
    pub verify: bool,
    #[arg(
        long = "ca",
        value_name = "GLOB",
        help = "Trusted root certificates (may be repeated)"
    )]
    pub ca: Vec<String>,
    #[arg(
        value_name = "GLOBS",
        required = true,
        help = "Certificate bundles to check, `**` matches recursively"
    )]
    pub globs: Vec<String>,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Settings given on the command line, layered over file and environment
    pub fn overrides(&self) -> Overrides {
        Overrides {
            error_days: self.error_days,
            warn_days: self.warn_days,
            verify: self.verify.then_some(true),
            ca: (!self.ca.is_empty()).then(|| self.ca.clone()),
        }
    }
}

/// Rewrite `-err`, `-warn`, `-verify` and `-ca` (optionally with `=value`)
/// into their double-dash form. Arguments after `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            match arg.to_str() {
                Some("--") => {
                    passthrough = true;
                    arg
                }
                Some(s) if is_single_dash_flag(s) => OsString::from(format!("-{s}")),
                _ => arg,
            }
        })
        .collect()
}

fn is_single_dash_flag(arg: &str) -> bool {
    arg.strip_prefix('-')
        .filter(|rest| !rest.starts_with('-'))
        .map(|rest| rest.split_once('=').map_or(rest, |(name, _)| name))
        .is_some_and(|name| SINGLE_DASH_FLAGS.contains(&name))
}
