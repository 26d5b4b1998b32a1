use std::ffi::OsString;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Command line flags.
#[derive(Debug, Clone, Parser)]
#[command(name = "garcon", version, about = "Serve static files over HTTP/1.x")]
pub struct Args {
    /// The root directory to serve files from (defaults to the current working directory)
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Which port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seconds allowed to receive a request, and for any single stalled write (0 disables)
    #[arg(short, long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

/// Validated server configuration. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical document root
    pub root: PathBuf,
    pub port: u16,
    /// Request deadline and write stall limit; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Config {
    /// Parses the process arguments. Invalid flags print usage and exit.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn try_parse_from<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_args(Args::try_parse_from(args)?)
    }

    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let directory = match args.directory {
            Some(dir) => dir,
            None => std::env::current_dir().context("Cannot determine the working directory")?,
        };

        let root = std::fs::canonicalize(&directory)
            .with_context(|| format!("Cannot find directory {}", directory.display()))?;
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));

        Ok(Self {
            root,
            port: args.port,
            timeout,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
